//! Signing key set retrieval and caching.
//!
//! The cache holds one complete `JwkSet` behind an `Arc`. Readers clone the
//! `Arc`; a refresh fetches a full set and swaps it in, so no reader ever sees
//! a partially updated set. Refreshes are serialized: requests that miss while
//! a fetch is in flight wait for it and reuse its result.

use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::jwk::JwkSet;
use reqwest::Url;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::AuthError;

#[derive(Debug, Error)]
pub enum KeyFetchError {
    #[error("key set request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("key set source unavailable: {0}")]
    Unavailable(String),
}

/// Where signing keys come from.
#[async_trait]
pub trait KeySetSource: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet, KeyFetchError>;
}

/// Fetches the issuer's published JWKS document over HTTP.
#[derive(Debug, Clone)]
pub struct HttpKeySetSource {
    client: reqwest::Client,
    url: Url,
}

impl HttpKeySetSource {
    pub fn new(url: Url) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }
}

#[async_trait]
impl KeySetSource for HttpKeySetSource {
    async fn fetch(&self) -> Result<JwkSet, KeyFetchError> {
        let set = self
            .client
            .get(self.url.clone())
            .send()
            .await?
            .error_for_status()?
            .json::<JwkSet>()
            .await?;
        Ok(set)
    }
}

/// Shared cache of the current key set.
pub struct KeySetCache {
    source: Arc<dyn KeySetSource>,
    current: RwLock<Option<Arc<JwkSet>>>,
    /// Held for the duration of a fetch.
    refreshing: Mutex<()>,
    fetch_timeout: Duration,
}

impl KeySetCache {
    pub fn new(source: Arc<dyn KeySetSource>, fetch_timeout: Duration) -> Self {
        Self {
            source,
            current: RwLock::new(None),
            refreshing: Mutex::new(()),
            fetch_timeout,
        }
    }

    /// Resolve the decoding key for `kid`.
    ///
    /// A cold cache or an unknown `kid` triggers at most one fetch. If another
    /// request swapped in a newer set while this one waited, that set is used
    /// instead. A `kid` still missing afterwards is rejected as `invalid_header`.
    pub async fn resolve(&self, kid: &str) -> Result<DecodingKey, AuthError> {
        let seen = self.snapshot();
        if let Some(set) = &seen {
            if let Some(jwk) = set.find(kid) {
                return decoding_key(jwk);
            }
            tracing::debug!(kid, "signing key not cached; refreshing key set");
        }

        let set = {
            let _refreshing = self.refreshing.lock().await;
            match self.snapshot() {
                Some(current) if !is_same_set(seen.as_ref(), &current) => current,
                _ => self.fetch_and_swap().await?,
            }
        };
        match set.find(kid) {
            Some(jwk) => decoding_key(jwk),
            None => Err(AuthError::invalid_header("unable to find the appropriate key")),
        }
    }

    /// Fetch the key set and swap it in.
    pub async fn refresh(&self) -> Result<Arc<JwkSet>, AuthError> {
        let _refreshing = self.refreshing.lock().await;
        self.fetch_and_swap().await
    }

    async fn fetch_and_swap(&self) -> Result<Arc<JwkSet>, AuthError> {
        let fetched = match tokio::time::timeout(self.fetch_timeout, self.source.fetch()).await {
            Ok(Ok(set)) => set,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "signing key set fetch failed");
                return Err(AuthError::key_fetch_failed(e.to_string()));
            }
            Err(_) => {
                tracing::warn!(timeout_ms = self.fetch_timeout.as_millis() as u64, "signing key set fetch timed out");
                return Err(AuthError::key_fetch_failed("signing key set fetch timed out"));
            }
        };

        let set = Arc::new(fetched);
        match self.current.write() {
            Ok(mut slot) => *slot = Some(Arc::clone(&set)),
            Err(poisoned) => *poisoned.into_inner() = Some(Arc::clone(&set)),
        }
        tracing::info!(keys = set.keys.len(), "signing key set refreshed");
        Ok(set)
    }

    /// Currently cached set, if any.
    pub fn snapshot(&self) -> Option<Arc<JwkSet>> {
        match self.current.read() {
            Ok(slot) => slot.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

fn is_same_set(seen: Option<&Arc<JwkSet>>, current: &Arc<JwkSet>) -> bool {
    seen.is_some_and(|s| Arc::ptr_eq(s, current))
}

fn decoding_key(jwk: &jsonwebtoken::jwk::Jwk) -> Result<DecodingKey, AuthError> {
    DecodingKey::from_jwk(jwk).map_err(|_| AuthError::invalid_header("unusable signing key"))
}
