//! Token minting and key sources for tests.
//!
//! Compiled for this crate's tests and for dependents enabling `test-util`.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::jwk::{Jwk, JwkSet};
use jsonwebtoken::{Algorithm, EncodingKey, Header};
use reqwest::Url;
use serde_json::{Value, json};

use crate::AuthConfig;
use crate::jwks::{KeyFetchError, KeySetSource};

pub const TEST_ISSUER: &str = "https://barista.test/";
pub const TEST_AUDIENCE: &str = "drinks";

/// RSA key pair with a fixed key id.
pub struct TestKey {
    pub kid: &'static str,
    private_pem: &'static str,
    modulus: &'static str,
}

pub const PRIMARY: TestKey = TestKey {
    kid: "primary-2026",
    private_pem: include_str!("../testdata/primary.pem"),
    modulus: include_str!("../testdata/primary.n"),
};

pub const ROTATED: TestKey = TestKey {
    kid: "rotated-2026",
    private_pem: include_str!("../testdata/rotated.pem"),
    modulus: include_str!("../testdata/rotated.n"),
};

impl TestKey {
    /// Public half as published in a JWKS document.
    pub fn jwk(&self) -> Jwk {
        serde_json::from_value(json!({
            "kty": "RSA",
            "use": "sig",
            "alg": "RS256",
            "kid": self.kid,
            "n": self.modulus.trim(),
            "e": "AQAB",
        }))
        .expect("test jwk is well-formed")
    }

    /// RS256 token carrying this key's id.
    pub fn sign(&self, claims: &Value) -> String {
        let mut header = Header::new(Algorithm::RS256);
        header.kid = Some(self.kid.to_string());
        self.sign_with_header(&header, claims)
    }

    pub fn sign_with_header(&self, header: &Header, claims: &Value) -> String {
        let key = EncodingKey::from_rsa_pem(self.private_pem.as_bytes()).expect("test key is valid PEM");
        jsonwebtoken::encode(header, claims, &key).expect("token encodes")
    }
}

pub fn key_set(keys: &[&TestKey]) -> JwkSet {
    JwkSet {
        keys: keys.iter().map(|k| k.jwk()).collect(),
    }
}

/// Unexpired claims for the test issuer/audience with the given permissions.
pub fn claims_with(permissions: &[&str]) -> Value {
    let now = Utc::now().timestamp();
    json!({
        "iss": TEST_ISSUER,
        "aud": TEST_AUDIENCE,
        "sub": "auth0|barista-test",
        "iat": now,
        "exp": now + 600,
        "permissions": permissions,
    })
}

/// Verifier settings pointing at `jwks_url`.
pub fn test_config(jwks_url: &str) -> AuthConfig {
    let url = Url::parse(jwks_url).expect("test jwks url parses");
    AuthConfig::new(url, TEST_ISSUER, TEST_AUDIENCE, Algorithm::RS256)
        .expect("RS256 is asymmetric")
        .with_key_fetch_timeout(Duration::from_secs(2))
}

/// Serves a scripted sequence of key sets and counts fetches.
///
/// The n-th fetch returns the n-th set; once exhausted the last set is
/// repeated. An empty script fails every fetch.
pub struct ScriptedKeySource {
    sets: Mutex<Vec<JwkSet>>,
    fetches: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedKeySource {
    pub fn new(sets: Vec<JwkSet>) -> Self {
        Self {
            sets: Mutex::new(sets),
            fetches: AtomicUsize::new(0),
            delay: None,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn fetches(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl KeySetSource for ScriptedKeySource {
    async fn fetch(&self) -> Result<JwkSet, KeyFetchError> {
        let n = self.fetches.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let sets = self.sets.lock().expect("script lock");
        match sets.len() {
            0 => Err(KeyFetchError::Unavailable("no key set scripted".to_string())),
            len => Ok(sets[n.min(len - 1)].clone()),
        }
    }
}
