//! Bearer token verification against the issuer's signing key set.
//!
//! Per request: header extracted → token header decoded → key resolved →
//! signature verified → registered claims validated. Any step failing ends
//! the request with a classified `AuthError`; nothing is retried except the
//! single key set refetch done by [`KeySetCache::resolve`].

use std::sync::Arc;

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Validation};
use serde_json::{Map, Value};

use crate::jwks::{HttpKeySetSource, KeySetCache, KeySetSource};
use crate::{AuthConfig, AuthError, Claims};

pub struct TokenVerifier {
    keys: KeySetCache,
    algorithm: Algorithm,
    validation: Validation,
}

impl TokenVerifier {
    pub fn new(config: &AuthConfig, source: Arc<dyn KeySetSource>) -> Self {
        let mut validation = Validation::new(config.algorithm);
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_audience(&[config.audience.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "aud"]);
        validation.leeway = config.leeway_secs;

        Self {
            keys: KeySetCache::new(source, config.key_fetch_timeout),
            algorithm: config.algorithm,
            validation,
        }
    }

    /// Verifier fetching keys from `config.jwks_url`.
    pub fn from_config(config: &AuthConfig) -> Self {
        let source = HttpKeySetSource::new(config.jwks_url.clone());
        Self::new(config, Arc::new(source))
    }

    /// Verify the raw `Authorization` header value and decode its claims.
    pub async fn verify(&self, raw_header: Option<&str>) -> Result<Claims, AuthError> {
        let token = bearer_token(raw_header)?;

        let header = jsonwebtoken::decode_header(token)
            .map_err(|_| AuthError::invalid_header("unable to parse authentication token"))?;

        // Reject before any key lookup so a downgraded token never costs a fetch.
        if header.alg != self.algorithm {
            return Err(AuthError::invalid_header("unexpected signing algorithm"));
        }
        let kid = header
            .kid
            .as_deref()
            .ok_or_else(|| AuthError::invalid_header("authorization malformed: no key id"))?;

        let key = self.keys.resolve(kid).await?;

        let data = jsonwebtoken::decode::<Map<String, Value>>(token, &key, &self.validation)
            .map_err(classify)?;

        Ok(Claims::from_map(data.claims))
    }
}

/// Extract the token from `Bearer <token>`.
///
/// The scheme keyword is case-insensitive; anything other than exactly two
/// whitespace-separated parts is malformed.
pub fn bearer_token(raw_header: Option<&str>) -> Result<&str, AuthError> {
    let raw = raw_header.ok_or_else(AuthError::missing_header)?;
    let mut parts = raw.split_whitespace();

    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        (Some(scheme), _, _) if !scheme.eq_ignore_ascii_case("bearer") => Err(
            AuthError::invalid_header("authorization header must start with \"Bearer\""),
        ),
        (_, None, _) => Err(AuthError::invalid_header("token not found")),
        _ => Err(AuthError::invalid_header("authorization header must be bearer token")),
    }
}

fn classify(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        ErrorKind::ExpiredSignature => AuthError::invalid_token("token expired"),
        ErrorKind::ImmatureSignature => AuthError::invalid_token("token not yet valid"),
        ErrorKind::InvalidIssuer | ErrorKind::InvalidAudience => {
            AuthError::invalid_token("incorrect claims, please check the audience and issuer")
        }
        ErrorKind::MissingRequiredClaim(claim) => {
            AuthError::invalid_token(format!("missing required claim '{claim}'"))
        }
        ErrorKind::InvalidSignature => AuthError::invalid_header("signature verification failed"),
        ErrorKind::InvalidAlgorithm => AuthError::invalid_header("unexpected signing algorithm"),
        _ => AuthError::invalid_header("unable to parse authentication token"),
    }
}
