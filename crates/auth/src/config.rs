//! Verifier configuration, read once at startup.

use std::str::FromStr;
use std::time::Duration;

use jsonwebtoken::Algorithm;
use reqwest::Url;
use thiserror::Error;

pub const AUTH_DOMAIN: &str = "AUTH_DOMAIN";
pub const AUTH_JWKS_URL: &str = "AUTH_JWKS_URL";
pub const AUTH_ISSUER: &str = "AUTH_ISSUER";
pub const AUTH_AUDIENCE: &str = "AUTH_AUDIENCE";
pub const AUTH_ALGORITHM: &str = "AUTH_ALGORITHM";
pub const AUTH_KEY_FETCH_TIMEOUT_MS: &str = "AUTH_KEY_FETCH_TIMEOUT_MS";
pub const AUTH_LEEWAY_SECS: &str = "AUTH_LEEWAY_SECS";

const DEFAULT_KEY_FETCH_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_LEEWAY_SECS: u64 = 60;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(&'static str),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(var: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            reason: reason.into(),
        }
    }
}

/// Everything the token verifier needs to know about the issuer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthConfig {
    pub jwks_url: Url,
    pub issuer: String,
    pub audience: String,
    /// Only asymmetric algorithms are accepted.
    pub algorithm: Algorithm,
    pub key_fetch_timeout: Duration,
    pub leeway_secs: u64,
}

impl AuthConfig {
    pub fn new(
        jwks_url: Url,
        issuer: impl Into<String>,
        audience: impl Into<String>,
        algorithm: Algorithm,
    ) -> Result<Self, ConfigError> {
        ensure_asymmetric(algorithm)?;
        Ok(Self {
            jwks_url,
            issuer: issuer.into(),
            audience: audience.into(),
            algorithm,
            key_fetch_timeout: DEFAULT_KEY_FETCH_TIMEOUT,
            leeway_secs: DEFAULT_LEEWAY_SECS,
        })
    }

    pub fn with_key_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.key_fetch_timeout = timeout;
        self
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from an arbitrary variable lookup.
    ///
    /// `AUTH_DOMAIN` derives the JWKS URL and issuer of a hosted identity
    /// provider; explicit `AUTH_JWKS_URL` / `AUTH_ISSUER` take precedence.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &'static str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let domain = get(AUTH_DOMAIN);

        let jwks_url = get(AUTH_JWKS_URL)
            .or_else(|| domain.as_ref().map(|d| format!("https://{d}/.well-known/jwks.json")))
            .ok_or(ConfigError::Missing(AUTH_JWKS_URL))?;
        let jwks_url =
            Url::parse(&jwks_url).map_err(|e| ConfigError::invalid(AUTH_JWKS_URL, e.to_string()))?;

        let issuer = get(AUTH_ISSUER)
            .or_else(|| domain.as_ref().map(|d| format!("https://{d}/")))
            .ok_or(ConfigError::Missing(AUTH_ISSUER))?;
        let audience = get(AUTH_AUDIENCE).ok_or(ConfigError::Missing(AUTH_AUDIENCE))?;

        let algorithm = get(AUTH_ALGORITHM).ok_or(ConfigError::Missing(AUTH_ALGORITHM))?;
        let algorithm = Algorithm::from_str(&algorithm)
            .map_err(|_| ConfigError::invalid(AUTH_ALGORITHM, format!("unknown algorithm '{algorithm}'")))?;

        let mut config = Self::new(jwks_url, issuer, audience, algorithm)?;

        if let Some(ms) = get(AUTH_KEY_FETCH_TIMEOUT_MS) {
            let ms: u64 = ms
                .parse()
                .map_err(|_| ConfigError::invalid(AUTH_KEY_FETCH_TIMEOUT_MS, "expected milliseconds"))?;
            if ms == 0 {
                return Err(ConfigError::invalid(AUTH_KEY_FETCH_TIMEOUT_MS, "must be positive"));
            }
            config.key_fetch_timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = get(AUTH_LEEWAY_SECS) {
            config.leeway_secs = secs
                .parse()
                .map_err(|_| ConfigError::invalid(AUTH_LEEWAY_SECS, "expected seconds"))?;
        }

        Ok(config)
    }
}

fn ensure_asymmetric(algorithm: Algorithm) -> Result<(), ConfigError> {
    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Err(ConfigError::invalid(
            AUTH_ALGORITHM,
            "symmetric algorithms cannot be verified against a public key set",
        )),
        _ => Ok(()),
    }
}
