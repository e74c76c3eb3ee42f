//! Process configuration, read once in `main` and passed down.

use std::net::SocketAddr;

use barista_auth::{AuthConfig, ConfigError};
use thiserror::Error;

pub const BIND_ADDR: &str = "BIND_ADDR";
pub const DATABASE_URL: &str = "DATABASE_URL";
pub const CATALOG_RESET: &str = "CATALOG_RESET";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error(transparent)]
    Auth(#[from] ConfigError),

    #[error("invalid value for {var}: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// Postgres when set, in-memory store otherwise.
    pub database_url: Option<String>,
    pub reset_catalog: bool,
    pub auth: AuthConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| {
            lookup(var)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let bind_addr = get(BIND_ADDR)
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .map_err(|e: std::net::AddrParseError| AppConfigError::Invalid {
                var: BIND_ADDR,
                reason: e.to_string(),
            })?;

        let reset_catalog = match get(CATALOG_RESET).as_deref() {
            None => false,
            Some(v) => parse_flag(v).ok_or_else(|| AppConfigError::Invalid {
                var: CATALOG_RESET,
                reason: format!("expected a boolean, got '{v}'"),
            })?,
        };

        Ok(Self {
            bind_addr,
            database_url: get(DATABASE_URL),
            reset_catalog,
            auth: AuthConfig::from_lookup(&lookup)?,
        })
    }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
