//! `barista-auth`: bearer token verification and permission gating.
//!
//! This crate is intentionally decoupled from HTTP routing and storage: it
//! takes a raw `Authorization` header value and yields verified claims or a
//! classified error carrying the status code to render.

pub mod claims;
pub mod config;
pub mod error;
pub mod gate;
pub mod jwks;
pub mod permissions;
pub mod verifier;

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

pub use claims::{Claims, PERMISSIONS_CLAIM};
pub use config::{AuthConfig, ConfigError};
pub use error::{AuthError, AuthErrorKind};
pub use gate::{PermissionGate, authorize};
pub use jwks::{HttpKeySetSource, KeyFetchError, KeySetCache, KeySetSource};
pub use permissions::{
    DELETE_DRINKS, GET_DRINKS_DETAIL, PATCH_DRINKS, POST_DRINKS, Permission, PermissionSet,
};
pub use verifier::{TokenVerifier, bearer_token};
