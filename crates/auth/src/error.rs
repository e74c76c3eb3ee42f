//! Classified authorization failures.

use thiserror::Error;

/// Failure classes of token verification and permission checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthErrorKind {
    /// No `Authorization` header on a protected route.
    MissingHeader,
    /// Header or token structurally unusable, unknown key, bad signature.
    InvalidHeader,
    /// Token verified but expired or issued for someone else.
    InvalidToken,
    /// Verified token without a usable `permissions` claim.
    InvalidClaims,
    /// Verified token lacking the required permission.
    Forbidden,
    /// Signing key set could not be fetched.
    KeyFetchFailed,
}

impl AuthErrorKind {
    /// Machine-readable code rendered in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AuthErrorKind::MissingHeader => "missing_header",
            AuthErrorKind::InvalidHeader => "invalid_header",
            AuthErrorKind::InvalidToken => "invalid_token",
            AuthErrorKind::InvalidClaims => "invalid_claims",
            AuthErrorKind::Forbidden => "forbidden",
            AuthErrorKind::KeyFetchFailed => "key_fetch_failed",
        }
    }

    /// HTTP status code for this kind.
    pub fn status(&self) -> u16 {
        match self {
            AuthErrorKind::MissingHeader
            | AuthErrorKind::InvalidHeader
            | AuthErrorKind::InvalidToken => 401,
            AuthErrorKind::InvalidClaims => 400,
            AuthErrorKind::Forbidden => 403,
            AuthErrorKind::KeyFetchFailed => 500,
        }
    }

    /// Whether the caller may retry the same request later.
    pub fn is_transient(&self) -> bool {
        matches!(self, AuthErrorKind::KeyFetchFailed)
    }
}

impl core::fmt::Display for AuthErrorKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind}: {description}")]
pub struct AuthError {
    kind: AuthErrorKind,
    description: String,
}

impl AuthError {
    pub fn new(kind: AuthErrorKind, description: impl Into<String>) -> Self {
        Self {
            kind,
            description: description.into(),
        }
    }

    pub fn missing_header() -> Self {
        Self::new(AuthErrorKind::MissingHeader, "authorization header is expected")
    }

    pub fn invalid_header(description: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::InvalidHeader, description)
    }

    pub fn invalid_token(description: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::InvalidToken, description)
    }

    pub fn invalid_claims(description: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::InvalidClaims, description)
    }

    pub fn forbidden(permission: &str) -> Self {
        Self::new(
            AuthErrorKind::Forbidden,
            format!("missing permission '{permission}'"),
        )
    }

    pub fn key_fetch_failed(description: impl Into<String>) -> Self {
        Self::new(AuthErrorKind::KeyFetchFailed, description)
    }

    pub fn kind(&self) -> AuthErrorKind {
        self.kind
    }

    pub fn status(&self) -> u16 {
        self.kind.status()
    }

    pub fn description(&self) -> &str {
        &self.description
    }
}
