use std::future::Future;
use std::sync::Arc;

use crate::{AuthError, Claims, Permission, TokenVerifier};

/// Check verified claims against a required permission.
///
/// - No IO
/// - Exact, case-sensitive match (no wildcard, no hierarchy)
/// - A missing `permissions` claim is `invalid_claims`, an empty one is `forbidden`
pub fn authorize(claims: &Claims, required: &Permission) -> Result<(), AuthError> {
    let granted = claims.permissions()?;
    if granted.contains(required) {
        Ok(())
    } else {
        Err(AuthError::forbidden(required.as_str()))
    }
}

/// Verifies the caller and enforces a permission before an operation runs.
#[derive(Clone)]
pub struct PermissionGate {
    verifier: Arc<TokenVerifier>,
}

impl PermissionGate {
    pub fn new(verifier: Arc<TokenVerifier>) -> Self {
        Self { verifier }
    }

    /// Verify `raw_header` and require `required`, returning the claims.
    pub async fn check(
        &self,
        required: &Permission,
        raw_header: Option<&str>,
    ) -> Result<Claims, AuthError> {
        let claims = self.verifier.verify(raw_header).await.inspect_err(|e| {
            tracing::debug!(kind = %e.kind(), permission = %required, "request denied");
        })?;

        authorize(&claims, required).inspect_err(|e| {
            tracing::debug!(
                kind = %e.kind(),
                permission = %required,
                subject = claims.subject().unwrap_or("-"),
                expires_at = ?claims.expires_at(),
                "request denied"
            );
        })?;
        Ok(claims)
    }

    /// Run `operation` with the verified claims if the caller holds `required`.
    ///
    /// On any failure the operation is never invoked and the error is
    /// returned unchanged.
    pub async fn require<F, Fut, R>(
        &self,
        required: &Permission,
        raw_header: Option<&str>,
        operation: F,
    ) -> Result<R, AuthError>
    where
        F: FnOnce(Claims) -> Fut,
        Fut: Future<Output = R>,
    {
        let claims = self.check(required, raw_header).await?;
        Ok(operation(claims).await)
    }
}
