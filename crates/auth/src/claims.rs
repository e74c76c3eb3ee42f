use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::permissions::{Permission, PermissionSet};
use crate::AuthError;

/// Claim carrying the granted permission strings.
pub const PERMISSIONS_CLAIM: &str = "permissions";

/// Decoded payload of a verified token.
///
/// Only the verifier constructs this from a raw token, so holding a `Claims`
/// means signature, issuer, audience and expiry have been checked. Lives for
/// a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn from_map(map: Map<String, Value>) -> Self {
        Self(map)
    }

    pub fn get(&self, claim: &str) -> Option<&Value> {
        self.0.get(claim)
    }

    /// Subject (`sub`) of the token.
    pub fn subject(&self) -> Option<&str> {
        self.0.get("sub").and_then(Value::as_str)
    }

    /// Expiry (`exp`) as a timestamp.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.0
            .get("exp")
            .and_then(Value::as_i64)
            .and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// The `permissions` claim.
    ///
    /// Fails with `invalid_claims` when the claim is absent or is not an array
    /// of strings. A present but empty array is a valid, empty set.
    pub fn permissions(&self) -> Result<PermissionSet, AuthError> {
        let value = self
            .0
            .get(PERMISSIONS_CLAIM)
            .ok_or_else(|| AuthError::invalid_claims("permissions not included in token"))?;

        let items = value
            .as_array()
            .ok_or_else(|| AuthError::invalid_claims("permissions claim must be an array"))?;

        items
            .iter()
            .map(|item| {
                item.as_str()
                    .map(|p| Permission::new(p.to_string()))
                    .ok_or_else(|| AuthError::invalid_claims("permissions must be strings"))
            })
            .collect()
    }

    /// Permissions granted by the token, empty when the claim is missing or unusable.
    pub fn granted_permissions(&self) -> PermissionSet {
        self.permissions().unwrap_or_default()
    }
}
