use std::sync::Arc;

use axum::Router;

use barista_auth::PermissionGate;

pub mod drinks;
pub mod system;

/// Router for the drink catalog (public and permission-guarded endpoints).
pub fn router(gate: Arc<PermissionGate>) -> Router {
    drinks::router(gate)
}
