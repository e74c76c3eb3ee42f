use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use barista_auth::{Permission, PermissionGate};

use crate::app::errors;

/// Per-route guard state: the shared gate plus the permission the route needs.
#[derive(Clone)]
pub struct PermissionGuard {
    gate: Arc<PermissionGate>,
    permission: Permission,
}

impl PermissionGuard {
    pub fn new(gate: Arc<PermissionGate>, permission: Permission) -> Self {
        Self { gate, permission }
    }
}

/// Verify the bearer token and require the route's permission.
///
/// On success the verified `Claims` are inserted into the request extensions
/// before the handler runs. On failure the handler never runs.
pub async fn require_permission(
    State(guard): State<PermissionGuard>,
    mut req: Request,
    next: Next,
) -> Response {
    // A header that is not visible ASCII is treated as an empty one.
    let raw_header = req
        .headers()
        .get(AUTHORIZATION)
        .map(|v| v.to_str().unwrap_or_default().to_string());

    let outcome = guard
        .gate
        .require(&guard.permission, raw_header.as_deref(), move |claims| async move {
            req.extensions_mut().insert(claims);
            next.run(req).await
        })
        .await;

    match outcome {
        Ok(response) => response,
        Err(err) => errors::auth_error_to_response(&err),
    }
}
