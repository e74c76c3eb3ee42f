//! Consistent JSON error responses.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use barista_auth::AuthError;
use barista_infra::StoreError;

/// Resource-level failure: `{"success": false, "error": <status>, "message": <text>}`.
pub fn json_error(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(json!({
            "success": false,
            "error": status.as_u16(),
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn not_found() -> Response {
    json_error(StatusCode::NOT_FOUND, "resource not found")
}

pub fn unprocessable() -> Response {
    json_error(StatusCode::UNPROCESSABLE_ENTITY, "unprocessable")
}

pub fn conflict() -> Response {
    json_error(StatusCode::CONFLICT, "conflict")
}

/// Authorization failure: the kind code goes in `message`, the detail in
/// `description`.
pub fn auth_error_to_response(err: &AuthError) -> Response {
    let status =
        StatusCode::from_u16(err.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (
        status,
        Json(json!({
            "success": false,
            "error": status.as_u16(),
            "message": err.kind().code(),
            "description": err.description(),
        })),
    )
        .into_response()
}

pub fn store_error_to_response(err: StoreError) -> Response {
    match err {
        StoreError::NotFound => not_found(),
        StoreError::Duplicate(_) => conflict(),
        StoreError::Invalid(msg) => {
            tracing::debug!(reason = %msg, "rejected drink");
            unprocessable()
        }
        StoreError::Backend(_) => unprocessable(),
    }
}
