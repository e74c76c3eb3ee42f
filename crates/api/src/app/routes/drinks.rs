use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    middleware::from_fn_with_state,
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post},
};

use barista_auth::{
    Claims, DELETE_DRINKS, GET_DRINKS_DETAIL, PATCH_DRINKS, POST_DRINKS, Permission,
    PermissionGate,
};
use barista_core::DrinkId;
use barista_infra::DrinkStore;

use crate::app::{dto, errors};
use crate::middleware::{PermissionGuard, require_permission};

pub fn router(gate: Arc<PermissionGate>) -> Router {
    let guard = |permission: Permission| PermissionGuard::new(gate.clone(), permission);

    Router::new()
        .route("/drinks", get(list_drinks))
        .route(
            "/drinks",
            post(create_drink)
                .route_layer(from_fn_with_state(guard(POST_DRINKS), require_permission)),
        )
        .route(
            "/drinks-detail",
            get(list_drinks_detail)
                .route_layer(from_fn_with_state(guard(GET_DRINKS_DETAIL), require_permission)),
        )
        .route(
            "/drinks/:id",
            patch(update_drink)
                .route_layer(from_fn_with_state(guard(PATCH_DRINKS), require_permission)),
        )
        .route(
            "/drinks/:id",
            delete(delete_drink)
                .route_layer(from_fn_with_state(guard(DELETE_DRINKS), require_permission)),
        )
}

/// Public menu: short view, no ingredient names.
pub async fn list_drinks(Extension(store): Extension<Arc<dyn DrinkStore>>) -> Response {
    match store.list().await {
        Ok(drinks) if drinks.is_empty() => errors::not_found(),
        Ok(drinks) => Json(dto::DrinksResponse::short(&drinks)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn list_drinks_detail(Extension(store): Extension<Arc<dyn DrinkStore>>) -> Response {
    match store.list().await {
        Ok(drinks) if drinks.is_empty() => errors::not_found(),
        Ok(drinks) => Json(dto::DrinksResponse::long(drinks)).into_response(),
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn create_drink(
    Extension(store): Extension<Arc<dyn DrinkStore>>,
    Extension(claims): Extension<Claims>,
    body: Result<Json<dto::CreateDrinkRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(body)) = body else {
        return errors::unprocessable();
    };
    let Some(draft) = body.into_draft() else {
        return errors::unprocessable();
    };

    match store.insert(draft).await {
        Ok(drink) => {
            tracing::info!(id = %drink.id, subject = claims.subject().unwrap_or("-"), "drink created");
            Json(dto::DrinksResponse::long(vec![drink])).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn update_drink(
    Extension(store): Extension<Arc<dyn DrinkStore>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
    body: Result<Json<dto::UpdateDrinkRequest>, JsonRejection>,
) -> Response {
    let Ok(id) = id.parse::<DrinkId>() else {
        return errors::not_found();
    };
    let Ok(Json(body)) = body else {
        return errors::unprocessable();
    };

    match store.update(id, body.into()).await {
        Ok(drink) => {
            tracing::info!(%id, subject = claims.subject().unwrap_or("-"), "drink updated");
            Json(dto::DrinksResponse::long(vec![drink])).into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}

pub async fn delete_drink(
    Extension(store): Extension<Arc<dyn DrinkStore>>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<String>,
) -> Response {
    let Ok(id) = id.parse::<DrinkId>() else {
        return errors::not_found();
    };

    match store.delete(id).await {
        Ok(()) => {
            tracing::info!(%id, subject = claims.subject().unwrap_or("-"), "drink deleted");
            Json(dto::DeleteResponse {
                success: true,
                delete: id,
            })
            .into_response()
        }
        Err(e) => errors::store_error_to_response(e),
    }
}
