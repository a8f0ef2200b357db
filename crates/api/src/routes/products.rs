//! Product catalog routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;
use tracing::info;
use validator::{Validate, ValidationErrors};

use crate::CatalogState;
use roastery_core::catalog::{CatalogError, Product};

/// Creates the product routes.
pub fn routes() -> Router<CatalogState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
}

// ============================================================================
// Helper Functions
// ============================================================================

/// 404 response for a missing product.
fn not_found_response(err: &CatalogError) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({
            "error": "not_found",
            "message": err.to_string()
        })),
    )
        .into_response()
}

/// 400 response listing every failed validation rule.
fn validation_error_response(errors: &ValidationErrors) -> Response {
    let messages: Vec<String> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| match &e.message {
                Some(message) => format!("{field}: {message}"),
                None => format!("{field}: invalid value"),
            })
        })
        .collect();

    (
        StatusCode::BAD_REQUEST,
        Json(json!({
            "error": "validation_error",
            "messages": messages
        })),
    )
        .into_response()
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/products` - List all products.
async fn list_products(State(state): State<CatalogState>) -> Response {
    let products = state.products.list().await;
    (StatusCode::OK, Json(json!({ "products": products }))).into_response()
}

/// GET `/products/{id}` - Get a single product.
async fn get_product(State(state): State<CatalogState>, Path(id): Path<u64>) -> Response {
    match state.products.get(id).await {
        Ok(product) => (StatusCode::OK, Json(product)).into_response(),
        Err(e) => not_found_response(&e),
    }
}

/// POST `/products` - Add a product to the catalog.
async fn create_product(
    State(state): State<CatalogState>,
    Json(payload): Json<Product>,
) -> Response {
    if let Err(errors) = payload.validate() {
        return validation_error_response(&errors);
    }

    let product = state.products.create(payload).await;
    info!(id = product.id, name = %product.name, "Product created");
    (StatusCode::CREATED, Json(product)).into_response()
}

/// PUT `/products/{id}` - Replace a product.
async fn update_product(
    State(state): State<CatalogState>,
    Path(id): Path<u64>,
    Json(payload): Json<Product>,
) -> Response {
    if let Err(errors) = payload.validate() {
        return validation_error_response(&errors);
    }

    match state.products.update(id, payload).await {
        Ok(product) => {
            info!(id, name = %product.name, "Product updated");
            (StatusCode::OK, Json(product)).into_response()
        }
        Err(e) => not_found_response(&e),
    }
}

/// DELETE `/products/{id}` - Remove a product.
async fn delete_product(State(state): State<CatalogState>, Path(id): Path<u64>) -> Response {
    match state.products.delete(id).await {
        Ok(()) => {
            info!(id, "Product deleted");
            (StatusCode::NO_CONTENT, ()).into_response()
        }
        Err(e) => not_found_response(&e),
    }
}
