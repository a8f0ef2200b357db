//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes for the catalog and image services
//! - Response compression for the image serving path
//! - CORS, tracing, and timeout layers

pub mod middleware;
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use roastery_core::catalog::ProductStore;
use roastery_core::storage::ImageStore;
use roastery_shared::CorsConfig;

/// Per-request deadline for catalog requests.
const CATALOG_TIMEOUT: Duration = Duration::from_secs(10);
/// Per-request deadline for image requests. Uploads need headroom.
const IMAGES_TIMEOUT: Duration = Duration::from_secs(30);

/// Catalog service state shared across handlers.
#[derive(Clone)]
pub struct CatalogState {
    /// In-memory product store.
    pub products: Arc<ProductStore>,
}

/// Image service state shared across handlers.
#[derive(Clone)]
pub struct ImageState {
    /// Image store for uploads and serving.
    pub store: Arc<ImageStore>,
}

/// Creates the catalog service router.
pub fn catalog_router(state: CatalogState, cors: &CorsConfig) -> Router {
    Router::new()
        .merge(routes::health::routes())
        .merge(routes::products::routes())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(CATALOG_TIMEOUT))
        .layer(cors_layer(cors))
        .with_state(state)
}

/// Creates the image service router.
///
/// `max_upload_bytes` caps one stored file; the request body limit leaves
/// room for multipart requests carrying several files.
pub fn images_router(state: ImageState, cors: &CorsConfig, max_upload_bytes: u64) -> Router {
    let request_limit =
        usize::try_from(max_upload_bytes.saturating_mul(8)).unwrap_or(usize::MAX);

    Router::new()
        .merge(routes::health::routes())
        .merge(routes::images::routes())
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(IMAGES_TIMEOUT))
        .layer(cors_layer(cors))
        .layer(DefaultBodyLimit::max(request_limit))
        .with_state(state)
}

/// CORS layer restricted to the configured origin.
fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match config.allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => layer.allow_origin(Any),
    }
}
