//! Roastery Catalog Server
//!
//! Main entry point for the product catalog service.

use std::sync::Arc;

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roastery_api::{CatalogState, catalog_router};
use roastery_core::catalog::ProductStore;
use roastery_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "roastery=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().expect("Failed to load configuration");

    // Create application state with the seeded product list
    let state = CatalogState {
        products: Arc::new(ProductStore::new()),
    };

    // Create router
    let app = catalog_router(state, &config.cors);

    // Start server
    let addr = format!("{}:{}", config.catalog.host, config.catalog.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Catalog server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

/// Completes when the process receives an interrupt.
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
