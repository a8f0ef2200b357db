//! Roastery Image Server
//!
//! Main entry point for the product image upload/serving service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use roastery_api::{ImageState, images_router};
use roastery_core::storage::{ImageStore, StorageConfig, StorageProvider};
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

    // The store itself refuses a missing root, so create it up front.
    std::fs::create_dir_all(&config.images.store_root).with_context(|| {
        format!(
            "unable to create store root {}",
            config.images.store_root.display()
        )
    })?;

    // Create the image store
    let storage_config = StorageConfig::new(StorageProvider::local_fs(&config.images.store_root))
        .with_max_file_size(config.images.max_upload_bytes);
    let store = ImageStore::from_config(storage_config)?;
    info!(
        provider = store.provider_name(),
        root = %config.images.store_root.display(),
        "Image store ready"
    );

    // Create application state
    let state = ImageState {
        store: Arc::new(store),
    };

    // Create router
    let app = images_router(state, &config.cors, config.images.max_upload_bytes);

    // Start server
    let addr = format!("{}:{}", config.images.host, config.images.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Image server listening on {}", addr);

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
