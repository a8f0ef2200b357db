//! Application configuration management.

use serde::Deserialize;
use std::path::PathBuf;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Catalog service configuration.
    #[serde(default)]
    pub catalog: ServerConfig,
    /// Image service configuration.
    #[serde(default)]
    pub images: ImagesConfig,
    /// CORS configuration.
    #[serde(default)]
    pub cors: CorsConfig,
}

/// Listen address configuration for a service.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_catalog_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_catalog_port(),
        }
    }
}

/// Image service configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ImagesConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_images_port")]
    pub port: u16,
    /// Root directory of the image store.
    #[serde(default = "default_store_root")]
    pub store_root: PathBuf,
    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_images_port(),
            store_root: default_store_root(),
            max_upload_bytes: default_max_upload_bytes(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    /// Origin allowed to call the services.
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: default_allowed_origin(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_catalog_port() -> u16 {
    7000
}

fn default_images_port() -> u16 {
    9090
}

fn default_store_root() -> PathBuf {
    PathBuf::from("./uploads")
}

fn default_max_upload_bytes() -> u64 {
    10 * 1024 * 1024 // 10MB
}

fn default_allowed_origin() -> String {
    "http://localhost:5173".to_string()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("ROASTERY").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
