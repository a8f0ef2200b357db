//! Shared configuration for Roastery services.
//!
//! Both service binaries (catalog and images) load the same [`AppConfig`]
//! and pick the section they care about.

mod config;

pub use config::{AppConfig, CorsConfig, ImagesConfig, ServerConfig};
