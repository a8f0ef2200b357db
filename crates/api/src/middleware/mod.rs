//! Middleware for the API layer.

mod compression;

pub use compression::compression;
