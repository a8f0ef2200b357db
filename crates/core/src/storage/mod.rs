//! Image storage built on Apache OpenDAL.
//!
//! Files are addressed by an [`ImageKey`] - a validated `(product id,
//! filename)` pair - and live under `root/{id}/{filename}`. Uploads and
//! downloads are streamed through bounded buffers; the store never holds a
//! whole file in memory.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Apache OpenDAL                              │
//! │                   (Unified Storage API)                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │ op.writer("key")           │ op.stat("key")                     │
//! │ op.reader("key")           │ op.delete("key")                   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod key;
mod service;

#[cfg(test)]
mod props;

pub use config::{StorageConfig, StorageProvider};
pub use error::StorageError;
pub use key::ImageKey;
pub use service::{ImageDownload, ImageStore};
