//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filename does not match the accepted pattern.
    #[error("invalid filename: '{0}'")]
    InvalidFilename(String),

    /// No image stored under the key.
    #[error("image not found: {0}")]
    NotFound(String),

    /// Upload exceeds the configured size limit.
    #[error("file size {size} bytes exceeds maximum allowed {max} bytes")]
    FileTooLarge {
        /// Bytes received so far.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// Write to the backing store failed; partial output has been discarded.
    #[error("storage write failed: {0}")]
    Write(String),

    /// Store root missing, not a directory, or not writable.
    #[error("storage root unusable: {0}")]
    Init(String),

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    /// Create an invalid filename error.
    #[must_use]
    pub fn invalid_filename(filename: impl Into<String>) -> Self {
        Self::InvalidFilename(filename.into())
    }

    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound(key.into())
    }

    /// Create a file too large error.
    #[must_use]
    pub fn file_too_large(size: u64, max: u64) -> Self {
        Self::FileTooLarge { size, max }
    }

    /// Create a write error.
    #[must_use]
    pub fn write(msg: impl Into<String>) -> Self {
        Self::Write(msg.into())
    }

    /// Create an init error.
    #[must_use]
    pub fn init(msg: impl Into<String>) -> Self {
        Self::Init(msg.into())
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::NotFound(err.to_string()),
            _ => Self::Write(err.to_string()),
        }
    }
}
