//! Image store implementation using Apache OpenDAL.

use std::path::Path;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use opendal::{ErrorKind, FuturesBytesStream, Operator, services};

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;
use super::key::ImageKey;

/// An opened image ready for streaming to a client.
pub struct ImageDownload {
    /// Stored size in bytes.
    pub size: u64,
    /// Byte stream positioned at the start of the content.
    pub stream: FuturesBytesStream,
}

impl std::fmt::Debug for ImageDownload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageDownload")
            .field("size", &self.size)
            .field("stream", &"<FuturesBytesStream>")
            .finish()
    }
}

/// Image store over a configured storage provider.
///
/// Concurrent saves to the same key race at the backing store; last writer
/// wins. No locking layer is introduced here.
#[derive(Debug)]
pub struct ImageStore {
    operator: Operator,
    config: StorageConfig,
}

impl ImageStore {
    /// Create a new image store from configuration.
    ///
    /// For the local provider the root must already exist, be a directory,
    /// and be writable.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Init`] if the local root is unusable, or
    /// [`StorageError::Configuration`] if the provider cannot be built.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        let operator = Self::create_operator(&config.provider)?;
        Ok(Self { operator, config })
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(provider: &StorageProvider) -> Result<Operator, StorageError> {
        match provider {
            StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
            StorageProvider::LocalFs { root } => {
                validate_local_root(root)?;

                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid root path"))?,
                );

                Ok(Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish())
            }
        }
    }

    /// Stream `content` into the location identified by `key`.
    ///
    /// Intermediate directories are created as needed and existing content
    /// at the key is overwritten. Chunks are written as they arrive, so
    /// memory use is independent of file size. Returns the number of bytes
    /// written.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::FileTooLarge`] if the stream exceeds the
    /// configured limit, or [`StorageError::Write`] if the source stream or
    /// the backing store fails. On any failure the partial output is
    /// discarded before returning.
    pub async fn save<S, E>(&self, key: &ImageKey, content: S) -> Result<u64, StorageError>
    where
        S: Stream<Item = Result<Bytes, E>>,
        E: std::fmt::Display,
    {
        let path = key.relative_path();
        let mut writer = self
            .operator
            .writer(&path)
            .await
            .map_err(|e| StorageError::write(e.to_string()))?;

        let mut content = std::pin::pin!(content);
        let mut written: u64 = 0;

        while let Some(chunk) = content.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    self.discard(writer, &path).await;
                    return Err(StorageError::write(format!("upload stream failed: {e}")));
                }
            };

            written += chunk.len() as u64;
            if written > self.config.max_file_size {
                self.discard(writer, &path).await;
                return Err(StorageError::file_too_large(
                    written,
                    self.config.max_file_size,
                ));
            }

            if let Err(e) = writer.write(chunk).await {
                self.discard(writer, &path).await;
                return Err(StorageError::write(e.to_string()));
            }
        }

        writer
            .close()
            .await
            .map_err(|e| StorageError::write(e.to_string()))?;

        Ok(written)
    }

    /// Open the image stored under `key` for reading.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::NotFound`] if nothing is stored under the
    /// key, or [`StorageError::Write`] for other store failures.
    pub async fn open(&self, key: &ImageKey) -> Result<ImageDownload, StorageError> {
        let path = key.relative_path();

        let meta = self.operator.stat(&path).await.map_err(|e| {
            if e.kind() == ErrorKind::NotFound {
                StorageError::not_found(&path)
            } else {
                StorageError::from(e)
            }
        })?;

        let reader = self
            .operator
            .reader(&path)
            .await
            .map_err(StorageError::from)?;
        let stream = reader
            .into_bytes_stream(..)
            .await
            .map_err(StorageError::from)?;

        Ok(ImageDownload {
            size: meta.content_length(),
            stream,
        })
    }

    /// Check if an image exists under `key`.
    pub async fn exists(&self, key: &ImageKey) -> bool {
        self.operator.stat(&key.relative_path()).await.is_ok()
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Abandon a failed write: no partial object may stay visible.
    async fn discard(&self, mut writer: opendal::Writer, path: &str) {
        let _ = writer.abort().await;
        let _ = self.operator.delete(path).await;
    }
}

/// Validate that the local store root exists, is a directory, and is
/// writable.
fn validate_local_root(root: &Path) -> Result<(), StorageError> {
    let meta = std::fs::metadata(root)
        .map_err(|e| StorageError::init(format!("{}: {e}", root.display())))?;

    if !meta.is_dir() {
        return Err(StorageError::init(format!(
            "{}: not a directory",
            root.display()
        )));
    }
    if meta.permissions().readonly() {
        return Err(StorageError::init(format!(
            "{}: not writable",
            root.display()
        )));
    }
    Ok(())
}
