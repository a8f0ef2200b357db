//! Image keys: validated `(product id, filename)` pairs.

use std::path::{Component, Path, PathBuf};

use super::error::StorageError;

/// Key addressing one stored image.
///
/// Construction validates the filename, so a value of this type always
/// resolves to a location inside the store root. The on-store layout is
/// `{id}/{filename}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ImageKey {
    id: u64,
    filename: String,
}

impl ImageKey {
    /// Create a key from a product id and filename.
    ///
    /// The filename must be `{letters}.{three lowercase letters}` - the
    /// only shape the service serves. Everything else, including any path
    /// separator or dot sequence, is rejected before touching storage.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidFilename`] if the filename does not
    /// match the pattern.
    pub fn new(id: u64, filename: &str) -> Result<Self, StorageError> {
        if !is_valid_filename(filename) {
            return Err(StorageError::invalid_filename(filename));
        }
        Ok(Self {
            id,
            filename: filename.to_string(),
        })
    }

    /// The product id.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// The validated filename.
    #[must_use]
    pub fn filename(&self) -> &str {
        self.filename.as_str()
    }

    /// Store-relative path: `{id}/{filename}`.
    #[must_use]
    pub fn relative_path(&self) -> String {
        format!("{}/{}", self.id, self.filename)
    }

    /// Resolve the key to an absolute location under `root`.
    ///
    /// Asserts the containment invariant: every component of the relative
    /// path must be a plain segment, and the joined path must keep `root`
    /// as its prefix. `..`, absolute segments, and separator smuggling all
    /// fail here even if a caller bypassed filename validation.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidFilename`] if resolution would leave
    /// the root.
    pub fn resolve_under(&self, root: &Path) -> Result<PathBuf, StorageError> {
        let relative = PathBuf::from(self.id.to_string()).join(&self.filename);
        let plain_segments = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if !plain_segments {
            return Err(StorageError::invalid_filename(&self.filename));
        }

        let resolved = root.join(&relative);
        if !resolved.starts_with(root) {
            return Err(StorageError::invalid_filename(&self.filename));
        }
        Ok(resolved)
    }
}

impl std::fmt::Display for ImageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.id, self.filename)
    }
}

/// Check a filename against `{letters}.{three lowercase letters}`.
fn is_valid_filename(filename: &str) -> bool {
    let Some((stem, ext)) = filename.rsplit_once('.') else {
        return false;
    };
    !stem.is_empty()
        && stem.bytes().all(|b| b.is_ascii_alphabetic())
        && ext.len() == 3
        && ext.bytes().all(|b| b.is_ascii_lowercase())
}
