//! Catalog error types.

use thiserror::Error;

/// Catalog operation errors.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    /// No product with the given id.
    #[error("product not found: {0}")]
    NotFound(u64),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(CatalogError::NotFound(12).to_string(), "product not found: 12");
    }
}
