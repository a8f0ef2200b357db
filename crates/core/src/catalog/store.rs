//! In-memory product store.

use tokio::sync::RwLock;

use super::error::CatalogError;
use super::types::{Product, seed_products};

/// Process-owned product list.
///
/// The store is seeded with the default menu and shared across request
/// handlers; mutation is serialized behind an async lock. It is not
/// durable - contents reset on restart.
#[derive(Debug)]
pub struct ProductStore {
    products: RwLock<Vec<Product>>,
}

impl Default for ProductStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ProductStore {
    /// Create a store seeded with the default menu.
    #[must_use]
    pub fn new() -> Self {
        Self {
            products: RwLock::new(seed_products()),
        }
    }

    /// Return all products.
    pub async fn list(&self) -> Vec<Product> {
        self.products.read().await.clone()
    }

    /// Return the product with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if no product has the id.
    pub async fn get(&self, id: u64) -> Result<Product, CatalogError> {
        self.products
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(CatalogError::NotFound(id))
    }

    /// Add a product, assigning the next free id.
    pub async fn create(&self, mut product: Product) -> Product {
        let mut products = self.products.write().await;
        let max_id = products.iter().map(|p| p.id).max().unwrap_or(0);
        product.id = max_id + 1;
        products.push(product.clone());
        product
    }

    /// Replace the product with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if no product has the id.
    pub async fn update(&self, id: u64, mut product: Product) -> Result<Product, CatalogError> {
        let mut products = self.products.write().await;
        let slot = products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(CatalogError::NotFound(id))?;
        product.id = id;
        *slot = product.clone();
        Ok(product)
    }

    /// Remove the product with the given id.
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::NotFound`] if no product has the id.
    pub async fn delete(&self, id: u64) -> Result<(), CatalogError> {
        let mut products = self.products.write().await;
        let index = products
            .iter()
            .position(|p| p.id == id)
            .ok_or(CatalogError::NotFound(id))?;
        products.remove(index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn cortado() -> Product {
        Product {
            id: 0,
            name: "Cortado".to_string(),
            description: "Espresso cut with warm milk.".to_string(),
            price: dec!(3.10),
            sku: "coffee-cortado-mini".to_string(),
        }
    }

    #[tokio::test]
    async fn test_seeded_menu() {
        let store = ProductStore::new();
        let products = store.list().await;
        assert_eq!(products.len(), 7);
        assert_eq!(products[0].name, "Espresso");
    }

    #[tokio::test]
    async fn test_get_by_id() {
        let store = ProductStore::new();
        let product = store.get(3).await.expect("should find product");
        assert_eq!(product.name, "Latte");

        assert_eq!(store.get(999).await, Err(CatalogError::NotFound(999)));
    }

    #[tokio::test]
    async fn test_create_assigns_next_id() {
        let store = ProductStore::new();
        let created = store.create(cortado()).await;
        assert_eq!(created.id, 8);

        let fetched = store.get(8).await.expect("should find created product");
        assert_eq!(fetched.name, "Cortado");
    }

    #[tokio::test]
    async fn test_update_replaces_product() {
        let store = ProductStore::new();
        let mut replacement = cortado();
        replacement.name = "Doppio".to_string();

        let updated = store
            .update(2, replacement)
            .await
            .expect("should update product");
        assert_eq!(updated.id, 2);
        assert_eq!(store.get(2).await.expect("found").name, "Doppio");

        assert_eq!(
            store.update(999, cortado()).await,
            Err(CatalogError::NotFound(999))
        );
    }

    #[tokio::test]
    async fn test_delete_removes_product() {
        let store = ProductStore::new();
        store.delete(1).await.expect("should delete");
        assert_eq!(store.get(1).await, Err(CatalogError::NotFound(1)));
        assert_eq!(store.list().await.len(), 6);

        assert_eq!(store.delete(1).await, Err(CatalogError::NotFound(1)));
    }

    #[tokio::test]
    async fn test_id_reuse_after_delete_of_max() {
        let store = ProductStore::new();
        store.delete(7).await.expect("should delete");
        let created = store.create(cortado()).await;
        // Ids follow the current maximum, matching overwrite-free append.
        assert_eq!(created.id, 7);
    }
}
