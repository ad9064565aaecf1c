//! # Inventory Manager
//!
//! CRUD for products. There are no cross-table rules here; a duplicate SKU
//! is caught by the store's unique index and surfaces as
//! `DbError::UniqueViolation`.

use tracing::{debug, info};

use shelf_core::validation::{validate_price, validate_sku, validate_stock, validate_text};
use shelf_core::{CoreError, Money, Product, ProductUpdate};

use crate::error::ShelfResult;
use crate::repository::products::ProductRepository;

/// Product operations.
#[derive(Clone)]
pub struct InventoryManager {
    products: ProductRepository,
}

impl InventoryManager {
    /// Creates a new InventoryManager.
    pub fn new(products: ProductRepository) -> Self {
        InventoryManager { products }
    }

    /// Adds a product.
    pub async fn add_product(&self, name: &str, sku: &str, price: Money, stock: i64) -> ShelfResult<Product> {
        validate_text("name", name)?;
        validate_sku(sku)?;
        validate_price(price)?;
        validate_stock(stock)?;

        let product = self
            .products
            .insert(&Product {
                sku: sku.trim().to_string(),
                name: name.trim().to_string(),
                price,
                stock,
            })
            .await?;

        info!(sku = %product.sku, "Product added");
        Ok(product)
    }

    /// Updates the supplied fields.
    ///
    /// ## Returns
    /// * `Ok(None)` - Nothing supplied; no request was sent
    /// * `Ok(Some(rows))` - The updated product
    /// * `Err(ProductNotFound)` - No product with this SKU
    pub async fn update_product(&self, sku: &str, update: ProductUpdate) -> ShelfResult<Option<Vec<Product>>> {
        if update.is_empty() {
            debug!(sku = %sku, "Product update has no fields; skipping");
            return Ok(None);
        }
        let update = ProductUpdate {
            name: update.name.map(|name| name.trim().to_string()),
            ..update
        };
        if let Some(name) = &update.name {
            validate_text("name", name)?;
        }
        if let Some(price) = update.price {
            validate_price(price)?;
        }
        if let Some(stock) = update.stock {
            validate_stock(stock)?;
        }

        let sku = sku.trim();
        let rows = self.products.update(sku, &update).await?;
        if rows.is_empty() {
            return Err(CoreError::ProductNotFound(sku.to_string()).into());
        }
        Ok(Some(rows))
    }

    /// Deletes a product.
    pub async fn delete_product(&self, sku: &str) -> ShelfResult<Vec<Product>> {
        let sku = sku.trim();
        let rows = self.products.delete(sku).await?;
        if rows.is_empty() {
            return Err(CoreError::ProductNotFound(sku.to_string()).into());
        }

        info!(sku = %sku, "Product deleted");
        Ok(rows)
    }

    /// Every product, in store order.
    pub async fn list_products(&self) -> ShelfResult<Vec<Product>> {
        Ok(self.products.list().await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;
    use crate::error::{DbError, ShelfError};
    use crate::memory::MemoryStore;
    use crate::Shelf;
    use shelf_core::ErrorKind;
    use std::sync::Arc;

    fn inventory() -> (Arc<MemoryStore>, InventoryManager) {
        let store = Arc::new(MemoryStore::new());
        let shelf = Shelf::with_store(store.clone(), StoreConfig::in_memory());
        (store, shelf.inventory())
    }

    #[tokio::test]
    async fn test_add_and_list() {
        let (_, inventory) = inventory();
        let mug = inventory
            .add_product("Mug", "MUG-01", Money::from_cents(450), 10)
            .await
            .unwrap();
        assert_eq!(mug.price.to_string(), "4.50");
        assert_eq!(inventory.list_products().await.unwrap(), vec![mug]);
    }

    #[tokio::test]
    async fn test_duplicate_sku_is_store_error() {
        let (_, inventory) = inventory();
        inventory
            .add_product("Mug", "MUG-01", Money::from_cents(450), 10)
            .await
            .unwrap();
        let err = inventory
            .add_product("Other mug", "MUG-01", Money::from_cents(100), 1)
            .await
            .unwrap_err();
        assert!(matches!(err, ShelfError::Db(DbError::UniqueViolation { .. })));
        assert_eq!(err.kind(), ErrorKind::Store);
    }

    #[tokio::test]
    async fn test_update_rules() {
        let (store, inventory) = inventory();
        inventory
            .add_product("Mug", "MUG-01", Money::from_cents(450), 10)
            .await
            .unwrap();
        let writes = store.write_count().unwrap();

        assert!(inventory
            .update_product("MUG-01", ProductUpdate::default())
            .await
            .unwrap()
            .is_none());
        assert_eq!(store.write_count().unwrap(), writes);

        let zero_stock = ProductUpdate {
            stock: Some(0),
            ..Default::default()
        };
        let rows = inventory.update_product("MUG-01", zero_stock).await.unwrap().unwrap();
        assert_eq!(rows[0].stock, 0);

        let negative = ProductUpdate {
            stock: Some(-1),
            ..Default::default()
        };
        assert_eq!(
            inventory.update_product("MUG-01", negative).await.unwrap_err().kind(),
            ErrorKind::Validation
        );

        let rename = ProductUpdate {
            name: Some("Cup".into()),
            ..Default::default()
        };
        assert_eq!(
            inventory.update_product("NOPE", rename).await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_update_trims_name() {
        let (_, inventory) = inventory();
        inventory
            .add_product("Mug", "MUG-01", Money::from_cents(450), 10)
            .await
            .unwrap();

        let update = ProductUpdate {
            name: Some("  Travel Mug ".into()),
            ..Default::default()
        };
        let rows = inventory.update_product("MUG-01", update).await.unwrap().unwrap();
        assert_eq!(rows[0].name, "Travel Mug");
    }

    #[tokio::test]
    async fn test_delete() {
        let (_, inventory) = inventory();
        inventory
            .add_product("Mug", "MUG-01", Money::from_cents(450), 10)
            .await
            .unwrap();
        assert_eq!(inventory.delete_product("MUG-01").await.unwrap().len(), 1);
        assert_eq!(
            inventory.delete_product("MUG-01").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}
