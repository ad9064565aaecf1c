//! # Product Repository
//!
//! Inventory rows keyed by SKU. The table name comes from configuration
//! (`SHELF_PRODUCTS_TABLE`), since deployments name it differently.

use std::sync::Arc;

use tracing::debug;

use shelf_core::{Product, ProductUpdate};

use crate::error::DbResult;
use crate::query::{Filter, Query};
use crate::store::{decode_row, decode_rows, to_row, DataStore};

/// Repository for products.
#[derive(Clone)]
pub struct ProductRepository {
    store: Arc<dyn DataStore>,
    table: String,
}

impl ProductRepository {
    /// Creates a new ProductRepository over `table`.
    pub fn new(store: Arc<dyn DataStore>, table: impl Into<String>) -> Self {
        ProductRepository {
            store,
            table: table.into(),
        }
    }

    /// Name of the product table.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Ok(Product)` - Product as stored
    /// * `Err(DbError::UniqueViolation)` - SKU already exists
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(sku = %product.sku, "Inserting product");
        let row = self.store.insert(&self.table, to_row(product)?).await?;
        decode_row(row)
    }

    /// Applies the supplied fields; returns the updated rows.
    pub async fn update(&self, sku: &str, update: &ProductUpdate) -> DbResult<Vec<Product>> {
        debug!(sku = %sku, "Updating product");
        let rows = self
            .store
            .update(&self.table, to_row(update)?, &[Filter::eq("sku", sku)])
            .await?;
        decode_rows(rows)
    }

    /// Deletes a product; returns the deleted rows.
    pub async fn delete(&self, sku: &str) -> DbResult<Vec<Product>> {
        debug!(sku = %sku, "Deleting product");
        let rows = self
            .store
            .delete(&self.table, &[Filter::eq("sku", sku)])
            .await?;
        decode_rows(rows)
    }

    /// Every product, in store order.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        decode_rows(self.store.select(&Query::from(self.table.as_str())).await?)
    }
}
