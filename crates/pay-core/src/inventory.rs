//! # Product Inventory
//!
//! Read/update operations on products. Missing products come back as
//! `None` / `false` so the HTTP layer can answer 404; the only business
//! rejection is a stock decrement that would go below zero.

use crate::error::{PaymentError, PaymentResult};
use crate::product::{NewProduct, Product, ProductSeed, ProductUpdate};
use crate::store::{ProductStore, SharedStore};
use tracing::{info, instrument, warn};

#[derive(Clone)]
pub struct ProductInventory {
    store: SharedStore,
}

impl ProductInventory {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> PaymentResult<Vec<Product>> {
        self.store.list_products().await
    }

    pub async fn get(&self, id: i64) -> PaymentResult<Option<Product>> {
        self.store.get_product(id).await
    }

    /// Merge the fields present in `update`; stock only changes when given.
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: i64, update: &ProductUpdate) -> PaymentResult<bool> {
        update.validate()?;
        let updated = self.store.update_product(id, update).await?;
        if updated {
            info!("Updated product {}", id);
        }
        Ok(updated)
    }

    /// Decrement stock by `quantity`.
    #[instrument(skip(self))]
    pub async fn reduce_stock(&self, id: i64, quantity: i64) -> PaymentResult<bool> {
        if quantity <= 0 {
            return Err(PaymentError::InvalidRequest(format!(
                "quantity must be positive, got {}",
                quantity
            )));
        }
        match self.store.reduce_stock(id, quantity).await {
            Ok(true) => {
                info!("Reduced stock of product {} by {}", id, quantity);
                Ok(true)
            }
            Ok(false) => Ok(false),
            Err(e) => {
                warn!("Stock reduction rejected for product {}: {}", id, e);
                Err(e)
            }
        }
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> PaymentResult<bool> {
        let deleted = self.store.delete_product(id).await?;
        if deleted {
            info!("Deleted product {}", id);
        }
        Ok(deleted)
    }

    /// Insert seed products when the table is empty. Returns how many were added.
    #[instrument(skip(self, seed), fields(products = seed.products.len()))]
    pub async fn seed(&self, seed: &ProductSeed) -> PaymentResult<usize> {
        seed.validate()?;
        if !self.store.list_products().await?.is_empty() {
            info!("Products already present, skipping seed");
            return Ok(0);
        }
        for product in &seed.products {
            self.store.insert_product(product).await?;
        }
        info!("Seeded {} products", seed.products.len());
        Ok(seed.products.len())
    }

    pub async fn create(&self, product: &NewProduct) -> PaymentResult<Product> {
        product.validate()?;
        self.store.insert_product(product).await
    }
}
