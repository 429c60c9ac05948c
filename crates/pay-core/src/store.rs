//! # Storage Ports
//!
//! Persistence traits implemented by the datastore adapters
//! (`pay-store` for SQLite, [`crate::memory::MemoryStore`] in-process).
//!
//! Lookups return `Ok(None)` / `Ok(false)` when a row is absent so callers
//! can decide between a structured error and a 404.

use crate::customer::{Customer, NewCustomer};
use crate::delivery::{Delivery, NewDelivery};
use crate::error::PaymentResult;
use crate::product::{NewProduct, Product, ProductUpdate};
use crate::transaction::{NewTransaction, Transaction, TransactionFilter};
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn list_products(&self) -> PaymentResult<Vec<Product>>;

    async fn get_product(&self, id: i64) -> PaymentResult<Option<Product>>;

    async fn insert_product(&self, product: &NewProduct) -> PaymentResult<Product>;

    /// Merge the present fields over the stored row. `Ok(false)` if missing.
    async fn update_product(&self, id: i64, update: &ProductUpdate) -> PaymentResult<bool>;

    /// Decrement stock as one conditional write.
    ///
    /// `Ok(false)` if the product does not exist,
    /// `Err(InsufficientStock)` if the result would be negative.
    async fn reduce_stock(&self, id: i64, quantity: i64) -> PaymentResult<bool>;

    async fn delete_product(&self, id: i64) -> PaymentResult<bool>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn insert_transaction(&self, transaction: &NewTransaction)
        -> PaymentResult<Transaction>;

    /// Find by gateway-assigned transaction id
    async fn find_transaction(&self, transaction_id: &str) -> PaymentResult<Option<Transaction>>;

    /// Overwrite the status of every row with this gateway id; returns rows touched
    async fn update_transaction_status(
        &self,
        transaction_id: &str,
        status: &str,
    ) -> PaymentResult<u64>;

    async fn list_transactions(&self, filter: &TransactionFilter)
        -> PaymentResult<Vec<Transaction>>;
}

#[async_trait]
pub trait CustomerStore: Send + Sync {
    async fn insert_customer(&self, customer: &NewCustomer) -> PaymentResult<Customer>;

    async fn get_customer(&self, id: i64) -> PaymentResult<Option<Customer>>;
}

#[async_trait]
pub trait DeliveryStore: Send + Sync {
    async fn insert_delivery(&self, delivery: &NewDelivery) -> PaymentResult<Delivery>;

    /// First delivery registered for a local transaction id
    async fn find_delivery_by_transaction(
        &self,
        transaction_id: i64,
    ) -> PaymentResult<Option<Delivery>>;
}

/// Everything the services need from a datastore
pub trait Store: ProductStore + TransactionStore + CustomerStore + DeliveryStore {}

impl<T> Store for T where T: ProductStore + TransactionStore + CustomerStore + DeliveryStore {}

/// Shared handle to a datastore (dynamic dispatch)
pub type SharedStore = Arc<dyn Store>;
