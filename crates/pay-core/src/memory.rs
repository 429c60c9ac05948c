//! # In-Memory Store
//!
//! A [`Store`](crate::store::Store) kept in process memory. Every operation
//! runs under one mutex, so stock decrements are atomic here as well.

use crate::customer::{Customer, NewCustomer};
use crate::delivery::{Delivery, NewDelivery};
use crate::error::{PaymentError, PaymentResult};
use crate::product::{NewProduct, Product, ProductUpdate};
use crate::store::{CustomerStore, DeliveryStore, ProductStore, TransactionStore};
use crate::transaction::{NewTransaction, Transaction, TransactionFilter};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

#[derive(Debug, Default)]
struct Tables {
    products: BTreeMap<i64, Product>,
    transactions: BTreeMap<i64, Transaction>,
    customers: BTreeMap<i64, Customer>,
    deliveries: BTreeMap<i64, Delivery>,
    next_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> PaymentResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| PaymentError::Internal("memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl ProductStore for MemoryStore {
    async fn list_products(&self) -> PaymentResult<Vec<Product>> {
        Ok(self.lock()?.products.values().cloned().collect())
    }

    async fn get_product(&self, id: i64) -> PaymentResult<Option<Product>> {
        Ok(self.lock()?.products.get(&id).cloned())
    }

    async fn insert_product(&self, product: &NewProduct) -> PaymentResult<Product> {
        let mut tables = self.lock()?;
        let now = Utc::now();
        let row = Product {
            id: tables.next_id(),
            name: product.name.clone(),
            description: product.description.clone(),
            price: product.price,
            stock: product.stock,
            created_at: now,
            updated_at: now,
        };
        tables.products.insert(row.id, row.clone());
        Ok(row)
    }

    async fn update_product(&self, id: i64, update: &ProductUpdate) -> PaymentResult<bool> {
        let mut tables = self.lock()?;
        match tables.products.get_mut(&id) {
            Some(product) => {
                update.apply_to(product);
                product.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn reduce_stock(&self, id: i64, quantity: i64) -> PaymentResult<bool> {
        let mut tables = self.lock()?;
        let Some(product) = tables.products.get_mut(&id) else {
            return Ok(false);
        };
        if !product.has_stock(quantity) {
            return Err(PaymentError::InsufficientStock {
                product_id: id,
                requested: quantity,
            });
        }
        product.stock -= quantity;
        product.updated_at = Utc::now();
        Ok(true)
    }

    async fn delete_product(&self, id: i64) -> PaymentResult<bool> {
        let mut tables = self.lock()?;
        if tables.transactions.values().any(|t| t.product_id == id) {
            return Err(PaymentError::Conflict(format!(
                "product {} is referenced by transactions",
                id
            )));
        }
        Ok(tables.products.remove(&id).is_some())
    }
}

#[async_trait]
impl TransactionStore for MemoryStore {
    async fn insert_transaction(
        &self,
        transaction: &NewTransaction,
    ) -> PaymentResult<Transaction> {
        let mut tables = self.lock()?;
        let now = Utc::now();
        let row = Transaction {
            id: tables.next_id(),
            product_id: transaction.product_id,
            transaction_id: transaction.transaction_id.clone(),
            reference: transaction.reference.clone(),
            status: transaction.status.clone(),
            amount: transaction.amount,
            customer_id: None,
            created_at: now,
            updated_at: now,
        };
        tables.transactions.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_transaction(&self, transaction_id: &str) -> PaymentResult<Option<Transaction>> {
        Ok(self
            .lock()?
            .transactions
            .values()
            .find(|t| t.transaction_id.as_deref() == Some(transaction_id))
            .cloned())
    }

    async fn update_transaction_status(
        &self,
        transaction_id: &str,
        status: &str,
    ) -> PaymentResult<u64> {
        let mut tables = self.lock()?;
        let now = Utc::now();
        let mut touched = 0;
        for tx in tables
            .transactions
            .values_mut()
            .filter(|t| t.transaction_id.as_deref() == Some(transaction_id))
        {
            tx.status = status.to_string();
            tx.updated_at = now;
            touched += 1;
        }
        Ok(touched)
    }

    async fn list_transactions(
        &self,
        filter: &TransactionFilter,
    ) -> PaymentResult<Vec<Transaction>> {
        Ok(self
            .lock()?
            .transactions
            .values()
            .filter(|t| filter.matches(t))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CustomerStore for MemoryStore {
    async fn insert_customer(&self, customer: &NewCustomer) -> PaymentResult<Customer> {
        let mut tables = self.lock()?;
        if tables.customers.values().any(|c| c.email == customer.email) {
            return Err(PaymentError::Conflict(format!(
                "customer with email {} already exists",
                customer.email
            )));
        }
        let now = Utc::now();
        let row = Customer {
            id: tables.next_id(),
            name: customer.name.clone(),
            email: customer.email.clone(),
            phone: customer.phone.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.customers.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_customer(&self, id: i64) -> PaymentResult<Option<Customer>> {
        Ok(self.lock()?.customers.get(&id).cloned())
    }
}

#[async_trait]
impl DeliveryStore for MemoryStore {
    async fn insert_delivery(&self, delivery: &NewDelivery) -> PaymentResult<Delivery> {
        let mut tables = self.lock()?;
        if !tables.transactions.contains_key(&delivery.transaction_id) {
            return Err(PaymentError::Conflict(format!(
                "transaction {} does not exist",
                delivery.transaction_id
            )));
        }
        let now = Utc::now();
        let row = Delivery {
            id: tables.next_id(),
            transaction_id: delivery.transaction_id,
            address: delivery.address.clone(),
            status: delivery.status.clone(),
            created_at: now,
            updated_at: now,
        };
        tables.deliveries.insert(row.id, row.clone());
        Ok(row)
    }

    async fn find_delivery_by_transaction(
        &self,
        transaction_id: i64,
    ) -> PaymentResult<Option<Delivery>> {
        Ok(self
            .lock()?
            .deliveries
            .values()
            .find(|d| d.transaction_id == transaction_id)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reduce_stock_guard() {
        let store = MemoryStore::new();
        let product = store
            .insert_product(&NewProduct::new("Producto A", 10000, 2))
            .await
            .unwrap();

        assert!(store.reduce_stock(product.id, 2).await.unwrap());
        let err = store.reduce_stock(product.id, 1).await.unwrap_err();
        assert!(matches!(err, PaymentError::InsufficientStock { .. }));
        assert!(!store.reduce_stock(999, 1).await.unwrap());

        let product = store.get_product(product.id).await.unwrap().unwrap();
        assert_eq!(product.stock, 0);
    }

    #[tokio::test]
    async fn test_status_update_by_gateway_id() {
        let store = MemoryStore::new();
        store
            .insert_transaction(&NewTransaction::pending(1, Some("txn_1".into()), "r1", 100))
            .await
            .unwrap();

        assert_eq!(
            store
                .update_transaction_status("txn_1", "APPROVED")
                .await
                .unwrap(),
            1
        );
        assert_eq!(
            store
                .update_transaction_status("txn_missing", "APPROVED")
                .await
                .unwrap(),
            0
        );
    }
}
