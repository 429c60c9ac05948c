//! # Customers
//!
//! Customers are registered on their own; the payment flow does not link
//! them to transactions.

use crate::error::{PaymentError, PaymentResult};
use crate::store::{CustomerStore, SharedStore};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    /// Unique across customers
    pub email: String,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl NewCustomer {
    pub fn validate(&self) -> PaymentResult<()> {
        if self.name.trim().is_empty() {
            return Err(PaymentError::InvalidRequest("name is required".to_string()));
        }
        if !self.email.contains('@') {
            return Err(PaymentError::InvalidRequest(
                "a valid email is required".to_string(),
            ));
        }
        Ok(())
    }
}

/// Customer registration
#[derive(Clone)]
pub struct CustomerRegistry {
    store: SharedStore,
}

impl CustomerRegistry {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Register a customer and return its id
    #[instrument(skip(self, customer))]
    pub async fn register(&self, customer: NewCustomer) -> PaymentResult<i64> {
        customer.validate()?;
        let created = self.store.insert_customer(&customer).await?;
        info!("Registered customer {}", created.id);
        Ok(created.id)
    }

    pub async fn get(&self, id: i64) -> PaymentResult<Option<Customer>> {
        self.store.get_customer(id).await
    }
}
