//! # Delivery Types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Status assigned when the caller does not give one
pub const DEFAULT_DELIVERY_STATUS: &str = "PENDING";

/// A shipment registered against a local transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub id: i64,
    /// Local transaction id (not the gateway id)
    pub transaction_id: i64,
    pub address: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDelivery {
    pub transaction_id: i64,
    pub address: String,
    pub status: String,
}

impl NewDelivery {
    pub fn new(transaction_id: i64, address: impl Into<String>, status: Option<String>) -> Self {
        Self {
            transaction_id,
            address: address.into(),
            status: status.unwrap_or_else(|| DEFAULT_DELIVERY_STATUS.to_string()),
        }
    }
}
