//! # Transaction Types
//!
//! Local records of gateway transactions. The gateway owns the status
//! vocabulary; we store whatever string it reports.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Well-known gateway status values
pub mod status {
    pub const PENDING: &str = "PENDING";
    pub const APPROVED: &str = "APPROVED";
    pub const DECLINED: &str = "DECLINED";
    pub const VOIDED: &str = "VOIDED";
    pub const ERROR: &str = "ERROR";
}

/// A locally persisted transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    /// Local identifier
    pub id: i64,

    /// Product being purchased
    pub product_id: i64,

    /// Gateway-assigned transaction id
    pub transaction_id: Option<String>,

    /// Payment reference sent to the gateway
    pub reference: Option<String>,

    /// Last known gateway status
    pub status: String,

    /// Amount in minor units, fixed at creation
    pub amount: i64,

    /// Never populated by the payment flow
    pub customer_id: Option<i64>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    pub fn is_approved(&self) -> bool {
        self.status == status::APPROVED
    }
}

/// A transaction to insert after the gateway accepted it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub product_id: i64,
    pub transaction_id: Option<String>,
    pub reference: Option<String>,
    pub status: String,
    pub amount: i64,
}

impl NewTransaction {
    /// A transaction the gateway knows about but has not settled yet
    pub fn pending(
        product_id: i64,
        transaction_id: Option<String>,
        reference: impl Into<String>,
        amount: i64,
    ) -> Self {
        Self {
            product_id,
            transaction_id,
            reference: Some(reference.into()),
            status: status::PENDING.to_string(),
            amount,
        }
    }
}

/// Filters for listing transactions
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    pub status: Option<String>,
    /// Inclusive creation-time window
    pub created_between: Option<(DateTime<Utc>, DateTime<Utc>)>,
}

impl TransactionFilter {
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    pub fn created_between(mut self, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        self.created_between = Some((start, end));
        self
    }

    /// Check a transaction against this filter
    pub fn matches(&self, transaction: &Transaction) -> bool {
        let status_ok = self
            .status
            .as_ref()
            .map(|s| *s == transaction.status)
            .unwrap_or(true);
        let window_ok = self
            .created_between
            .map(|(start, end)| transaction.created_at >= start && transaction.created_at <= end)
            .unwrap_or(true);
        status_ok && window_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn transaction(status: &str) -> Transaction {
        Transaction {
            id: 1,
            product_id: 1,
            transaction_id: Some("txn_1".to_string()),
            reference: Some("ref".to_string()),
            status: status.to_string(),
            amount: 1_000_000,
            customer_id: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_pending_constructor() {
        let tx = NewTransaction::pending(3, Some("txn_9".into()), "ref-9", 500);
        assert_eq!(tx.status, "PENDING");
        assert_eq!(tx.reference.as_deref(), Some("ref-9"));
    }

    #[test]
    fn test_filter_matches() {
        let tx = transaction(status::APPROVED);
        let now = Utc::now();

        assert!(TransactionFilter::default().matches(&tx));
        assert!(TransactionFilter::default()
            .with_status("APPROVED")
            .matches(&tx));
        assert!(!TransactionFilter::default()
            .with_status("DECLINED")
            .matches(&tx));
        assert!(TransactionFilter::default()
            .created_between(now - Duration::hours(1), now + Duration::hours(1))
            .matches(&tx));
        assert!(!TransactionFilter::default()
            .created_between(now + Duration::hours(1), now + Duration::hours(2))
            .matches(&tx));
    }
}
