//! # Webhook Notifications
//!
//! The gateway pushes status changes as
//! `{"event": "transaction.updated", "data": {"id": ..., "status": ...}}`.
//! The new status overwrites the local one without checking the
//! transition. Notifications are not authenticated.

use crate::error::{PaymentError, PaymentResult};
use crate::store::{SharedStore, TransactionStore};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

/// The only event type we act on
pub const TRANSACTION_UPDATED: &str = "transaction.updated";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookNotification {
    pub event: String,
    #[serde(default)]
    pub data: Option<NotificationData>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationData {
    /// Gateway transaction id
    pub id: String,
    pub status: String,
}

/// What an applied notification changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AppliedNotification {
    pub transaction_id: String,
    pub status: String,
    /// Local rows whose status was overwritten
    pub updated: u64,
}

impl AppliedNotification {
    pub fn message(&self) -> String {
        format!(
            "Transaction {} updated to status {}",
            self.transaction_id, self.status
        )
    }
}

#[derive(Clone)]
pub struct WebhookIngestor {
    store: SharedStore,
}

impl WebhookIngestor {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    /// Apply a pushed status update.
    #[instrument(skip(self, notification), fields(event = %notification.event))]
    pub async fn apply_notification(
        &self,
        notification: &WebhookNotification,
    ) -> PaymentResult<AppliedNotification> {
        if notification.event != TRANSACTION_UPDATED {
            warn!("Ignoring unsupported webhook event {}", notification.event);
            return Err(PaymentError::UnsupportedEvent {
                event: notification.event.clone(),
            });
        }

        let data = notification.data.as_ref().ok_or_else(|| {
            PaymentError::InvalidRequest("notification is missing data.id / data.status".to_string())
        })?;

        let updated = self
            .store
            .update_transaction_status(&data.id, &data.status)
            .await?;

        if updated == 0 {
            warn!("Webhook for unknown transaction {}", data.id);
        } else {
            info!("Webhook set transaction {} to {}", data.id, data.status);
        }

        Ok(AppliedNotification {
            transaction_id: data.id.clone(),
            status: data.status.clone(),
            updated,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;
    use crate::transaction::{status, NewTransaction};
    use serde_json::json;
    use std::sync::Arc;

    fn notification(event: &str, id: &str, status: &str) -> WebhookNotification {
        serde_json::from_value(json!({
            "event": event,
            "data": { "id": id, "status": status }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_overwrites_terminal_status() {
        let store = Arc::new(MemoryStore::new());
        store
            .insert_transaction(&NewTransaction {
                product_id: 1,
                transaction_id: Some("X".into()),
                reference: None,
                status: status::APPROVED.into(),
                amount: 100,
            })
            .await
            .unwrap();
        let ingestor = WebhookIngestor::new(store.clone());

        let applied = ingestor
            .apply_notification(&notification("transaction.updated", "X", "VOIDED"))
            .await
            .unwrap();

        assert_eq!(applied.updated, 1);
        assert_eq!(applied.message(), "Transaction X updated to status VOIDED");
        let stored = store.find_transaction("X").await.unwrap().unwrap();
        assert_eq!(stored.status, "VOIDED");
    }

    #[tokio::test]
    async fn test_rejects_other_events() {
        let ingestor = WebhookIngestor::new(Arc::new(MemoryStore::new()));

        let err = ingestor
            .apply_notification(&notification("nequi_token.updated", "X", "APPROVED"))
            .await
            .unwrap_err();

        assert!(matches!(err, PaymentError::UnsupportedEvent { .. }));
    }

    #[tokio::test]
    async fn test_unknown_transaction_is_not_an_error() {
        let ingestor = WebhookIngestor::new(Arc::new(MemoryStore::new()));

        let applied = ingestor
            .apply_notification(&notification("transaction.updated", "missing", "APPROVED"))
            .await
            .unwrap();

        assert_eq!(applied.updated, 0);
    }

    #[tokio::test]
    async fn test_missing_data() {
        let ingestor = WebhookIngestor::new(Arc::new(MemoryStore::new()));
        let notification: WebhookNotification =
            serde_json::from_value(json!({ "event": "transaction.updated" })).unwrap();

        let err = ingestor.apply_notification(&notification).await.unwrap_err();
        assert!(matches!(err, PaymentError::InvalidRequest(_)));
    }
}
