//! # Payment Gateway Port
//!
//! The remote payment provider is reached through the `PaymentGateway`
//! trait. Implementations perform exactly one HTTP call per method and
//! hand back the provider's JSON body untouched; deciding whether that
//! body is a success or an error is left to the caller.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    PaymentGateway (trait)                   │
//! │  ├── fetch_acceptance_token()                               │
//! │  ├── submit_transaction()                                   │
//! │  └── query_status()                                         │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                  ┌─────────┴─────────┐
//!                  │   WompiGateway    │
//!                  │   (pay-wompi)     │
//!                  └───────────────────┘
//! ```

use crate::error::PaymentResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Core trait for the payment gateway client.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Fetch the merchant's current acceptance token.
    ///
    /// Returns `Ok(None)` when the response carries no token; transport
    /// failures are returned as errors.
    async fn fetch_acceptance_token(&self) -> PaymentResult<Option<String>>;

    /// Submit a signed transaction. The parsed body is returned verbatim,
    /// whether it describes a success or a gateway-reported error.
    async fn submit_transaction(&self, payload: &TransactionPayload)
        -> PaymentResult<GatewayResponse>;

    /// Query a transaction by its gateway id.
    async fn query_status(&self, transaction_id: &str) -> PaymentResult<GatewayResponse>;

    /// Get the provider name (for logging and error messages).
    fn provider_name(&self) -> &'static str;
}

/// Type alias for a shared gateway (dynamic dispatch)
pub type SharedGateway = Arc<dyn PaymentGateway>;

/// Body sent to the gateway's transaction endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionPayload {
    pub acceptance_token: String,
    pub amount_in_cents: i64,
    pub currency: String,
    pub reference: String,
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expiration_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_data: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<serde_json::Value>,
}

/// Raw gateway JSON with typed accessors for the fields we act on.
///
/// Success bodies look like `{"data": {"id": ..., "status": ...}}`,
/// failures like `{"error": {"type": ..., "reason": ..., "messages": ...}}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GatewayResponse(pub serde_json::Value);

impl GatewayResponse {
    pub fn new(body: serde_json::Value) -> Self {
        Self(body)
    }

    /// Check if the body has the gateway's error shape
    pub fn is_error(&self) -> bool {
        self.0.get("error").map(|e| !e.is_null()).unwrap_or(false)
    }

    /// Human readable reason for an error body.
    ///
    /// Prefers `error.reason`, then `error.messages`, then `error.type`.
    pub fn error_reason(&self) -> Option<String> {
        let error = self.0.get("error").filter(|e| !e.is_null())?;
        let reason = error
            .get("reason")
            .and_then(|v| v.as_str())
            .map(String::from)
            .or_else(|| error.get("messages").map(|m| m.to_string()))
            .or_else(|| error.get("type").and_then(|v| v.as_str()).map(String::from))
            .unwrap_or_else(|| error.to_string());
        Some(reason)
    }

    /// The `data` object of a success body
    pub fn data(&self) -> Option<&serde_json::Value> {
        self.0.get("data").filter(|d| !d.is_null())
    }

    /// Gateway transaction id (`data.id`)
    pub fn transaction_id(&self) -> Option<String> {
        self.data()?.get("id").and_then(|id| match id {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    /// Transaction status (`data.status`)
    pub fn status(&self) -> Option<&str> {
        self.data()?.get("status").and_then(|v| v.as_str())
    }

    pub fn into_inner(self) -> serde_json::Value {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_body() {
        let response = GatewayResponse::new(json!({
            "data": { "id": "12345-1668624561-38705", "status": "APPROVED" }
        }));

        assert!(!response.is_error());
        assert_eq!(
            response.transaction_id().as_deref(),
            Some("12345-1668624561-38705")
        );
        assert_eq!(response.status(), Some("APPROVED"));
        assert_eq!(response.error_reason(), None);
    }

    #[test]
    fn test_error_body_reason() {
        let response = GatewayResponse::new(json!({
            "error": { "type": "INPUT_VALIDATION_ERROR", "reason": "La firma es inválida" }
        }));
        assert!(response.is_error());
        assert_eq!(response.error_reason().as_deref(), Some("La firma es inválida"));

        let response = GatewayResponse::new(json!({
            "error": { "type": "INPUT_VALIDATION_ERROR", "messages": { "reference": ["taken"] } }
        }));
        assert_eq!(
            response.error_reason().as_deref(),
            Some(r#"{"reference":["taken"]}"#)
        );
    }

    #[test]
    fn test_payload_skips_absent_fields() {
        let payload = TransactionPayload {
            acceptance_token: "tok".into(),
            amount_in_cents: 1000,
            currency: "COP".into(),
            reference: "ref".into(),
            signature: "sig".into(),
            customer_email: None,
            expiration_time: None,
            payment_method: None,
            redirect_url: None,
            customer_data: None,
            shipping_address: None,
        };
        let body = serde_json::to_value(&payload).unwrap();

        assert_eq!(body["amount_in_cents"], 1000);
        assert!(body.get("expiration_time").is_none());
    }
}
