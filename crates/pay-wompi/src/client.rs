//! # Wompi Gateway Client
//!
//! Implementation of the three Wompi calls the storefront needs:
//! merchant acceptance token, transaction submission and status lookup.
//! Bodies are returned as parsed JSON without interpretation.

use crate::config::WompiConfig;
use async_trait::async_trait;
use pay_core::{GatewayResponse, PaymentError, PaymentGateway, PaymentResult, TransactionPayload};
use reqwest::{Client, Response};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};

const PROVIDER: &str = "wompi";

/// Wompi payment gateway
pub struct WompiGateway {
    config: WompiConfig,
    client: Client,
}

impl WompiGateway {
    /// Create a new gateway client
    pub fn new(config: WompiConfig) -> PaymentResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| {
                PaymentError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self { config, client })
    }

    /// Create from environment variables
    pub fn from_env() -> PaymentResult<Self> {
        Self::new(WompiConfig::from_env()?)
    }

    pub fn config(&self) -> &WompiConfig {
        &self.config
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base_url, path)
    }

    /// Read a response body as JSON regardless of HTTP status
    async fn read_json(response: Response) -> PaymentResult<serde_json::Value> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        if !status.is_success() {
            warn!("Wompi API returned status={}, body={}", status, body);
        }

        serde_json::from_str(&body).map_err(|e| {
            PaymentError::Serialization(format!(
                "Failed to parse Wompi response (HTTP {}): {}",
                status, e
            ))
        })
    }
}

#[async_trait]
impl PaymentGateway for WompiGateway {
    #[instrument(skip(self))]
    async fn fetch_acceptance_token(&self) -> PaymentResult<Option<String>> {
        let url = self.url(&format!("/merchants/{}", self.config.public_key));

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.config.public_auth_header())
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let body = Self::read_json(response).await?;
        let token = body
            .pointer("/data/presigned_acceptance/acceptance_token")
            .and_then(|v| v.as_str())
            .map(String::from);

        if token.is_none() {
            warn!("Merchant response carried no acceptance token");
        }
        Ok(token)
    }

    #[instrument(skip(self, payload), fields(reference = %payload.reference))]
    async fn submit_transaction(
        &self,
        payload: &TransactionPayload,
    ) -> PaymentResult<GatewayResponse> {
        let url = self.url("/transactions");

        debug!(
            "Submitting Wompi transaction: amount_in_cents={}, currency={}",
            payload.amount_in_cents, payload.currency
        );

        let response = self
            .client
            .post(&url)
            .header("Authorization", self.config.private_auth_header())
            .json(payload)
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let body = Self::read_json(response).await?;
        let response = GatewayResponse::new(body);

        info!(
            "Wompi transaction response: id={:?}, status={:?}, error={:?}",
            response.transaction_id(),
            response.status(),
            response.error_reason()
        );

        Ok(response)
    }

    #[instrument(skip(self))]
    async fn query_status(&self, transaction_id: &str) -> PaymentResult<GatewayResponse> {
        let url = self.url(&format!("/transactions/{}", transaction_id));

        let response = self
            .client
            .get(&url)
            .header("Authorization", self.config.public_auth_header())
            .send()
            .await
            .map_err(|e| PaymentError::NetworkError(e.to_string()))?;

        let body = Self::read_json(response).await?;
        Ok(GatewayResponse::new(body))
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}
