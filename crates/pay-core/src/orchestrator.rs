//! # Transaction Orchestrator
//!
//! Drives a purchase through its lifecycle:
//!
//! ```text
//! create_transaction ──► PENDING ──► process_payment ──► APPROVED ─► stock - 1
//!                                        │                DECLINED
//!                                        │                ERROR / VOIDED
//!                  query_status / webhook ┘  (last write wins)
//! ```
//!
//! Business failures (missing product, missing transaction, gateway
//! rejection) come back as structured errors. A missing acceptance token
//! and transport failures on create/pay are faults and are propagated as
//! they are; status polling converts transport failures into a structured
//! error instead.
//!
//! No step locks rows or wraps the read-then-write sequences in a
//! database transaction. Status writes are last-write-wins across
//! payment responses, polling and webhooks.

use crate::customer::Customer;
use crate::delivery::{Delivery, NewDelivery};
use crate::error::{PaymentError, PaymentResult};
use crate::gateway::{GatewayResponse, SharedGateway, TransactionPayload};
use crate::inventory::ProductInventory;
use crate::product::Product;
use crate::signature::integrity_signature;
use crate::store::{CustomerStore, DeliveryStore, ProductStore, SharedStore, TransactionStore};
use crate::transaction::{status, NewTransaction, Transaction, TransactionFilter};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// Currency every purchase is created in
pub const DEFAULT_CURRENCY: &str = "COP";

/// Units removed from stock for every approved payment
const STOCK_PER_APPROVED_PAYMENT: i64 = 1;

/// Signing configuration for gateway submissions
#[derive(Clone)]
pub struct CheckoutSettings {
    pub integrity_secret: String,
    pub currency: String,
}

impl CheckoutSettings {
    pub fn new(integrity_secret: impl Into<String>) -> Self {
        Self {
            integrity_secret: integrity_secret.into(),
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl std::fmt::Debug for CheckoutSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutSettings")
            .field("integrity_secret", &"<redacted>")
            .field("currency", &self.currency)
            .finish()
    }
}

// =============================================================================
// Inputs / Outputs
// =============================================================================

/// Request to open a transaction for a product
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateTransactionRequest {
    pub product_id: i64,
    /// Client-supplied reference; a UUID is generated when absent
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub expiration_time: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub payment_method: Option<serde_json::Value>,
}

/// Result of a successful `create_transaction`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedTransaction {
    pub transaction_id: Option<String>,
    pub amount_in_cents: i64,
    pub reference: String,
}

/// Request to charge a previously created transaction
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentRequest {
    /// Gateway transaction id returned by `create_transaction`
    pub transaction_id: String,
    #[serde(default)]
    pub expiration_time: Option<String>,
    #[serde(default)]
    pub customer_email: Option<String>,
    #[serde(default)]
    pub customer_data: Option<serde_json::Value>,
    #[serde(default)]
    pub shipping_address: Option<serde_json::Value>,
    /// Accepted for compatibility; the stored amount is what gets charged
    #[serde(default)]
    pub amount_in_cents: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub payment_method: Option<serde_json::Value>,
    #[serde(default)]
    pub redirect_url: Option<String>,
}

/// Result of a status refresh
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusReport {
    pub transaction_id: String,
    pub status: String,
    pub details: serde_json::Value,
}

/// A transaction joined with its related records
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionDetails {
    pub transaction: Transaction,
    pub product: Option<Product>,
    pub customer: Option<Customer>,
    pub delivery: Option<Delivery>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisteredDelivery {
    pub delivery_id: i64,
}

// =============================================================================
// Orchestrator
// =============================================================================

#[derive(Clone)]
pub struct TransactionOrchestrator {
    gateway: SharedGateway,
    store: SharedStore,
    inventory: ProductInventory,
    settings: CheckoutSettings,
}

impl TransactionOrchestrator {
    pub fn new(gateway: SharedGateway, store: SharedStore, settings: CheckoutSettings) -> Self {
        let inventory = ProductInventory::new(store.clone());
        Self {
            gateway,
            store,
            inventory,
            settings,
        }
    }

    /// Open a gateway transaction for a product and record it locally as PENDING.
    #[instrument(skip(self, request), fields(product_id = request.product_id))]
    pub async fn create_transaction(
        &self,
        request: CreateTransactionRequest,
    ) -> PaymentResult<CreatedTransaction> {
        let product = self
            .store
            .get_product(request.product_id)
            .await?
            .ok_or(PaymentError::ProductNotFound {
                product_id: request.product_id,
            })?;

        let acceptance_token = self.acceptance_token().await?;

        let reference = request
            .reference
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let amount_in_cents = product.amount_in_cents()?;
        let expiration_time = request.expiration_time.filter(|e| !e.is_empty());

        let signature = integrity_signature(
            &reference,
            amount_in_cents,
            &self.settings.currency,
            &self.settings.integrity_secret,
            expiration_time.as_deref(),
        );

        let payload = TransactionPayload {
            acceptance_token,
            amount_in_cents,
            currency: self.settings.currency.clone(),
            reference: reference.clone(),
            signature,
            customer_email: request.customer_email,
            expiration_time,
            payment_method: request.payment_method,
            redirect_url: None,
            customer_data: None,
            shipping_address: None,
        };

        debug!(
            "Submitting transaction: reference={}, amount_in_cents={}",
            reference, amount_in_cents
        );
        let response = self.gateway.submit_transaction(&payload).await?;

        if let Some(reason) = response.error_reason() {
            warn!("Gateway rejected transaction {}: {}", reference, reason);
            return Err(self.provider_error(format!(
                "error creating the transaction: {}",
                reason
            )));
        }

        let transaction_id = response.transaction_id();
        if transaction_id.is_none() {
            warn!("Gateway response for {} carried no transaction id", reference);
        }

        self.store
            .insert_transaction(&NewTransaction::pending(
                product.id,
                transaction_id.clone(),
                reference.clone(),
                amount_in_cents,
            ))
            .await?;

        info!(
            "Created transaction {:?} for product {} ({} cents)",
            transaction_id, product.id, amount_in_cents
        );

        Ok(CreatedTransaction {
            transaction_id,
            amount_in_cents,
            reference,
        })
    }

    /// Charge a stored transaction and apply the outcome locally.
    ///
    /// The local status always follows the gateway's answer; an APPROVED
    /// answer also removes one unit from the product's stock.
    #[instrument(skip(self, request), fields(transaction_id = %request.transaction_id))]
    pub async fn process_payment(&self, request: PaymentRequest) -> PaymentResult<GatewayResponse> {
        let transaction = self.find(&request.transaction_id).await?;

        let acceptance_token = self.acceptance_token().await?;

        let reference = transaction
            .transaction_id
            .clone()
            .unwrap_or_else(|| request.transaction_id.clone());
        let currency = request
            .currency
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.settings.currency.clone());
        let expiration_time = request.expiration_time.filter(|e| !e.is_empty());

        if let Some(requested) = request.amount_in_cents {
            if requested != transaction.amount {
                warn!(
                    "Ignoring client amount {} for transaction {}, charging stored {}",
                    requested, reference, transaction.amount
                );
            }
        }

        let signature = integrity_signature(
            &reference,
            transaction.amount,
            &currency,
            &self.settings.integrity_secret,
            expiration_time.as_deref(),
        );

        let payload = TransactionPayload {
            acceptance_token,
            amount_in_cents: transaction.amount,
            currency,
            reference: reference.clone(),
            signature,
            customer_email: request.customer_email,
            expiration_time,
            payment_method: request.payment_method,
            redirect_url: request.redirect_url,
            customer_data: request.customer_data,
            shipping_address: request.shipping_address,
        };

        let response = self.gateway.submit_transaction(&payload).await?;

        if let Some(reason) = response.error_reason() {
            warn!("Gateway rejected payment for {}: {}", reference, reason);
            return Err(self.provider_error(format!("error processing the payment: {}", reason)));
        }

        match response.status() {
            Some(new_status) => {
                self.store
                    .update_transaction_status(&reference, new_status)
                    .await?;
                info!("Transaction {} is now {}", reference, new_status);

                if new_status == status::APPROVED {
                    self.release_stock(&transaction).await?;
                }
            }
            None => warn!("Payment response for {} carried no status", reference),
        }

        Ok(response)
    }

    /// Refresh a transaction's status from the gateway.
    #[instrument(skip(self))]
    pub async fn query_status(&self, transaction_id: &str) -> PaymentResult<StatusReport> {
        let transaction = self.find(transaction_id).await?;

        let response = match self.gateway.query_status(transaction_id).await {
            Ok(response) => response,
            Err(e) => {
                error!("Status query for {} failed: {}", transaction_id, e);
                return Err(self.provider_error(format!("error querying the gateway: {}", e)));
            }
        };

        if let Some(reason) = response.error_reason() {
            return Err(self.provider_error(format!("error querying the status: {}", reason)));
        }

        let remote_status = response.status().map(String::from).ok_or_else(|| {
            self.provider_error(format!(
                "status response for {} carried no status",
                transaction_id
            ))
        })?;

        if transaction.status != remote_status {
            self.store
                .update_transaction_status(transaction_id, &remote_status)
                .await?;
            info!(
                "Transaction {} moved {} -> {}",
                transaction_id, transaction.status, remote_status
            );
        } else {
            debug!("Transaction {} unchanged ({})", transaction_id, remote_status);
        }

        Ok(StatusReport {
            transaction_id: transaction_id.to_string(),
            status: remote_status,
            details: response.data().cloned().unwrap_or(serde_json::Value::Null),
        })
    }

    /// Join a transaction with its product, customer and first delivery.
    /// `None` only when the transaction itself does not exist.
    pub async fn get_details(&self, transaction_id: &str) -> PaymentResult<Option<TransactionDetails>> {
        let Some(transaction) = self.store.find_transaction(transaction_id).await? else {
            return Ok(None);
        };

        let product = self.store.get_product(transaction.product_id).await?;
        let customer = match transaction.customer_id {
            Some(id) => self.store.get_customer(id).await?,
            None => None,
        };
        let delivery = self
            .store
            .find_delivery_by_transaction(transaction.id)
            .await?;

        Ok(Some(TransactionDetails {
            transaction,
            product,
            customer,
            delivery,
        }))
    }

    /// Register a delivery for a transaction. Several deliveries per
    /// transaction are allowed.
    #[instrument(skip(self, address))]
    pub async fn register_delivery(
        &self,
        transaction_id: &str,
        address: &str,
        delivery_status: Option<String>,
    ) -> PaymentResult<RegisteredDelivery> {
        let transaction = self.find(transaction_id).await?;

        if address.trim().is_empty() {
            return Err(PaymentError::InvalidRequest("address is required".to_string()));
        }

        let delivery = self
            .store
            .insert_delivery(&NewDelivery::new(transaction.id, address, delivery_status))
            .await?;
        info!(
            "Registered delivery {} for transaction {}",
            delivery.id, transaction_id
        );

        Ok(RegisteredDelivery {
            delivery_id: delivery.id,
        })
    }

    pub async fn list_transactions(&self, filter: &TransactionFilter) -> PaymentResult<Vec<Transaction>> {
        self.store.list_transactions(filter).await
    }

    pub fn provider_name(&self) -> &'static str {
        self.gateway.provider_name()
    }

    // -------------------------------------------------------------------------

    async fn find(&self, transaction_id: &str) -> PaymentResult<Transaction> {
        self.store
            .find_transaction(transaction_id)
            .await?
            .ok_or_else(|| PaymentError::TransactionNotFound {
                transaction_id: transaction_id.to_string(),
            })
    }

    async fn acceptance_token(&self) -> PaymentResult<String> {
        self.gateway
            .fetch_acceptance_token()
            .await?
            .ok_or_else(|| {
                error!("Gateway returned no acceptance token");
                PaymentError::AcceptanceTokenUnavailable {
                    provider: self.gateway.provider_name().to_string(),
                }
            })
    }

    /// The gateway already approved the charge, so a failed decrement is
    /// logged rather than turned into an error for the caller.
    async fn release_stock(&self, transaction: &Transaction) -> PaymentResult<()> {
        match self
            .inventory
            .reduce_stock(transaction.product_id, STOCK_PER_APPROVED_PAYMENT)
            .await
        {
            Ok(true) => Ok(()),
            Ok(false) => {
                warn!(
                    "Approved transaction {} references missing product {}",
                    transaction.id, transaction.product_id
                );
                Ok(())
            }
            Err(PaymentError::InsufficientStock { .. }) => {
                warn!(
                    "Approved transaction {} but product {} is out of stock",
                    transaction.id, transaction.product_id
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    fn provider_error(&self, message: String) -> PaymentError {
        PaymentError::ProviderError {
            provider: self.gateway.provider_name().to_string(),
            message,
        }
    }
}
