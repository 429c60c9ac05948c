//! # pay-core
//!
//! Core types, ports and services for the storefront payment backend.
//!
//! This crate provides:
//! - `PaymentGateway` trait for the remote payment provider
//! - `Store` traits for the relational datastore, plus `MemoryStore`
//! - `Product`, `Transaction`, `Customer` and `Delivery` records
//! - `integrity_signature` for signing gateway submissions
//! - `ProductInventory`, `TransactionOrchestrator`, `WebhookIngestor`
//!   and `CustomerRegistry` services
//! - `PaymentError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use pay_core::{CheckoutSettings, CreateTransactionRequest, TransactionOrchestrator};
//!
//! let orchestrator = TransactionOrchestrator::new(gateway, store, CheckoutSettings::new(secret));
//!
//! // Open a transaction for product 1
//! let created = orchestrator
//!     .create_transaction(CreateTransactionRequest { product_id: 1, ..Default::default() })
//!     .await?;
//!
//! // Later, charge it
//! let response = orchestrator.process_payment(payment_request).await?;
//! ```

pub mod customer;
pub mod delivery;
pub mod error;
pub mod gateway;
pub mod inventory;
pub mod memory;
pub mod orchestrator;
pub mod product;
pub mod signature;
pub mod store;
pub mod transaction;
pub mod webhook;

// Re-exports for convenience
pub use customer::{Customer, CustomerRegistry, NewCustomer};
pub use delivery::{Delivery, NewDelivery, DEFAULT_DELIVERY_STATUS};
pub use error::{PaymentError, PaymentResult};
pub use gateway::{GatewayResponse, PaymentGateway, SharedGateway, TransactionPayload};
pub use inventory::ProductInventory;
pub use memory::MemoryStore;
pub use orchestrator::{
    CheckoutSettings, CreateTransactionRequest, CreatedTransaction, PaymentRequest,
    RegisteredDelivery, StatusReport, TransactionDetails, TransactionOrchestrator,
    DEFAULT_CURRENCY,
};
pub use product::{NewProduct, Product, ProductSeed, ProductUpdate};
pub use signature::integrity_signature;
pub use store::{
    CustomerStore, DeliveryStore, ProductStore, SharedStore, Store, TransactionStore,
};
pub use transaction::{status, NewTransaction, Transaction, TransactionFilter};
pub use webhook::{AppliedNotification, NotificationData, WebhookIngestor, WebhookNotification};
