//! # pay-wompi
//!
//! Wompi payment gateway client for the storefront backend.
//!
//! `WompiGateway` implements [`pay_core::PaymentGateway`]:
//!
//! | Call | Endpoint | Auth |
//! |------|----------|------|
//! | `fetch_acceptance_token` | `GET /merchants/{public_key}` | public key |
//! | `submit_transaction` | `POST /transactions` | private key |
//! | `query_status` | `GET /transactions/{id}` | public key |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use pay_wompi::WompiGateway;
//! use pay_core::PaymentGateway;
//!
//! // Create gateway from environment
//! let gateway = WompiGateway::from_env()?;
//!
//! let token = gateway.fetch_acceptance_token().await?;
//! ```

pub mod client;
pub mod config;

// Re-exports
pub use client::WompiGateway;
pub use config::{WompiConfig, PRODUCTION_API_URL, SANDBOX_API_URL};
