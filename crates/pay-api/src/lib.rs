//! # pay-api
//!
//! HTTP API layer for the storefront backend.
//!
//! This crate provides:
//! - Axum-based HTTP server
//! - REST endpoints for products, transactions, customers and deliveries
//! - The gateway notification webhook
//!
//! ## Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | GET | `/health` | Health check |
//! | GET | `/products` | List products |
//! | GET/PUT/DELETE | `/products/{id}` | Read, partially update, delete |
//! | PUT | `/products/{id}/reduce-stock` | Decrement stock by `quantity` |
//! | POST | `/transactions` | Open a gateway transaction |
//! | POST | `/transactions/pay` | Charge a transaction |
//! | GET | `/transactions` | List, filtered by status and date window |
//! | GET | `/transactions/{id}` | Transaction with product, customer, delivery |
//! | GET | `/transactions/{id}/status` | Refresh status from the gateway |
//! | POST | `/customers` | Register a customer |
//! | POST | `/deliveries` | Register a delivery |
//! | POST | `/webhook/notifications` | Gateway status notification |

pub mod handlers;
pub mod routes;
pub mod state;

pub use routes::create_router;
pub use state::{AppConfig, AppState};
