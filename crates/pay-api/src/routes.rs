//! # Routes
//!
//! Axum router configuration for the storefront API.

use crate::handlers;
use crate::state::AppState;
use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::warn;

/// Create the main application router
///
/// Routes:
/// - Products:
///   - GET    /products
///   - GET    /products/{id}
///   - PUT    /products/{id}
///   - DELETE /products/{id}
///   - PUT    /products/{id}/reduce-stock
///
/// - Transactions:
///   - POST /transactions
///   - POST /transactions/pay
///   - GET  /transactions?status=&start_date=&end_date=
///   - GET  /transactions/{id}
///   - GET  /transactions/{id}/status
///
/// - Customers / deliveries:
///   - POST /customers
///   - POST /deliveries
///
/// - Webhooks:
///   - POST /webhook/notifications
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.cors_allowed_origin);

    Router::new()
        .route("/health", get(handlers::health))
        // Products
        .route("/products", get(handlers::list_products))
        .route(
            "/products/{product_id}",
            get(handlers::get_product)
                .put(handlers::update_product)
                .delete(handlers::delete_product),
        )
        .route("/products/{product_id}/reduce-stock", put(handlers::reduce_stock))
        // Transactions; the static "/pay" segment wins over "/{transaction_id}"
        .route(
            "/transactions",
            get(handlers::list_transactions).post(handlers::create_transaction),
        )
        .route("/transactions/pay", post(handlers::process_payment))
        .route("/transactions/{transaction_id}", get(handlers::get_transaction))
        .route(
            "/transactions/{transaction_id}/status",
            get(handlers::transaction_status),
        )
        // Customers / deliveries
        .route("/customers", post(handlers::create_customer))
        .route("/deliveries", post(handlers::register_delivery))
        // Webhooks
        .route("/webhook/notifications", post(handlers::webhook_notification))
        // Middleware
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        // State
        .with_state(state)
}

/// CORS for the configured storefront origins (comma separated)
fn cors_layer(allowed: &str) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", o);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::HEAD,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::HeaderName::from_static("x-requested-with"),
        ])
        .expose_headers([header::CONTENT_LENGTH])
}
