//! # Request Handlers
//!
//! Axum request handlers for the storefront API.
//!
//! Bodies are taken as raw JSON and decoded per endpoint so that missing or
//! malformed fields come back as a 400 with a JSON message instead of the
//! extractor's plain-text rejection.

use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, NaiveDate, Utc};
use pay_core::{
    CreateTransactionRequest, NewCustomer, PaymentError, PaymentRequest, ProductUpdate,
    TransactionFilter, WebhookNotification,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{error, info, instrument, warn};

// =============================================================================
// Request/Response Types
// =============================================================================

/// Fields `POST /transactions/pay` insists on, null values included
pub const PAYMENT_REQUIRED_FIELDS: [&str; 8] = [
    "transaction_id",
    "expiration_time",
    "customer_data",
    "shipping_address",
    "amount_in_cents",
    "currency",
    "payment_method",
    "redirect_url",
];

/// Reduce-stock request
#[derive(Debug, Deserialize)]
pub struct ReduceStockRequest {
    #[serde(default)]
    pub quantity: Option<i64>,
}

/// Delivery registration request
#[derive(Debug, Deserialize)]
pub struct DeliveryRequest {
    /// Gateway transaction id
    pub transaction_id: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub status: Option<String>,
}

/// Query string of `GET /transactions`
#[derive(Debug, Default, Deserialize)]
pub struct TransactionListQuery {
    pub status: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

/// Error response
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub message: String,
    pub code: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>, code: u16) -> Self {
        Self {
            message: message.into(),
            code,
            details: None,
        }
    }

    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);
pub type ApiResult<T> = Result<T, ApiError>;

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse::new(message, status.as_u16())))
}

/// Map an error with its own default status code
fn payment_error_to_response(err: PaymentError) -> ApiError {
    let code = err.status_code();
    let status = StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    api_error(status, err.to_string())
}

/// Map an error for an endpoint that reports business failures with a
/// fixed status. Faults and request validation keep their own code.
fn endpoint_error(err: PaymentError, status: StatusCode) -> ApiError {
    if err.is_fault() {
        error!("Request aborted: {}", err);
        return payment_error_to_response(err);
    }
    match err {
        PaymentError::InvalidRequest(_) => payment_error_to_response(err),
        other => api_error(status, other.to_string()),
    }
}

fn decode_body<T: DeserializeOwned>(payload: Result<Json<Value>, JsonRejection>) -> ApiResult<T> {
    let Json(value) = payload.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("invalid JSON body", 400).with_details(e.body_text())),
        )
    })?;
    decode_value(value)
}

fn decode_value<T: DeserializeOwned>(value: Value) -> ApiResult<T> {
    serde_json::from_value(value).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("invalid request body", 400).with_details(e.to_string())),
        )
    })
}

fn message(text: impl Into<String>) -> Json<Value> {
    Json(json!({ "message": text.into() }))
}

/// Parse an RFC 3339 timestamp or a `YYYY-MM-DD` date (midnight UTC)
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

// =============================================================================
// Handlers
// =============================================================================

/// Health check endpoint
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "service": "storefront",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

// --- Products ----------------------------------------------------------------

pub async fn list_products(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let products = state
        .inventory
        .list()
        .await
        .map_err(payment_error_to_response)?;
    Ok(Json(products))
}

pub async fn get_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let product = state
        .inventory
        .get(product_id)
        .await
        .map_err(payment_error_to_response)?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Product not found"))?;

    Ok(Json(product))
}

#[instrument(skip(state, payload))]
pub async fn update_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let update: ProductUpdate = decode_body(payload)?;

    let updated = state
        .inventory
        .update(product_id, &update)
        .await
        .map_err(payment_error_to_response)?;

    if !updated {
        return Err(api_error(StatusCode::NOT_FOUND, "Product not found"));
    }
    Ok(message("Product updated"))
}

#[instrument(skip(state))]
pub async fn delete_product(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
) -> ApiResult<impl IntoResponse> {
    let deleted = state
        .inventory
        .delete(product_id)
        .await
        .map_err(payment_error_to_response)?;

    if !deleted {
        return Err(api_error(StatusCode::NOT_FOUND, "Product not found"));
    }
    Ok(message("Product deleted"))
}

#[instrument(skip(state, payload))]
pub async fn reduce_stock(
    State(state): State<AppState>,
    Path(product_id): Path<i64>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let request: ReduceStockRequest = decode_body(payload)?;
    let quantity = request
        .quantity
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "quantity not provided"))?;

    let reduced = state
        .inventory
        .reduce_stock(product_id, quantity)
        .await
        .map_err(payment_error_to_response)?;

    if !reduced {
        return Err(api_error(StatusCode::NOT_FOUND, "Product not found"));
    }
    Ok(message("Stock reduced"))
}

// --- Transactions ------------------------------------------------------------

#[instrument(skip(state, payload))]
pub async fn create_transaction(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let request: CreateTransactionRequest = decode_body(payload)?;

    let created = state
        .orchestrator
        .create_transaction(request)
        .await
        .map_err(|e| endpoint_error(e, StatusCode::NOT_FOUND))?;

    Ok(Json(created))
}

#[instrument(skip(state, payload))]
pub async fn process_payment(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let Json(body) = payload.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("invalid JSON body", 400).with_details(e.body_text())),
        )
    })?;

    let missing: Vec<&str> = PAYMENT_REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| body.get(field).is_none())
        .collect();
    if !missing.is_empty() {
        warn!("Payment request missing fields: {:?}", missing);
        return Err(api_error(
            StatusCode::BAD_REQUEST,
            format!("missing the following fields: {}", missing.join(", ")),
        ));
    }

    let request: PaymentRequest = decode_value(body)?;

    let response = state
        .orchestrator
        .process_payment(request)
        .await
        .map_err(|e| endpoint_error(e, StatusCode::INTERNAL_SERVER_ERROR))?;

    Ok(Json(response.into_inner()))
}

pub async fn get_transaction(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let details = state
        .orchestrator
        .get_details(&transaction_id)
        .await
        .map_err(payment_error_to_response)?
        .ok_or_else(|| api_error(StatusCode::NOT_FOUND, "Transaction not found"))?;

    Ok(Json(details))
}

#[instrument(skip(state))]
pub async fn transaction_status(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let report = state
        .orchestrator
        .query_status(&transaction_id)
        .await
        .map_err(|e| endpoint_error(e, StatusCode::NOT_FOUND))?;

    Ok(Json(report))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Query(query): Query<TransactionListQuery>,
) -> ApiResult<impl IntoResponse> {
    let mut filter = TransactionFilter::default();
    if let Some(status) = query.status.filter(|s| !s.is_empty()) {
        filter = filter.with_status(status);
    }

    // The window only applies when both ends are given
    if let (Some(start), Some(end)) = (&query.start_date, &query.end_date) {
        let start = parse_date(start)
            .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, format!("invalid start_date: {}", start)))?;
        let end = parse_date(end)
            .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, format!("invalid end_date: {}", end)))?;
        filter = filter.created_between(start, end);
    }

    let transactions = state
        .orchestrator
        .list_transactions(&filter)
        .await
        .map_err(payment_error_to_response)?;

    Ok(Json(transactions))
}

// --- Customers / deliveries --------------------------------------------------

#[instrument(skip(state, payload))]
pub async fn create_customer(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let customer: NewCustomer = decode_body(payload)?;

    let customer_id = state
        .customers
        .register(customer)
        .await
        .map_err(payment_error_to_response)?;

    Ok(Json(json!({
        "message": "Customer created",
        "customer_id": customer_id
    })))
}

#[instrument(skip(state, payload))]
pub async fn register_delivery(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let request: DeliveryRequest = decode_body(payload)?;

    let registered = state
        .orchestrator
        .register_delivery(&request.transaction_id, &request.address, request.status)
        .await
        .map_err(|e| endpoint_error(e, StatusCode::NOT_FOUND))?;

    Ok(Json(registered))
}

// --- Webhook -----------------------------------------------------------------

/// Gateway status notification
#[instrument(skip(state, payload))]
pub async fn webhook_notification(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> ApiResult<impl IntoResponse> {
    let notification: WebhookNotification = decode_body(payload)?;

    let applied = state
        .webhooks
        .apply_notification(&notification)
        .await
        .map_err(payment_error_to_response)?;

    info!(
        "Webhook applied: transaction={}, status={}, rows={}",
        applied.transaction_id, applied.status, applied.updated
    );
    Ok(message(applied.message()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_response() {
        let err = ErrorResponse::new("Test error", 400).with_details("field x");
        assert_eq!(err.message, "Test error");
        assert_eq!(err.code, 400);
        assert_eq!(err.details.as_deref(), Some("field x"));
    }

    #[test]
    fn test_payment_error_conversion() {
        let err = PaymentError::InvalidRequest("Bad data".to_string());
        let (status, _json) = payment_error_to_response(err);
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let err = PaymentError::Conflict("email".to_string());
        let (status, _json) = payment_error_to_response(err);
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[test]
    fn test_endpoint_error_keeps_faults() {
        let provider = PaymentError::ProviderError {
            provider: "wompi".to_string(),
            message: "declined".to_string(),
        };
        let (status, _) = endpoint_error(provider, StatusCode::NOT_FOUND);
        assert_eq!(status, StatusCode::NOT_FOUND);

        let fault = PaymentError::AcceptanceTokenUnavailable {
            provider: "wompi".to_string(),
        };
        let (status, _) = endpoint_error(fault, StatusCode::NOT_FOUND);
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

        let invalid = PaymentError::InvalidRequest("address is required".to_string());
        let (status, _) = endpoint_error(invalid, StatusCode::NOT_FOUND);
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_parse_date() {
        let date = parse_date("2024-03-01").unwrap();
        assert_eq!(date.to_rfc3339(), "2024-03-01T00:00:00+00:00");

        let ts = parse_date("2024-03-01T10:30:00-05:00").unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-01T15:30:00+00:00");

        assert!(parse_date("yesterday").is_none());
        assert!(parse_date("2024-13-01").is_none());
    }
}
