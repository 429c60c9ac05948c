//! # Error Types
//!
//! Typed error handling for the storefront payment backend.
//! All service operations return `Result<T, PaymentError>`.

use thiserror::Error;

/// Core error type for all storefront operations
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Configuration errors (missing keys, invalid config)
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Missing or invalid request fields
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Product not found
    #[error("Product not found: {product_id}")]
    ProductNotFound { product_id: i64 },

    /// Local transaction record not found
    #[error("Transaction not found: {transaction_id}")]
    TransactionNotFound { transaction_id: String },

    /// Price cannot be turned into a valid amount
    #[error("Invalid price: {message}")]
    InvalidPrice { message: String },

    /// Stock decrement would leave a negative stock
    #[error("stock cannot be negative (product {product_id}: requested {requested})")]
    InsufficientStock { product_id: i64, requested: i64 },

    /// Payment gateway reported a failure
    #[error("Provider error [{provider}]: {message}")]
    ProviderError { provider: String, message: String },

    /// Gateway did not hand out an acceptance token
    #[error("Unable to obtain an acceptance token from {provider}")]
    AcceptanceTokenUnavailable { provider: String },

    /// Network/HTTP error communicating with the gateway
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Webhook event type we do not handle
    #[error("Unsupported event: {event}")]
    UnsupportedEvent { event: String },

    /// Uniqueness or reference constraint violated
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Datastore failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal error (should not happen)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl PaymentError {
    /// Returns true if this error aborts the request as an unrecoverable fault
    /// rather than being reported as a structured business error.
    pub fn is_fault(&self) -> bool {
        matches!(
            self,
            PaymentError::Configuration(_)
                | PaymentError::AcceptanceTokenUnavailable { .. }
                | PaymentError::NetworkError(_)
                | PaymentError::Storage(_)
                | PaymentError::Internal(_)
                | PaymentError::Serialization(_)
        )
    }

    /// Returns true for the "entity absent" family
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            PaymentError::ProductNotFound { .. } | PaymentError::TransactionNotFound { .. }
        )
    }

    /// Returns the HTTP status code appropriate for this error
    pub fn status_code(&self) -> u16 {
        match self {
            PaymentError::Configuration(_) => 500,
            PaymentError::InvalidRequest(_) => 400,
            PaymentError::ProductNotFound { .. } => 404,
            PaymentError::TransactionNotFound { .. } => 404,
            PaymentError::InvalidPrice { .. } => 400,
            PaymentError::InsufficientStock { .. } => 400,
            PaymentError::ProviderError { .. } => 502,
            PaymentError::AcceptanceTokenUnavailable { .. } => 500,
            PaymentError::NetworkError(_) => 503,
            PaymentError::UnsupportedEvent { .. } => 400,
            PaymentError::Conflict(_) => 409,
            PaymentError::Storage(_) => 500,
            PaymentError::Internal(_) => 500,
            PaymentError::Serialization(_) => 500,
        }
    }
}

/// Result type alias for storefront operations
pub type PaymentResult<T> = Result<T, PaymentError>;
