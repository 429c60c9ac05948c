//! # Wompi Configuration
//!
//! Configuration management for the Wompi integration.
//! All secrets are loaded from environment variables.

use pay_core::PaymentError;
use std::env;

/// Sandbox API used unless `WOMPI_API_URL` says otherwise
pub const SANDBOX_API_URL: &str = "https://sandbox.wompi.co/v1";

/// Production API
pub const PRODUCTION_API_URL: &str = "https://production.wompi.co/v1";

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Wompi API configuration
#[derive(Clone)]
pub struct WompiConfig {
    /// Public key (pub_test_... or pub_prod_...), used for reads
    pub public_key: String,

    /// Private key (prv_test_... or prv_prod_...), used for transaction writes
    pub private_key: String,

    /// Integrity secret used to sign transactions
    pub integrity_secret: String,

    /// API base URL (for testing/mocking)
    pub api_base_url: String,

    /// Per-request timeout
    pub timeout_secs: u64,
}

impl WompiConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `WOMPI_PUBLIC_KEY`
    /// - `WOMPI_PRIVATE_KEY`
    /// - `WOMPI_INTEGRITY_SECRET`
    ///
    /// Optional: `WOMPI_API_URL`, `WOMPI_TIMEOUT_SECS`
    pub fn from_env() -> Result<Self, PaymentError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let public_key = env::var("WOMPI_PUBLIC_KEY")
            .map_err(|_| PaymentError::Configuration("WOMPI_PUBLIC_KEY not set".to_string()))?;

        let private_key = env::var("WOMPI_PRIVATE_KEY")
            .map_err(|_| PaymentError::Configuration("WOMPI_PRIVATE_KEY not set".to_string()))?;

        let integrity_secret = env::var("WOMPI_INTEGRITY_SECRET").map_err(|_| {
            PaymentError::Configuration("WOMPI_INTEGRITY_SECRET not set".to_string())
        })?;

        let timeout_secs = match env::var("WOMPI_TIMEOUT_SECS") {
            Ok(raw) => raw.parse().map_err(|_| {
                PaymentError::Configuration(format!("WOMPI_TIMEOUT_SECS is not a number: {}", raw))
            })?,
            Err(_) => DEFAULT_TIMEOUT_SECS,
        };

        let config = Self {
            public_key,
            private_key,
            integrity_secret,
            api_base_url: env::var("WOMPI_API_URL")
                .map(|url| url.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| SANDBOX_API_URL.to_string()),
            timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    /// Create config with explicit values (for testing)
    pub fn new(
        public_key: impl Into<String>,
        private_key: impl Into<String>,
        integrity_secret: impl Into<String>,
    ) -> Self {
        Self {
            public_key: public_key.into(),
            private_key: private_key.into(),
            integrity_secret: integrity_secret.into(),
            api_base_url: SANDBOX_API_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    /// Validate key formats
    pub fn validate(&self) -> Result<(), PaymentError> {
        if !self.public_key.starts_with("pub_test_") && !self.public_key.starts_with("pub_prod_") {
            return Err(PaymentError::Configuration(
                "WOMPI_PUBLIC_KEY must start with pub_test_ or pub_prod_".to_string(),
            ));
        }

        if !self.private_key.starts_with("prv_test_") && !self.private_key.starts_with("prv_prod_")
        {
            return Err(PaymentError::Configuration(
                "WOMPI_PRIVATE_KEY must start with prv_test_ or prv_prod_".to_string(),
            ));
        }

        if self.integrity_secret.is_empty() {
            return Err(PaymentError::Configuration(
                "WOMPI_INTEGRITY_SECRET must not be empty".to_string(),
            ));
        }

        if self.timeout_secs == 0 {
            return Err(PaymentError::Configuration(
                "WOMPI_TIMEOUT_SECS must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }

    /// Check if using sandbox keys
    pub fn is_sandbox(&self) -> bool {
        self.public_key.starts_with("pub_test_")
    }

    /// Authorization header for reads
    pub fn public_auth_header(&self) -> String {
        format!("Bearer {}", self.public_key)
    }

    /// Authorization header for transaction submissions
    pub fn private_auth_header(&self) -> String {
        format!("Bearer {}", self.private_key)
    }

    /// Builder: set custom API base URL (for testing)
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Builder: set request timeout
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl std::fmt::Debug for WompiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WompiConfig")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .field("integrity_secret", &"<redacted>")
            .field("api_base_url", &self.api_base_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}
