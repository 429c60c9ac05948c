//! # Application State
//!
//! Shared state for the Axum application.
//! Holds the configuration and the services built over one store and one
//! payment gateway.

use pay_core::{
    CheckoutSettings, CustomerRegistry, ProductInventory, SharedGateway, SharedStore,
    TransactionOrchestrator, WebhookIngestor,
};
use pay_store::SqliteStore;
use pay_wompi::{WompiConfig, WompiGateway};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// Environment (development, staging, production)
    pub environment: String,
    /// sqlx connection string
    pub database_url: String,
    /// Origins allowed by CORS, comma separated
    pub cors_allowed_origin: String,
    /// Optional TOML product seed
    pub seed_file: Option<PathBuf>,
}

impl AppConfig {
    /// Load from environment variables
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            host: std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(4567),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            database_url: std::env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://storefront.db".to_string()),
            cors_allowed_origin: std::env::var("CORS_ALLOWED_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            seed_file: std::env::var("SEED_FILE")
                .ok()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        }
    }

    /// Get the socket address to bind to
    pub fn socket_addr(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| anyhow::anyhow!("Invalid socket address {}:{}: {}", self.host, self.port, e))
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4567,
            environment: "development".to_string(),
            database_url: "sqlite::memory:".to_string(),
            cors_allowed_origin: "http://localhost:5173".to_string(),
            seed_file: None,
        }
    }
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Product reads, updates and stock
    pub inventory: ProductInventory,
    /// Transaction lifecycle against the gateway
    pub orchestrator: TransactionOrchestrator,
    /// Gateway status notifications
    pub webhooks: WebhookIngestor,
    pub customers: CustomerRegistry,
    /// Application config
    pub config: AppConfig,
}

impl AppState {
    /// Build the state from the environment: Wompi gateway, SQLite store
    /// (migrated) and the optional product seed.
    pub async fn new() -> anyhow::Result<Self> {
        let config = AppConfig::from_env();

        let wompi_config = WompiConfig::from_env()
            .map_err(|e| anyhow::anyhow!("Failed to load Wompi configuration: {}", e))?;
        let settings = CheckoutSettings::new(wompi_config.integrity_secret.clone());
        let gateway = WompiGateway::new(wompi_config)
            .map_err(|e| anyhow::anyhow!("Failed to initialize Wompi: {}", e))?;

        let store = SqliteStore::connect(&config.database_url)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to open {}: {}", config.database_url, e))?;
        store
            .migrate()
            .await
            .map_err(|e| anyhow::anyhow!("{}", e))?;

        let state = Self::from_parts(
            config,
            Arc::new(gateway) as SharedGateway,
            Arc::new(store) as SharedStore,
            settings,
        );

        if let Some(path) = &state.config.seed_file {
            let inserted = pay_store::seed_from_file(&state.inventory, path)
                .await
                .map_err(|e| anyhow::anyhow!("{}", e))?;
            info!("Seed file {} inserted {} products", path.display(), inserted);
        }

        Ok(state)
    }

    /// Assemble the state from already-built collaborators
    pub fn from_parts(
        config: AppConfig,
        gateway: SharedGateway,
        store: SharedStore,
        settings: CheckoutSettings,
    ) -> Self {
        Self {
            inventory: ProductInventory::new(store.clone()),
            orchestrator: TransactionOrchestrator::new(gateway, store.clone(), settings),
            webhooks: WebhookIngestor::new(store.clone()),
            customers: CustomerRegistry::new(store),
            config,
        }
    }

    /// Name of the configured payment provider
    pub fn provider(&self) -> &'static str {
        self.orchestrator.provider_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_config_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 4567);
        assert_eq!(config.cors_allowed_origin, "http://localhost:5173");
        assert!(config.seed_file.is_none());
        assert!(!config.is_production());
    }

    #[test]
    fn test_socket_addr() {
        let config = AppConfig {
            host: "0.0.0.0".to_string(),
            port: 3000,
            ..Default::default()
        };

        let addr = config.socket_addr().unwrap();
        assert_eq!(addr.to_string(), "0.0.0.0:3000");
    }

    #[test]
    fn test_invalid_socket_addr() {
        let config = AppConfig {
            host: "not a host".to_string(),
            ..Default::default()
        };
        assert!(config.socket_addr().is_err());
    }
}
