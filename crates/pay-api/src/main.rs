//! # Storefront
//!
//! Product catalog and payment backend over the Wompi gateway.
//!
//! ## Usage
//!
//! ```bash
//! # Set environment variables
//! export WOMPI_PUBLIC_KEY=pub_test_...
//! export WOMPI_PRIVATE_KEY=prv_test_...
//! export WOMPI_INTEGRITY_SECRET=test_integrity_...
//! export SEED_FILE=config/products.toml
//!
//! # Run the server
//! storefront
//! ```

use pay_api::{routes, state::AppState};
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    // Print banner
    print_banner();

    // Initialize application state
    let state = AppState::new().await?;

    let addr = state.config.socket_addr()?;
    let is_prod = state.config.is_production();

    info!("Environment: {}", state.config.environment);
    info!("Database: {}", state.config.database_url);
    info!("Payment provider: {}", state.provider());

    // Create router
    let app = routes::create_router(state);

    // Start server
    info!("Storefront starting on http://{}", addr);

    if !is_prod {
        info!("Health: http://{}/health", addr);
        info!("Products: GET http://{}/products", addr);
        info!("Webhook: POST http://{}/webhook/notifications", addr);
    }

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// `RUST_LOG` filters, `LOG_FORMAT=json` switches to JSON lines
fn init_tracing() {
    let filter = EnvFilter::builder()
        .with_default_directive(Level::INFO.into())
        .from_env_lossy();

    let json = std::env::var("LOG_FORMAT")
        .map(|f| f.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }
}

fn print_banner() {
    println!(
        r#"
  Storefront
  ━━━━━━━━━━━━━━━━━━━━━━━
  Catalog and payments over Wompi
  Version: {}

"#,
        env!("CARGO_PKG_VERSION")
    );
}
