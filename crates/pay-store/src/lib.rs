//! # pay-store
//!
//! SQLite persistence for the storefront backend.
//!
//! `SqliteStore` implements every `pay-core` storage port on top of an
//! `sqlx` pool. Schema lives in `migrations/` and is embedded at build time.
//!
//! ```rust,ignore
//! let store = SqliteStore::connect("sqlite://storefront.db").await?;
//! store.migrate().await?;
//! let shared: SharedStore = Arc::new(store);
//! ```

mod rows;
pub mod seed;
pub mod sqlite;

pub use seed::{load_seed_file, seed_from_file};
pub use sqlite::SqliteStore;
