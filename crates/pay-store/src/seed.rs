//! Demo product seeding from a TOML file.

use pay_core::{PaymentError, PaymentResult, ProductInventory, ProductSeed};
use std::path::Path;
use tracing::info;

/// Read and validate a seed file
pub async fn load_seed_file(path: impl AsRef<Path>) -> PaymentResult<ProductSeed> {
    let path = path.as_ref();
    let contents = tokio::fs::read_to_string(path).await.map_err(|e| {
        PaymentError::Configuration(format!("cannot read seed file {}: {}", path.display(), e))
    })?;

    let seed = ProductSeed::from_toml(&contents).map_err(|e| {
        PaymentError::Configuration(format!("invalid seed file {}: {}", path.display(), e))
    })?;
    seed.validate()?;
    Ok(seed)
}

/// Seed `inventory` from `path` when the catalog is empty.
///
/// Returns how many products were inserted.
pub async fn seed_from_file(
    inventory: &ProductInventory,
    path: impl AsRef<Path>,
) -> PaymentResult<usize> {
    let path = path.as_ref();
    let seed = load_seed_file(path).await?;
    let inserted = inventory.seed(&seed).await?;
    if inserted > 0 {
        info!("Seeded {} products from {}", inserted, path.display());
    }
    Ok(inserted)
}
