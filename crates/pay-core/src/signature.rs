//! # Integrity Signature
//!
//! The gateway authenticates transaction submissions with a SHA-256 digest
//! over the concatenation
//!
//! ```text
//! reference ++ amount_in_cents ++ currency [++ expiration_time] ++ integrity_secret
//! ```
//!
//! with no separators, hex-encoded in lowercase. The gateway recomputes the
//! same digest and rejects the transaction on any mismatch, so field order
//! and formatting here must not change.

use sha2::{Digest, Sha256};

/// Compute the integrity signature for a transaction submission.
///
/// `expiration_time` only takes part when it is present and non-empty.
pub fn integrity_signature(
    reference: &str,
    amount_in_cents: i64,
    currency: &str,
    integrity_secret: &str,
    expiration_time: Option<&str>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(reference.as_bytes());
    hasher.update(amount_in_cents.to_string().as_bytes());
    hasher.update(currency.as_bytes());
    if let Some(expiration) = expiration_time.filter(|e| !e.is_empty()) {
        hasher.update(expiration.as_bytes());
    }
    hasher.update(integrity_secret.as_bytes());
    hex::encode(hasher.finalize())
}
