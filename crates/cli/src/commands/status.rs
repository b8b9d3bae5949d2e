//! The `status` command: credential expiry and watermark state.
//!
//! Reads the config document only; no network or database access.

use std::path::Path;

use chrono::Utc;
use orderdeck_engine::CredentialStore;

/// Report each platform's credential and watermark state.
///
/// # Errors
///
/// Returns an error if the config document cannot be read.
pub fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let creds = CredentialStore::load(config_path)?;
    let now = Utc::now();

    let ebay = &creds.ebay().credential;
    tracing::info!(
        platform = "ebay",
        expires_at = %ebay.expires_at,
        expired = ebay.is_expired(now),
        "credential"
    );

    let amazon = &creds.amazon().credential;
    tracing::info!(
        platform = "amazon",
        expires_at = %amazon.expires_at,
        expired = amazon.is_expired(now),
        "credential"
    );
    tracing::info!(
        platform = "amazon",
        get_orders_after = %creds.orders_after(),
        "watermark"
    );

    tracing::info!(platform = "wc", "consumer-key auth, no token lifecycle");
    Ok(())
}
