//! The `sync` command: one batch run across all platforms.

use std::path::Path;
use std::time::Duration;

use orderdeck_engine::{CredentialStore, PgOrderStore, SyncOrchestrator};

/// Load the config document, connect the store, and run one sync.
///
/// # Errors
///
/// Returns an error if the config document or database is unreachable, or
/// if the run's final insertion fails. Per-platform fetch failures are
/// reported, not returned.
pub async fn run(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let mut creds = CredentialStore::load(config_path)?;
    let store = PgOrderStore::connect(creds.database_url()).await?;
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(30))
        .build()?;

    let orchestrator = SyncOrchestrator::new(http, store);
    let report = orchestrator.run(&mut creds).await?;

    for platform in &report.platforms {
        match &platform.error {
            Some(error) => tracing::warn!(
                platform = %platform.platform,
                phase = %platform.phase,
                %error,
                "platform skipped"
            ),
            None => tracing::info!(
                platform = %platform.platform,
                fetched = platform.fetched,
                "platform ok"
            ),
        }
    }
    tracing::info!(
        orders = report.orders_inserted,
        line_items = report.line_items_inserted,
        "sync run complete"
    );
    Ok(())
}
