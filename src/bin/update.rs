//! One-shot ingestion run for external schedulers (cron, CI).
//!
//! Exits with status 0 when the run completes and 1 when it fails.

use anyhow::{Context, Result};
use tracing::{error, info};

use forum_digest::config::Config;
use forum_digest::logging::init_tracing;
use forum_digest::Services;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Update failed: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let _ = dotenvy::dotenv();

    init_tracing()?;

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let services = Services::connect(&config).await?;

    let result = services.ingestor.run().await;
    services.db.close().await;

    let report = result.context("Ingestion run failed")?;
    info!(
        listing = ?report.listing,
        new_posts = report.new_posts,
        skipped = report.skipped,
        daily = ?report.daily,
        "Update completed successfully"
    );

    Ok(())
}
