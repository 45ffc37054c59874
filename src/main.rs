use anyhow::{Context, Result};
use tracing::{error, info};

use forum_digest::config::Config;
use forum_digest::logging::init_tracing;
use forum_digest::query::QueryService;
use forum_digest::web::{self, AppState};
use forum_digest::{ingest, Services};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    init_tracing()?;

    info!("Starting forum-digest server");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    info!(
        forum = %config.forum_base_url,
        model = %config.llm_model,
        poll_interval_secs = config.poll_interval.as_secs(),
        "Configuration loaded"
    );

    let services = Services::connect(&config).await?;
    info!("Database initialized");

    // Ingestion errors are logged inside the loop; the server keeps serving.
    let poll_handle = tokio::spawn(ingest::poll_loop(
        services.ingestor.clone(),
        config.poll_interval,
    ));

    let state = AppState {
        queries: QueryService::new(services.db.clone(), services.summarizer.clone()),
    };
    let web_config = config.clone();
    let web_handle = tokio::spawn(async move {
        if let Err(e) = web::serve(&web_config, state).await {
            error!("Web server error: {e:#}");
        }
    });

    shutdown_signal().await;

    info!("Shutting down...");

    web_handle.abort();
    poll_handle.abort();
    services.db.close().await;

    info!("Shutdown complete");

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
