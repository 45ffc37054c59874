mod routes;

use std::net::SocketAddr;
use std::path::Path;

use anyhow::{Context, Result};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::CorsLayer;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Config;
use crate::query::QueryService;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub queries: QueryService,
}

/// Start the web server and serve until the listener fails.
///
/// # Errors
///
/// Returns an error if the address is invalid or the server fails to start.
pub async fn serve(config: &Config, state: AppState) -> Result<()> {
    let addr: SocketAddr = format!("{}:{}", config.web_host, config.web_port)
        .parse()
        .context("Invalid web server address")?;

    let app = create_app(state, config.static_dir.as_deref());

    info!(addr = %addr, "Starting HTTP web server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .context("Failed to bind web server")?;

    axum::serve(listener, app)
        .await
        .context("Web server error")?;

    Ok(())
}

/// Create the main application router.
///
/// With a `static_dir`, unknown non-API paths serve the frontend bundle and
/// fall back to its `index.html` for client-side routing.
pub fn create_app(state: AppState, static_dir: Option<&Path>) -> Router {
    let mut router = Router::new().merge(routes::router());

    if let Some(dir) = static_dir {
        info!(static_dir = %dir.display(), "Serving frontend bundle");
        let spa = ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")));
        router = router.fallback_service(spa);
    }

    router
        .layer(CorsLayer::permissive())
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
