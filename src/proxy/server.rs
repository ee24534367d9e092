//! Proxy server setup and initialization

use anyhow::{Context, Result};
use axum::{routing::any, Router};
use tokio::net::TcpListener;

use crate::config::Config;

use super::handler::proxy_handler;
use super::state::ProxyState;

/// Build the proxy router: every path and method lands in the forwarding
/// handler. The root route is separate because `/*path` requires at least
/// one segment.
pub fn app(state: ProxyState) -> Router {
    Router::new()
        .route("/", any(proxy_handler))
        .route("/*path", any(proxy_handler))
        .with_state(state)
}

/// Start the proxy server
pub async fn start_proxy(
    config: Config,
    shutdown_rx: tokio::sync::oneshot::Receiver<()>,
) -> Result<()> {
    let state = ProxyState::from_config(&config)?;
    let app = app(state);

    let listener = TcpListener::bind(config.bind_addr)
        .await
        .context("Failed to bind to address")?;

    tracing::info!(
        "Listening on {}, forwarding to {}",
        config.bind_addr,
        config.upstream_url
    );
    tracing::info!("Stripping thinking params from request bodies");

    // Serve until the shutdown signal arrives, then drain in-flight requests
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            shutdown_rx.await.ok();
        })
        .await
        .context("Server error")?;

    tracing::info!("Proxy server shut down gracefully");
    Ok(())
}
