use anyhow::{Context, Result};
use thinkstrip::cli;
use thinkstrip::config::Config;
use thinkstrip::proxy;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Handle CLI commands first (config --show, --path, --reset)
    // If a command was handled, exit early
    if cli::handle_cli() {
        return Ok(());
    }

    // Ensure config template exists (helps users discover options)
    Config::ensure_config_exists();

    let config = Config::from_env();

    // Precedence: RUST_LOG env var > config file > default "info"
    let default_filter = format!("thinkstrip={},axum=info", config.logging.level);
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Oneshot shutdown channel: Ctrl+C fires it, serve() drains and exits
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel();

    let mut proxy_handle = tokio::spawn(proxy::start_proxy(config, shutdown_rx));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Shutting down...");
            let _ = shutdown_tx.send(());
            let _ = proxy_handle.await;
            tracing::info!("Shutdown complete");
        }
        // Server exited on its own (e.g. failed to bind) - surface the error
        result = &mut proxy_handle => {
            result.context("Proxy task panicked")??;
        }
    }

    Ok(())
}
