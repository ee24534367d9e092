//! Proxy state shared across requests

use anyhow::{Context, Result};

use crate::config::Config;

/// Shared state for the proxy server
///
/// The only value shared between requests; read-only after startup, so
/// concurrent requests need no coordination.
#[derive(Clone)]
pub struct ProxyState {
    /// HTTP client for forwarding requests
    pub(super) client: reqwest::Client,
    /// Upstream base URL requests are forwarded to
    pub(super) upstream_url: String,
}

impl ProxyState {
    /// Build the forwarding client from config
    pub fn from_config(config: &Config) -> Result<Self> {
        // Bounded timeout so a wedged upstream cannot pin a request forever;
        // a hit surfaces to the caller as a 503
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.request_timeout_secs))
            .pool_max_idle_per_host(10)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            upstream_url: config.upstream_url.clone(),
        })
    }
}
