use std::collections::HashMap;
use std::net::SocketAddr;

use axum::extract::Request;
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use thinkstrip::config::Config;
use thinkstrip::proxy::{app, ProxyState};
use tokio::net::TcpListener;

/// Everything the echo upstream observed about one request
#[derive(Debug, Deserialize)]
pub struct Observed {
    pub method: String,
    pub path: String,
    pub query: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: String,
}

/// Serve a router on an ephemeral port and return its address
pub async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Upstream that reports back everything it received as JSON
pub async fn spawn_echo_upstream() -> SocketAddr {
    async fn echo(req: Request) -> Json<serde_json::Value> {
        let (parts, body) = req.into_parts();
        let body = axum::body::to_bytes(body, usize::MAX).await.unwrap();
        let headers: HashMap<String, String> = parts
            .headers
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).to_string(),
                )
            })
            .collect();

        Json(json!({
            "method": parts.method.as_str(),
            "path": parts.uri.path(),
            "query": parts.uri.query(),
            "headers": headers,
            "body": String::from_utf8_lossy(&body),
        }))
    }

    serve(Router::new().fallback(echo)).await
}

/// Start the proxy pointed at the given upstream, on an ephemeral port
pub async fn spawn_proxy(upstream_url: &str) -> SocketAddr {
    let config = Config {
        upstream_url: upstream_url.to_string(),
        ..Config::default()
    };
    let state = ProxyState::from_config(&config).unwrap();
    serve(app(state)).await
}
