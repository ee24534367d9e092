//! Proxy error types, failure classification, and response handling

use std::io;

use axum::{
    body::Body,
    http::{Response, StatusCode},
    response::IntoResponse,
};

/// Errors that can occur during proxying
///
/// Every variant maps to exactly one synthesized response and one log line;
/// upstream-facing variants carry the target URL so the log names what failed.
#[derive(Debug)]
pub(crate) enum ProxyError {
    /// Reading the inbound request body failed
    BodyRead(String),
    /// DNS, routing, or timeout failure before/while reaching the upstream
    Unreachable { target: String, reason: String },
    /// Connection actively refused by the upstream
    Refused { target: String },
    /// Connection reset or pipe broken mid-transfer
    Interrupted { target: String, detail: String },
    /// Any other network/I-O failure
    Network { target: String, detail: String },
    /// Unanticipated failure; only the category name leaves the process
    Internal { target: String, category: String },
    /// Assembling the relayed response failed
    ResponseBuild(String),
}

/// Classify a failed outbound call into the response the caller gets.
///
/// Checked in priority order: an io error kind in the source chain wins
/// (refused, then reset/broken pipe), then timeout and connect-phase failures,
/// then any other transport error. Only errors with no network character at
/// all fall through to the internal bucket.
pub(crate) fn classify_forward_error(err: reqwest::Error, target: &str) -> ProxyError {
    let target = target.to_string();
    match io_error_kind(&err) {
        Some(io::ErrorKind::ConnectionRefused) => ProxyError::Refused { target },
        Some(io::ErrorKind::ConnectionReset) | Some(io::ErrorKind::BrokenPipe) => {
            ProxyError::Interrupted {
                target,
                detail: root_cause(&err),
            }
        }
        kind => {
            if err.is_timeout() {
                ProxyError::Unreachable {
                    target,
                    reason: "request timed out".to_string(),
                }
            } else if err.is_connect() {
                // DNS failures and unroutable addresses land here; the io
                // source (when present) carries the useful message.
                ProxyError::Unreachable {
                    target,
                    reason: root_cause(&err),
                }
            } else if kind.is_some() || err.is_request() || err.is_body() || err.is_decode() {
                ProxyError::Network {
                    target,
                    detail: root_cause(&err),
                }
            } else {
                ProxyError::Internal {
                    target,
                    category: error_category(&err).to_string(),
                }
            }
        }
    }
}

/// Find the first `io::Error` in the error's source chain
fn io_error_kind(err: &reqwest::Error) -> Option<io::ErrorKind> {
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            return Some(io_err.kind());
        }
        source = cause.source();
    }
    None
}

/// Innermost error message; reqwest's Display only names the phase
fn root_cause(err: &reqwest::Error) -> String {
    let mut cause: &(dyn std::error::Error + 'static) = err;
    while let Some(next) = cause.source() {
        cause = next;
    }
    cause.to_string()
}

/// Coarse category name for unanticipated failures (never the raw message)
fn error_category(err: &reqwest::Error) -> &'static str {
    if err.is_builder() {
        "builder"
    } else if err.is_redirect() {
        "redirect"
    } else {
        "request"
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response<Body> {
        let (status, message) = match &self {
            ProxyError::BodyRead(msg) => {
                tracing::error!("Failed to read request body: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            ProxyError::Unreachable { target, reason } => {
                tracing::error!("Connection error to {}: {}", target, reason);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    format!("Service unavailable: {reason}"),
                )
            }
            ProxyError::Refused { target } => {
                tracing::error!("Connection refused by upstream at {}", target);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Upstream service is not available".to_string(),
                )
            }
            ProxyError::Interrupted { target, detail } => {
                tracing::error!("Connection reset while proxying to {}: {}", target, detail);
                (StatusCode::BAD_GATEWAY, "Connection interrupted".to_string())
            }
            ProxyError::Network { target, detail } => {
                tracing::error!("Network error proxying to {}: {}", target, detail);
                (StatusCode::BAD_GATEWAY, format!("Network error: {detail}"))
            }
            ProxyError::Internal { target, category } => {
                tracing::error!("Unexpected error proxying to {}: {}", target, category);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Internal proxy error: {category}"),
                )
            }
            ProxyError::ResponseBuild(msg) => {
                tracing::error!("Failed to build relayed response: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal proxy error: response build".to_string(),
                )
            }
        };

        Response::builder()
            .status(status)
            .body(Body::from(message))
            .unwrap_or_else(|_| Response::new(Body::from("Internal error building error response")))
    }
}
