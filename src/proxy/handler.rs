//! Main proxy handler - forwards requests to the upstream

use axum::{
    body::Body,
    extract::State,
    http::{header, HeaderMap, Method, Request, Response, Uri},
};
use bytes::Bytes;

use crate::strip::strip_thinking_params;

use super::error::{classify_forward_error, ProxyError};
use super::state::ProxyState;

/// Inbound headers never forwarded upstream (hop-by-hop semantics)
const SKIP_REQUEST_HEADERS: [&str; 4] = ["host", "connection", "keep-alive", "transfer-encoding"];

/// Upstream response headers never relayed back to the caller
const SKIP_RESPONSE_HEADERS: [&str; 2] = ["transfer-encoding", "connection"];

/// Forward one inbound request to the upstream and relay the result.
///
/// JSON bodies on body-bearing verbs get thinking params stripped first;
/// everything else passes through byte-for-byte. Upstream HTTP errors are
/// relayed verbatim; connection failures map to synthesized 5xx responses.
pub(super) async fn proxy_handler(
    State(state): State<ProxyState>,
    req: Request<Body>,
) -> Result<Response<Body>, ProxyError> {
    let method = req.method().clone();
    let uri = req.uri().clone();
    let headers = req.headers().clone();

    tracing::debug!("Proxying {} {}", method, uri);

    let forward_url = build_forward_url(&state.upstream_url, &uri);

    let body_bytes = axum::body::to_bytes(req.into_body(), usize::MAX)
        .await
        .map_err(|e| ProxyError::BodyRead(e.to_string()))?;

    // Strip thinking params from JSON bodies. Non-JSON is forwarded untouched
    // (only the upstream gets to reject it), and bodies that needed no change
    // keep their original bytes so formatting never drifts through
    // re-serialization.
    let (body_bytes, modified) = if method_may_carry_json(&method) && !body_bytes.is_empty() {
        match serde_json::from_slice::<serde_json::Value>(&body_bytes) {
            Ok(mut tree) => {
                if strip_thinking_params(&mut tree) {
                    tracing::info!("Stripped thinking params from request to {}", uri.path());
                    let encoded = serde_json::to_vec(&tree).map_err(|_| ProxyError::Internal {
                        target: forward_url.clone(),
                        category: "re-encode".to_string(),
                    })?;
                    (Bytes::from(encoded), true)
                } else {
                    (body_bytes, false)
                }
            }
            Err(_) => (body_bytes, false),
        }
    } else {
        (body_bytes, false)
    };

    // Convert the method through its byte form; axum and reqwest agree on the
    // http crate today but this keeps us off any future version split.
    let forward_method = reqwest::Method::from_bytes(method.as_str().as_bytes()).map_err(|_| {
        ProxyError::Internal {
            target: forward_url.clone(),
            category: "invalid method".to_string(),
        }
    })?;

    let mut forward_req = state
        .client
        .request(forward_method, &forward_url)
        .headers(outbound_headers(&headers, modified))
        .body(body_bytes.to_vec());

    if modified {
        forward_req = forward_req.header(header::CONTENT_LENGTH, body_bytes.len());
    }

    // Single forwarding attempt - there is exactly one upstream and no retry
    let response = forward_req
        .send()
        .await
        .map_err(|e| classify_forward_error(e, &forward_url))?;

    let status = response.status();
    let response_headers = response.headers().clone();
    let response_body = response
        .bytes()
        .await
        .map_err(|e| classify_forward_error(e, &forward_url))?;

    // Relay the upstream response verbatim, whatever its status
    let mut builder = Response::builder().status(status.as_u16());
    for (key, value) in relay_headers(&response_headers).iter() {
        builder = builder.header(key, value);
    }

    builder
        .body(Body::from(response_body))
        .map_err(|e| ProxyError::ResponseBuild(e.to_string()))
}

/// Stripping applies to verbs that may carry a JSON body
fn method_may_carry_json(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// Upstream base + inbound path verbatim, original query appended untouched
fn build_forward_url(upstream: &str, uri: &Uri) -> String {
    let url = format!("{}{}", upstream, uri.path());
    match uri.query() {
        Some(query) => format!("{url}?{query}"),
        None => url,
    }
}

/// Build the outbound header map: everything inbound minus the hop-by-hop
/// set, and minus content-length when the body was rewritten (the new length
/// is set explicitly by the caller). Duplicate values survive in order.
fn outbound_headers(inbound: &HeaderMap, body_modified: bool) -> HeaderMap {
    let mut outbound = HeaderMap::new();
    for (key, value) in inbound {
        // HeaderName is already lowercase, so this match is case-insensitive
        if SKIP_REQUEST_HEADERS.contains(&key.as_str()) {
            continue;
        }
        if body_modified && key == header::CONTENT_LENGTH {
            continue;
        }
        outbound.append(key.clone(), value.clone());
    }
    outbound
}

/// Upstream response headers minus the connection-scoped ones
fn relay_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut relayed = HeaderMap::new();
    for (key, value) in upstream {
        if SKIP_RESPONSE_HEADERS.contains(&key.as_str()) {
            continue;
        }
        relayed.append(key.clone(), value.clone());
    }
    relayed
}
