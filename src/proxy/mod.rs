// Proxy module - HTTP server that forwards requests to LiteLLM
//
// A transparent forwarding proxy built on Axum: every inbound request is
// read, thinking params are stripped from JSON bodies, and the result is
// forwarded to the single configured upstream with reqwest. Responses come
// back verbatim; connection failures map to synthesized 5xx responses.

mod error;
mod handler;
mod server;
mod state;

pub use server::{app, start_proxy};
pub use state::ProxyState;
