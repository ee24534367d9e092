// thinkstrip - forwarding proxy that strips Anthropic thinking params
//
// Anthropic clients send thinking-related fields (thinking, budget_tokens,
// ...) that LiteLLM forwards as-is, and local Ollama models reject them.
// This proxy sits in front of LiteLLM, removes those fields from JSON
// request bodies, and relays everything else untouched.
//
// Architecture:
// - Proxy server (axum): catch-all route, one task per request
// - Forwarding (reqwest): single upstream, single attempt, no retries
// - Stripper: recursive removal of thinking keys from decoded JSON trees,
//   plus the shallow variant used by a LiteLLM pre-call hook
// - Config: env vars (LITELLM_URL, PROXY_PORT) over a TOML file over defaults

pub mod cli;
pub mod config;
pub mod proxy;
pub mod strip;
