// Configuration for the proxy server
//
// Configuration is loaded in order of precedence:
// 1. Environment variables (highest priority)
// 2. Config file (~/.config/thinkstrip/config.toml)
// 3. Built-in defaults (lowest priority)

use serde::Deserialize;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Version info
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// Application configuration
///
/// Constructed once at startup and passed explicitly to the proxy; nothing
/// mutates it afterwards.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the proxy server to
    pub bind_addr: SocketAddr,

    /// LiteLLM base URL requests are forwarded to
    pub upstream_url: String,

    /// Upper bound on one outbound call (connect + write + full read)
    pub request_timeout_secs: u64,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Logging settings as loaded from config file
#[derive(Debug, Deserialize, Default)]
struct FileLogging {
    level: Option<String>,
}

/// Config file structure (subset of Config that makes sense to persist)
#[derive(Debug, Deserialize, Default)]
struct FileConfig {
    bind_addr: Option<String>,
    upstream_url: Option<String>,
    request_timeout_secs: Option<u64>,

    /// Optional [logging] section
    logging: Option<FileLogging>,
}

impl Config {
    /// Get the config file path: ~/.config/thinkstrip/config.toml
    /// Uses Unix-style ~/.config on all platforms for consistency
    pub fn config_path() -> Option<PathBuf> {
        dirs::home_dir().map(|p| p.join(".config").join("thinkstrip").join("config.toml"))
    }

    /// Create config template if it doesn't exist
    /// Called during startup to help users discover configuration options
    pub fn ensure_config_exists() {
        let Some(path) = Self::config_path() else {
            return;
        };

        // Don't overwrite existing config
        if path.exists() {
            return;
        }

        // Create parent directory
        if let Some(parent) = path.parent() {
            if std::fs::create_dir_all(parent).is_err() {
                return; // Silently fail - config is optional
            }
        }

        let template = r#"# thinkstrip configuration
# Uncomment and modify options as needed
# Environment variables (PROXY_PORT, LITELLM_URL, RUST_LOG) take precedence

# Proxy bind address (default: 0.0.0.0:4001; PROXY_PORT overrides the port)
# bind_addr = "0.0.0.0:4001"

# LiteLLM base URL to forward to (default: http://localhost:4000)
# upstream_url = "http://localhost:4000"

# Timeout for one forwarded request, in seconds (default: 300)
# request_timeout_secs = 300

# Logging configuration
# [logging]
# level = "info"  # trace, debug, info, warn, error (RUST_LOG env var overrides this)
"#;

        // Write template (ignore errors - config is optional)
        let _ = std::fs::write(&path, template);
    }

    /// Load file config if it exists
    fn load_file_config() -> FileConfig {
        let Some(path) = Self::config_path() else {
            return FileConfig::default();
        };

        match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                eprintln!("Warning: Failed to parse {}: {}", path.display(), e);
                FileConfig::default()
            }),
            Err(_) => FileConfig::default(), // File doesn't exist, use defaults
        }
    }

    /// Serialize config to TOML string (single source of truth for format)
    pub fn to_toml(&self) -> String {
        format!(
            r#"# thinkstrip configuration
# Environment variables (PROXY_PORT, LITELLM_URL, RUST_LOG) take precedence

# Proxy bind address (PROXY_PORT overrides the port)
bind_addr = "{bind}"

# LiteLLM base URL to forward to
upstream_url = "{upstream}"

# Timeout for one forwarded request, in seconds
request_timeout_secs = {timeout}

# Logging configuration (RUST_LOG env var overrides)
[logging]
level = "{log_level}"
"#,
            bind = self.bind_addr,
            upstream = self.upstream_url,
            timeout = self.request_timeout_secs,
            log_level = self.logging.level,
        )
    }

    /// Load configuration: env vars -> file -> defaults
    pub fn from_env() -> Self {
        let file = Self::load_file_config();

        // Bind address: file > default, then PROXY_PORT overrides the port
        let mut bind_addr: SocketAddr = file
            .bind_addr
            .unwrap_or_else(|| "0.0.0.0:4001".to_string())
            .parse()
            .expect("Invalid bind address");
        if let Some(port) = std::env::var("PROXY_PORT")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            bind_addr.set_port(port);
        }

        // Upstream URL: env > file > default
        let upstream_url = std::env::var("LITELLM_URL")
            .ok()
            .or(file.upstream_url)
            .unwrap_or_else(|| "http://localhost:4000".to_string());

        // Outbound timeout: file > default
        let request_timeout_secs = file.request_timeout_secs.unwrap_or(300);

        // Logging settings: file config only (RUST_LOG env var handled in main.rs)
        let file_logging = file.logging.unwrap_or_default();
        let logging = LoggingConfig {
            level: file_logging.level.unwrap_or_else(|| "info".to_string()),
        };

        Self {
            bind_addr,
            upstream_url,
            request_timeout_secs,
            logging,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:4001".parse().unwrap(),
            upstream_url: "http://localhost:4000".to_string(),
            request_timeout_secs: 300,
            logging: LoggingConfig::default(),
        }
    }
}
