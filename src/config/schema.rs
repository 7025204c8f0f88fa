//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Development or production mode.
    pub mode: Mode,

    /// Static assets, stylesheets and the document shell.
    pub assets: AssetsConfig,

    /// File watching and push-channel settings (development only).
    pub live_reload: LiveReloadConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Run mode. Live reload only runs in development.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    #[default]
    Development,
    Production,
}

impl Mode {
    pub fn is_development(self) -> bool {
        self == Mode::Development
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" | "dev" => Ok(Mode::Development),
            "production" | "prod" => Ok(Mode::Production),
            other => Err(format!("unknown mode `{other}` (expected development or production)")),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "127.0.0.1:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:3000".to_string(),
        }
    }
}

/// Static asset configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Directory served under `mount_path` and holding stylesheets.
    pub static_dir: PathBuf,

    /// URL prefix for static files.
    pub mount_path: String,

    /// Stylesheets (relative to `static_dir`) inlined into every document.
    pub global_stylesheets: Vec<String>,

    /// Optional shell template path. The embedded template is used if unset.
    pub shell_template: Option<PathBuf>,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            static_dir: PathBuf::from("static"),
            mount_path: "/static".to_string(),
            global_stylesheets: Vec::new(),
            shell_template: None,
        }
    }
}

/// Live reload configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LiveReloadConfig {
    /// Source roots watched recursively. The static directory is always added.
    pub watch_paths: Vec<PathBuf>,

    /// File extensions (without the dot) that trigger a reload.
    pub extensions: Vec<String>,

    /// Capacity of the watcher → broadcaster queue.
    pub queue_capacity: usize,

    /// Per-connection outbound buffer.
    pub channel_capacity: usize,
}

impl Default for LiveReloadConfig {
    fn default() -> Self {
        Self {
            watch_paths: vec![PathBuf::from("src")],
            extensions: ["rs", "css", "html", "js"].map(String::from).to_vec(),
            queue_capacity: 64,
            channel_capacity: 8,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Total time for request/response in seconds.
    pub request_secs: u64,

    /// Bound on a single route or event handler in seconds.
    pub handler_secs: u64,
}

impl TimeoutConfig {
    pub fn request(&self) -> Duration {
        Duration::from_secs(self.request_secs)
    }

    pub fn handler(&self) -> Duration {
        Duration::from_secs(self.handler_secs)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            request_secs: 30,
            handler_secs: 10,
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
