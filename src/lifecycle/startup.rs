//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration (file or defaults)
//! - Initialize logging and, when enabled, the metrics exporter
//!
//! # Design Decisions
//! - Fail fast: a bad config file is fatal
//! - Logging comes up before anything else logs

use std::path::Path;

use crate::config::{load_config, AppConfig, ConfigError};
use crate::config::validation::validate_config;
use crate::observability::{logging, metrics};

/// Load `path` if given, otherwise validated defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<AppConfig, ConfigError> {
    match path {
        Some(path) => load_config(path),
        None => {
            let config = AppConfig::default();
            validate_config(&config).map_err(ConfigError::Validation)?;
            Ok(config)
        }
    }
}

/// Bring up tracing and the optional Prometheus endpoint.
pub fn init_observability(config: &AppConfig) {
    logging::init_tracing(&config.observability.log_level);

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }
}
