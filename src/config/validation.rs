//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, capacities > 0)
//! - Check addresses and paths have a usable shape
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::AppConfig;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("listener.bind_address `{0}` is not a socket address")]
    BindAddress(String),

    #[error("observability.metrics_address `{0}` is not a socket address")]
    MetricsAddress(String),

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("timeouts.handler_secs ({handler}) exceeds timeouts.request_secs ({request})")]
    HandlerExceedsRequest { handler: u64, request: u64 },

    #[error("assets.mount_path `{0}` must start with `/` and not be `/`")]
    MountPath(String),

    #[error("live_reload.extensions must not be empty")]
    NoExtensions,

    #[error("live_reload.{0} must be greater than zero")]
    ZeroCapacity(&'static str),

    #[error("limits.max_body_size must be greater than zero")]
    ZeroBodyLimit,
}

/// Check every semantic rule, collecting all failures.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    let timeouts = &config.timeouts;
    if timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }
    if timeouts.handler_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("handler_secs"));
    }
    if timeouts.handler_secs > timeouts.request_secs && timeouts.request_secs > 0 {
        errors.push(ValidationError::HandlerExceedsRequest {
            handler: timeouts.handler_secs,
            request: timeouts.request_secs,
        });
    }

    let mount = &config.assets.mount_path;
    if !mount.starts_with('/') || mount == "/" {
        errors.push(ValidationError::MountPath(mount.clone()));
    }

    let live_reload = &config.live_reload;
    if live_reload.extensions.is_empty() {
        errors.push(ValidationError::NoExtensions);
    }
    if live_reload.queue_capacity == 0 {
        errors.push(ValidationError::ZeroCapacity("queue_capacity"));
    }
    if live_reload.channel_capacity == 0 {
        errors.push(ValidationError::ZeroCapacity("channel_capacity"));
    }

    if config.limits.max_body_size == 0 {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
