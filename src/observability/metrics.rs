//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define server metrics (requests, latency, renders, events, reloads)
//! - Expose a Prometheus-compatible endpoint when enabled
//!
//! # Metrics
//! - `fragment_requests_total` (counter): requests by method, status
//! - `fragment_request_duration_seconds` (histogram): latency distribution
//! - `fragment_renders_total` (counter): renders by component
//! - `fragment_events_total` (counter): dispatches by event, outcome
//! - `fragment_reload_broadcasts_total` (counter): reload passes
//! - `fragment_reload_channels_removed_total` (counter): dead channels dropped
//! - `fragment_push_channels` (gauge): connected push channels
//!
//! # Design Decisions
//! - Recording is a no-op until an exporter is installed
//! - Low-overhead metric updates (atomic operations)

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, start: Instant) {
    metrics::counter!(
        "fragment_requests_total",
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!("fragment_request_duration_seconds")
        .record(start.elapsed().as_secs_f64());
}

pub fn record_render(component: &str) {
    metrics::counter!("fragment_renders_total", "component" => component.to_string()).increment(1);
}

pub fn record_event(event: &str, outcome: &'static str) {
    metrics::counter!(
        "fragment_events_total",
        "event" => event.to_string(),
        "outcome" => outcome
    )
    .increment(1);
}

pub fn record_reload(delivered: usize, removed: usize) {
    metrics::counter!("fragment_reload_broadcasts_total").increment(1);
    if removed > 0 {
        metrics::counter!("fragment_reload_channels_removed_total").increment(removed as u64);
    }
    tracing::trace!(delivered, removed, "Reload recorded");
}

pub fn set_push_channels(count: usize) {
    metrics::gauge!("fragment_push_channels").set(count as f64);
}
