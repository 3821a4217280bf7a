//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, route, status
//! - `gateway_request_duration_seconds` (histogram): latency by method, route
//! - `gateway_authorization_denied_total` (counter): denials by outcome (401/403)
//! - `gateway_dispatch_retries_total` (counter): backend retries by command
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; cheap no-ops without an exporter
//! - Route label is the registered template, never the raw path, to bound cardinality

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(e) => tracing::error!(error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, route: &str, status: u16, start: Instant) {
    metrics::counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    metrics::histogram!(
        "gateway_request_duration_seconds",
        "method" => method.to_string(),
        "route" => route.to_string()
    )
    .record(start.elapsed().as_secs_f64());
}

pub fn record_authorization_denied(outcome: &'static str) {
    metrics::counter!("gateway_authorization_denied_total", "outcome" => outcome).increment(1);
}

pub fn record_dispatch_retry(command: &str) {
    metrics::counter!("gateway_dispatch_retries_total", "command" => command.to_string()).increment(1);
}
