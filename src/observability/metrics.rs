//! Metrics collection and exposition.
//!
//! # Metrics
//! - `trellis_requests_total` (counter): requests by method, route, status
//! - `trellis_request_duration_seconds` (histogram): dispatch latency
//!
//! # Design Decisions
//! - The route label is the registered pattern, never the raw path, so
//!   label cardinality stays bounded

use std::net::SocketAddr;
use std::time::Instant;

use metrics_exporter_prometheus::PrometheusBuilder;

/// Route label for requests no registered route matched.
pub const UNMATCHED: &str = "none";
/// Route label for requests answered by a static mount.
pub const STATIC: &str = "static";

/// Install the Prometheus exporter with its own HTTP listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics exporter listening"),
        Err(error) => tracing::error!(error = %error, "Failed to install metrics exporter"),
    }
}

pub fn record_request(method: &str, status: u16, route: &str, start: Instant) {
    let labels = [
        ("method", method.to_string()),
        ("route", route.to_string()),
        ("status", status.to_string()),
    ];
    metrics::counter!("trellis_requests_total", &labels).increment(1);
    metrics::histogram!("trellis_request_duration_seconds", &labels)
        .record(start.elapsed().as_secs_f64());
}
