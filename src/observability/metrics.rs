//! Metrics collection and exposition.
//!
//! # Responsibilities
//! - Define gateway metrics (request counts, latency, upstream errors)
//! - Expose a Prometheus-compatible scrape endpoint
//!
//! # Metrics
//! - `gateway_requests_total` (counter): requests by method, route,
//!   status, and outcome (completed / rejected / failed)
//! - `gateway_request_duration_seconds` (histogram): latency by route
//!   and outcome
//! - `gateway_upstream_errors_total` (counter): dispatch failures by
//!   origin and kind (connect / exchange / timeout)
//!
//! # Design Decisions
//! - Low-overhead updates (the metrics crate's atomic registry)
//! - The exporter listens on its own address, never on the gateway
//!   listener, so scrapes do not compete with proxied traffic

use std::net::SocketAddr;
use std::time::Instant;

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus exporter on its own listener and register
/// metric descriptions. Exporter failure is logged, not fatal; the
/// gateway keeps serving without metrics.
pub fn init_metrics(address: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(address).install() {
        Ok(()) => {
            describe_counter!(
                "gateway_requests_total",
                "Requests handled, labeled by method, route, status, and outcome"
            );
            describe_histogram!(
                "gateway_request_duration_seconds",
                "Request handling latency in seconds, labeled by route and outcome"
            );
            describe_counter!(
                "gateway_upstream_errors_total",
                "Upstream dispatch failures, labeled by origin and kind"
            );
            tracing::info!(address = %address, "metrics exporter listening");
        }
        Err(e) => {
            tracing::error!(error = %e, "failed to install metrics exporter");
        }
    }
}

/// Record a finished request. `outcome` is one of `completed`,
/// `rejected`, or `failed`.
pub fn record_request(method: &str, status: u16, route: &str, outcome: &'static str, start: Instant) {
    let elapsed = start.elapsed().as_secs_f64();
    counter!(
        "gateway_requests_total",
        "method" => method.to_string(),
        "route" => route.to_string(),
        "status" => status.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    histogram!(
        "gateway_request_duration_seconds",
        "route" => route.to_string(),
        "outcome" => outcome
    )
    .record(elapsed);
}

/// Record a dispatch failure against an origin.
pub fn record_upstream_error(origin: &str, kind: &'static str) {
    counter!(
        "gateway_upstream_errors_total",
        "origin" => origin.to_string(),
        "kind" => kind
    )
    .increment(1);
}
