//! Metrics collection and exposition.
//!
//! # Metrics
//! - `echo_requests_total` (counter): requests by method and status
//! - `echo_request_duration_seconds` (histogram): time from ingestion to plan,
//!   including the artificial delay
//! - `echo_delay_milliseconds` (histogram): applied artificial delay
//!
//! # Design Decisions
//! - Recording is unconditional; without an installed recorder the
//!   `metrics` macros are no-ops
//! - The Prometheus listener is only started when enabled in config
//! - Method labels are bucketed to keep cardinality bounded

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use metrics::{counter, describe_counter, describe_histogram, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::config::ObservabilityConfig;

static METRICS_INSTALLED: AtomicBool = AtomicBool::new(false);

const KNOWN_METHODS: [&str; 9] = [
    "GET", "POST", "PUT", "DELETE", "PATCH", "HEAD", "OPTIONS", "TRACE", "CONNECT",
];

/// Method label, with unknown verbs folded into `OTHER`.
pub fn method_label(method: &str) -> &str {
    if KNOWN_METHODS.contains(&method) {
        method
    } else {
        "OTHER"
    }
}

/// Start the Prometheus exporter if metrics are enabled.
pub fn init_metrics(config: &ObservabilityConfig) -> Result<(), std::io::Error> {
    if !config.metrics_enabled {
        return Ok(());
    }
    let addr: SocketAddr = config
        .metrics_address
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    if METRICS_INSTALLED.swap(true, Ordering::SeqCst) {
        tracing::debug!("Metrics exporter already installed");
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| std::io::Error::other(e.to_string()))?;

    describe_counter!("echo_requests_total", "Total requests answered");
    describe_histogram!("echo_request_duration_seconds", "Request handling time in seconds");
    describe_histogram!("echo_delay_milliseconds", "Artificial delay applied in milliseconds");

    tracing::info!(address = %addr, "Metrics endpoint listening");
    Ok(())
}

/// Record a completed request.
pub fn record_request(method: &str, status: u16, started: Instant) {
    counter!(
        "echo_requests_total",
        "method" => method_label(method).to_owned(),
        "status" => status.to_string(),
    )
    .increment(1);
    histogram!("echo_request_duration_seconds").record(started.elapsed().as_secs_f64());
}

/// Record an applied delay.
pub fn record_delay(delay: Duration) {
    if !delay.is_zero() {
        histogram!("echo_delay_milliseconds").record(delay.as_millis() as f64);
    }
}
