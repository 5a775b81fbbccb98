//! Local metrics collection and exposition.
//!
//! # Metrics
//! - `telemetry_requests_total` (counter): requests by method, endpoint, status
//! - `telemetry_request_duration_seconds` (histogram): latency distribution
//! - `telemetry_emissions_total` (counter): sink pushes by sink and outcome
//! - `telemetry_host_cpu_percent` / `telemetry_host_memory_percent` (gauge)
//!
//! Without an installed recorder these calls are no-ops, so tests and
//! embedders that skip `init_metrics` pay nothing.

use std::net::SocketAddr;
use std::time::Duration;

use metrics_exporter_prometheus::PrometheusBuilder;

use crate::dispatch::Sink;

/// Install the Prometheus recorder and its scrape listener.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

/// Record a completed request.
pub fn record_request(method: &str, endpoint: &str, status: u16, latency: Duration) {
    ::metrics::counter!(
        "telemetry_requests_total",
        "method" => method.to_string(),
        "endpoint" => endpoint.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
    ::metrics::histogram!(
        "telemetry_request_duration_seconds",
        "method" => method.to_string()
    )
    .record(latency.as_secs_f64());
}

/// Record the outcome of a push to a remote sink.
pub fn record_emission(sink: Sink, outcome: &'static str) {
    ::metrics::counter!(
        "telemetry_emissions_total",
        "sink" => sink.as_str(),
        "outcome" => outcome
    )
    .increment(1);
}

/// Record host utilization from the sampler.
pub fn record_host(cpu_percent: Option<f64>, memory_percent: Option<f64>) {
    if let Some(cpu) = cpu_percent {
        ::metrics::gauge!("telemetry_host_cpu_percent").set(cpu);
    }
    if let Some(memory) = memory_percent {
        ::metrics::gauge!("telemetry_host_memory_percent").set(memory);
    }
}
