//! Prometheus metrics for monitoring wallet server health and performance.
//!
//! Metrics are exposed in Prometheus text format on a dedicated listener when
//! `METRICS_BIND` is configured. Without an installed exporter every call
//! below is a no-op.
//!
//! # Metrics
//!
//! - `http_requests_total{method,path,status}` and `http_request_duration_ms`
//! - `withdrawals_total{outcome}` and `withdraw_duration_ms{outcome}`
//! - `users_created_total`
//!
//! # Example Usage
//!
//! ```rust,no_run
//! use wl_server::metrics;
//! use std::net::SocketAddr;
//!
//! let addr: SocketAddr = "127.0.0.1:9090".parse().unwrap();
//! metrics::init_metrics(addr).unwrap();
//!
//! metrics::withdrawals_total("succeeded");
//! ```

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize Prometheus metrics exporter.
///
/// Metrics will be available at `http://<addr>/metrics`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install Prometheus exporter: {}", e))
}

// ============================================================================
// HTTP Metrics
// ============================================================================

/// Record HTTP request.
pub fn http_requests_total(method: &str, path: &str, status: u16) {
    metrics::counter!("http_requests_total",
        "method" => method.to_string(),
        "path" => path.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Record HTTP request duration in milliseconds.
pub fn http_request_duration_ms(method: &str, path: &str, duration_ms: f64) {
    metrics::histogram!("http_request_duration_ms",
        "method" => method.to_string(),
        "path" => path.to_string()
    )
    .record(duration_ms);
}

// ============================================================================
// Wallet Metrics
// ============================================================================

/// Increment withdrawals counter for an outcome (`succeeded`, `replayed` or an error code).
pub fn withdrawals_total(outcome: &str) {
    metrics::counter!("withdrawals_total",
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

/// Record withdrawal duration in milliseconds.
pub fn withdraw_duration_ms(outcome: &str, duration_ms: f64) {
    metrics::histogram!("withdraw_duration_ms",
        "outcome" => outcome.to_string()
    )
    .record(duration_ms);
}

/// Increment created users counter.
pub fn users_created_total() {
    metrics::counter!("users_created_total").increment(1);
}
