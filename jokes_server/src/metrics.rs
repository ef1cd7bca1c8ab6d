//! Prometheus metrics for the login flow.
//!
//! Metrics are exposed in Prometheus text format when `METRICS_BIND` is set.
//! Without an installed exporter the recording calls are no-ops.

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

/// Count a login form submission by branch and outcome.
pub fn login_attempts_total(login_type: &str, success: bool) {
    // Unknown branches share one label to bound cardinality.
    let login_type = match login_type {
        "login" | "register" => login_type,
        _ => "other",
    };
    metrics::counter!("login_attempts_total",
        "login_type" => login_type.to_string(),
        "success" => success.to_string()
    )
    .increment(1);
}

/// Count destroyed sessions.
pub fn logouts_total() {
    metrics::counter!("logouts_total").increment(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_without_exporter() {
        http_requests_total("POST", "/login", 303);
        http_request_duration_ms("POST", "/login", 12.5);
        login_attempts_total("login", true);
        login_attempts_total("'; DROP TABLE", false);
        logouts_total();
    }
}
