//! Structured logging configuration.
//!
//! The library crate logs through `log`; `tracing-subscriber` picks those
//! records up alongside the server's own `tracing` events.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured logging
///
/// Log levels are configurable via the `RUST_LOG` env var.
pub fn init() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,sqlx=warn,hyper=warn"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    tracing::info!("Structured logging initialized");
}

/// Log security event with structured data
///
/// # Example
///
/// ```
/// use jokes_server::logging::log_security_event;
///
/// log_security_event("failed_login", None, Some("req-1"), "Invalid credentials");
/// ```
pub fn log_security_event(
    event_type: &str,
    user_id: Option<i64>,
    request_id: Option<&str>,
    message: &str,
) {
    tracing::warn!(
        event_type = event_type,
        user_id = user_id,
        request_id = request_id,
        "SECURITY: {}",
        message
    );
}
