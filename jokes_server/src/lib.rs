//! HTTP server for the jokes site login flow.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
