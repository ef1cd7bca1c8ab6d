//! Request ID middleware for log correlation.
//!
//! Every request gets an `x-request-id`, either the one the client sent or a
//! fresh UUID. The ID is echoed on the response, stored in the request
//! extensions for handlers, and attached to the request's log lines and
//! HTTP metrics.

use axum::{
    extract::{FromRequestParts, Request},
    http::{HeaderMap, HeaderValue, StatusCode, request::Parts},
    middleware::Next,
    response::Response,
};
use std::time::Instant;
use uuid::Uuid;

use crate::metrics;

/// Header name for request ID
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest client-supplied ID that is accepted as-is
const MAX_REQUEST_ID_LEN: usize = 128;

/// Reuse the client's request ID when it is sane, otherwise generate one.
fn get_or_generate_request_id(headers: &HeaderMap) -> String {
    headers
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && s.len() <= MAX_REQUEST_ID_LEN)
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Tag the request with an ID, log its start and completion, and record
/// request metrics.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = get_or_generate_request_id(request.headers());
    request
        .extensions_mut()
        .insert(RequestId(request_id.clone()));

    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let started = Instant::now();

    tracing::info!(request_id = %request_id, method = %method, path = %path, "Request started");

    let mut response = next.run(request).await;

    if let Ok(header_value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, header_value);
    }

    let status = response.status();
    let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
    metrics::http_requests_total(&method, &path, status.as_u16());
    metrics::http_request_duration_ms(&method, &path, elapsed_ms);

    tracing::info!(
        request_id = %request_id,
        status = %status,
        duration_ms = elapsed_ms,
        "Request completed"
    );

    response
}

/// Request ID wrapper for extracting from request extensions
#[derive(Clone, Debug)]
pub struct RequestId(pub String);

impl RequestId {
    /// Get the request ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Axum extractor for request ID
impl<S> FromRequestParts<S> for RequestId
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts.extensions.get::<RequestId>().cloned().ok_or((
            StatusCode::INTERNAL_SERVER_ERROR,
            "Request ID not found in extensions",
        ))
    }
}
