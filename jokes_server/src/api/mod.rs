//! HTTP API for the jokes site login flow.
//!
//! # Endpoints
//!
//! ```text
//! GET  /health     - Health check
//! POST /login      - Login or register (url-encoded form)
//! POST /logout     - Destroy the current session
//! GET  /api/user   - The user behind the session cookie
//! ```
//!
//! `POST /login` answers `303 See Other` with `Location` and `Set-Cookie` on
//! success and `400 Bad Request` with a JSON form result otherwise:
//!
//! ```bash
//! curl -i -X POST http://localhost:3000/login \
//!   -d loginType=login -d username=kody -d password=twixrox -d redirectTo=/jokes
//! ```

pub mod auth;
pub mod request_id;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use jokes::{
    action::LoginAction,
    auth::AuthError,
    db::{Database, UserRepository},
    session::SessionManager,
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across all HTTP handlers.
///
/// Cloned for each request; every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub login_action: Arc<LoginAction>,
    pub sessions: Arc<SessionManager>,
    pub users: Arc<dyn UserRepository>,
    /// `None` when running on the in-memory stores
    pub database: Option<Database>,
}

/// Create the API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/api/user", get(auth::current_user))
        .layer(axum::middleware::from_fn(request_id::request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Failures that escape the form flow.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("Redirect target is not a valid header value")]
    InvalidRedirect,

    #[error("Not authenticated")]
    Unauthorized,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = match &self {
            ApiError::Auth(e) => {
                tracing::error!(error = %e, "Request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, e.client_message())
            }
            ApiError::InvalidRedirect => (StatusCode::BAD_REQUEST, self.to_string()),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, self.to_string()),
        };
        (status, Json(ErrorResponse { error })).into_response()
    }
}

/// Health check endpoint for monitoring and load balancers.
///
/// Returns `200 OK` when the store is reachable, `503` otherwise.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (store, healthy) = match &state.database {
        Some(db) => ("postgres", db.health_check().await.is_ok()),
        None => ("memory", true),
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "store": store,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    });

    (status_code, Json(response))
}
