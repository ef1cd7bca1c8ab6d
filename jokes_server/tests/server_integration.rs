//! Integration tests for the HTTP surface of the login flow.
//!
//! The router runs against the in-memory stores; requests are driven with
//! `tower::ServiceExt::oneshot`.

use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use jokes::action::LoginAction;
use jokes::auth::AuthManager;
use jokes::db::{MemorySessionRepository, MemoryUserRepository, UserRepository};
use jokes::session::{SessionConfig, SessionManager};
use jokes_server::api::{AppState, create_router};
use jokes_server::api::request_id::REQUEST_ID_HEADER;
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // For `oneshot` method

const SECRET: &str = "server-integration-session-secret-0123456789";

/// Helper to create a test server on in-memory stores
fn create_test_server() -> (axum::Router, Arc<MemoryUserRepository>) {
    let users = Arc::new(MemoryUserRepository::new());
    let sessions = Arc::new(
        SessionManager::new(
            Arc::new(MemorySessionRepository::new()),
            SessionConfig::new(SECRET),
        )
        .expect("valid session config"),
    );
    let auth = Arc::new(AuthManager::new(users.clone(), "test_pepper_value".to_string()));

    let state = AppState {
        login_action: Arc::new(LoginAction::new(auth, users.clone(), sessions.clone())),
        sessions,
        users: users.clone(),
        database: None,
    };

    (create_router(state), users)
}

fn form_request(body: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("JSON body")
}

/// The `name=value` part of the response's `Set-Cookie`.
fn session_cookie(response: &Response<Body>) -> String {
    response.headers()[header::SET_COOKIE]
        .to_str()
        .unwrap()
        .split(';')
        .next()
        .unwrap()
        .to_string()
}

async fn register(app: &axum::Router, username: &str, password: &str) -> String {
    let body = format!("loginType=register&username={username}&password={password}");
    let response = app.clone().oneshot(form_request(&body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    session_cookie(&response)
}

// ============================================================================
// Health Check
// ============================================================================

#[tokio::test]
async fn test_health_check_endpoint() {
    let (app, _) = create_test_server();

    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "memory");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let (app, _) = create_test_server();

    let request = Request::builder()
        .uri("/health")
        .header(REQUEST_ID_HEADER, "trace-me")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.headers()[REQUEST_ID_HEADER], "trace-me");
}

// ============================================================================
// Login form
// ============================================================================

#[tokio::test]
async fn test_register_redirects_with_session_cookie() {
    let (app, users) = create_test_server();

    let response = app
        .oneshot(form_request(
            "loginType=register&username=kody&password=twixrox&redirectTo=%2Fjokes%2Fnew",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/jokes/new");
    let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.starts_with("RJ_session="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(users.find_by_username("kody").await.unwrap().is_some());
}

#[tokio::test]
async fn test_login_defaults_redirect_to_jokes() {
    let (app, _) = create_test_server();
    register(&app, "kody", "twixrox").await;

    let response = app
        .oneshot(form_request("loginType=login&username=kody&password=twixrox"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/jokes");
}

#[tokio::test]
async fn test_failed_login_returns_form_result() {
    let (app, _) = create_test_server();
    register(&app, "kody", "twixrox").await;

    let response = app
        .oneshot(form_request("loginType=login&username=kody&password=wrongpass"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let body = json_body(response).await;
    assert_eq!(
        body,
        json!({
            "formError": "Username/Password combination is incorrect",
            "fields": { "loginType": "login", "username": "kody" }
        })
    );
}

#[tokio::test]
async fn test_field_errors() {
    let (app, _) = create_test_server();

    let response = app
        .oneshot(form_request("loginType=register&username=ko&password=abc"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(
        body["fieldErrors"]["username"],
        "Username must be at least 3 characters long"
    );
    assert_eq!(
        body["fieldErrors"]["password"],
        "Password must be at least 6 characters long"
    );
    assert_eq!(body["fields"]["username"], "ko");
    assert!(body["fields"].get("password").is_none());
}

#[tokio::test]
async fn test_duplicate_registration() {
    let (app, _) = create_test_server();
    register(&app, "kody", "twixrox").await;

    let response = app
        .oneshot(form_request("loginType=register&username=kody&password=another"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["formError"], "User with username kody already exists");
}

#[tokio::test]
async fn test_missing_field_is_malformed() {
    let (app, _) = create_test_server();

    let response = app
        .oneshot(form_request("loginType=login&username=kody"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({ "formError": "Form not submitted correctly." })
    );
}

#[tokio::test]
async fn test_non_form_body_is_malformed() {
    let (app, _) = create_test_server();

    let request = Request::builder()
        .method("POST")
        .uri("/login")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(r#"{"loginType":"login"}"#))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        json_body(response).await,
        json!({ "formError": "Form not submitted correctly." })
    );
}

#[tokio::test]
async fn test_redirect_with_line_break_creates_nothing() {
    let (app, users) = create_test_server();

    let response = app
        .clone()
        .oneshot(form_request(
            "loginType=register&username=kody&password=twixrox&redirectTo=%2Fjokes%0Aevil",
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(
        json_body(response).await,
        json!({ "formError": "Form not submitted correctly." })
    );
    assert_eq!(users.user_count().await, 0);

    register(&app, "kody", "twixrox").await;
}

#[tokio::test]
async fn test_invalid_login_type() {
    let (app, _) = create_test_server();

    let response = app
        .oneshot(form_request("loginType=sudo&username=kody&password=twixrox"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["formError"], "Login type invalid");
    assert_eq!(body["fields"]["loginType"], "sudo");
}

// ============================================================================
// Session lifecycle
// ============================================================================

#[tokio::test]
async fn test_current_user_from_session_cookie() {
    let (app, _) = create_test_server();
    let cookie = register(&app, "kody", "twixrox").await;

    let request = Request::builder()
        .uri("/api/user")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["username"], "kody");
}

#[tokio::test]
async fn test_current_user_without_cookie() {
    let (app, _) = create_test_server();

    let request = Request::builder()
        .uri("/api/user")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let (app, _) = create_test_server();
    let cookie = register(&app, "kody", "twixrox").await;

    let logout = Request::builder()
        .method("POST")
        .uri("/logout")
        .header(header::COOKIE, cookie.clone())
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(logout).await.unwrap();
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers()[header::LOCATION], "/");
    assert!(
        response.headers()[header::SET_COOKIE]
            .to_str()
            .unwrap()
            .contains("Max-Age=0")
    );

    let request = Request::builder()
        .uri("/api/user")
        .header(header::COOKIE, cookie)
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
