//! Login form, logout and current-user handlers.

use axum::{
    Json,
    extract::{Form, State, rejection::FormRejection},
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use jokes::{
    action::{ActionResult, FormSubmission},
    session::Redirect,
};
use serde::Serialize;

use super::{ApiError, AppState, request_id::RequestId};
use crate::{logging, metrics};

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub username: String,
}

/// All `Cookie` request headers joined into one.
fn cookie_header(headers: &HeaderMap) -> String {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .collect::<Vec<_>>()
        .join("; ")
}

fn redirect_response(redirect: &Redirect) -> Result<Response, ApiError> {
    let location =
        HeaderValue::from_str(&redirect.location).map_err(|_| ApiError::InvalidRedirect)?;
    let cookie =
        HeaderValue::from_str(&redirect.set_cookie).map_err(|_| ApiError::InvalidRedirect)?;

    Ok((
        StatusCode::SEE_OTHER,
        [(header::LOCATION, location), (header::SET_COOKIE, cookie)],
    )
        .into_response())
}

/// Login or register from the url-encoded login form.
///
/// # Request Body
///
/// ```text
/// loginType=login&username=kody&password=twixrox&redirectTo=%2Fjokes
/// ```
///
/// # Response
///
/// - `303 See Other` with `Location` and the `RJ_session` cookie on success
/// - `400 Bad Request` with the form result otherwise:
///
/// ```json
/// {
///   "formError": "Username/Password combination is incorrect",
///   "fields": { "loginType": "login", "username": "kody" }
/// }
/// ```
///
/// A body that cannot be read as a form gets the same answer as a form with
/// missing fields.
pub async fn login(
    State(state): State<AppState>,
    request_id: RequestId,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Result<Response, ApiError> {
    let submission = match form {
        Ok(Form(fields)) => FormSubmission::new(fields),
        Err(rejection) => {
            tracing::debug!(%rejection, "Login body is not a form");
            FormSubmission::default()
        }
    };
    let login_type = submission.get("loginType").unwrap_or_default().to_string();

    match state.login_action.handle(&submission).await? {
        ActionResult::Redirect(issued) => {
            metrics::login_attempts_total(&login_type, true);
            tracing::info!(
                request_id = %request_id.as_str(),
                user_id = issued.session.user_id,
                login_type = %login_type,
                "Session issued"
            );
            redirect_response(&issued.redirect)
        }
        ActionResult::Form(result) => {
            metrics::login_attempts_total(&login_type, false);
            if result.field_errors.is_none() && login_type == "login" {
                logging::log_security_event(
                    "failed_login",
                    None,
                    Some(request_id.as_str()),
                    "Login form rejected",
                );
            }
            Ok((StatusCode::BAD_REQUEST, Json(result)).into_response())
        }
    }
}

/// Destroy the current session and redirect home.
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let redirect = state.sessions.logout(&cookie_header(&headers)).await?;
    metrics::logouts_total();
    redirect_response(&redirect)
}

/// The user the session cookie belongs to.
///
/// # Errors
///
/// - `401 Unauthorized`: no valid session, or its user no longer exists
pub async fn current_user(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<UserResponse>, ApiError> {
    let user_id = state
        .sessions
        .user_id_from_cookie(&cookie_header(&headers))
        .await?
        .ok_or(ApiError::Unauthorized)?;

    let user = state
        .users
        .find_by_id(user_id)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    Ok(Json(UserResponse {
        id: user.id,
        username: user.username,
    }))
}
