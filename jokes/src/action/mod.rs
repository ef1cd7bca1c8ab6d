//! The login/register form action.
//!
//! [`LoginAction::handle`] takes one submitted form and answers with exactly
//! one [`ActionResult`]: a redirect carrying a fresh session, or a
//! [`FormResult`] describing what the user has to fix.
//!
//! Credential problems are never errors. `Err` is reserved for collaborator
//! failures (an unreachable database, a failed session write) that the HTTP
//! layer turns into a server error.

pub mod form;
pub mod models;

pub use form::{DEFAULT_REDIRECT, FormSubmission, ParseError, ParsedCredentials};
pub use models::{ActionResult, FieldErrors, FormFields, FormResult};

use log::{debug, warn};
use std::sync::Arc;

use crate::auth::{AuthResult, Authenticator, LoginRequest, LoginType, RegisterRequest};
use crate::db::UserRepository;
use crate::session::SessionIssuer;
use models::{
    CREATE_USER_FAILED, FORM_NOT_SUBMITTED, INVALID_CREDENTIALS, LOGIN_TYPE_INVALID,
    username_taken,
};

/// Login/register action handler
#[derive(Clone)]
pub struct LoginAction {
    authenticator: Arc<dyn Authenticator>,
    users: Arc<dyn UserRepository>,
    sessions: Arc<dyn SessionIssuer>,
}

impl LoginAction {
    pub fn new(
        authenticator: Arc<dyn Authenticator>,
        users: Arc<dyn UserRepository>,
        sessions: Arc<dyn SessionIssuer>,
    ) -> Self {
        Self {
            authenticator,
            users,
            sessions,
        }
    }

    /// Process one form submission.
    ///
    /// # Errors
    ///
    /// Only collaborator failures on the login, lookup and session paths.
    /// A failing user creation is reported in the form instead.
    pub async fn handle(&self, form: &FormSubmission) -> AuthResult<ActionResult> {
        let credentials = match form.parse() {
            Ok(credentials) => credentials,
            Err(e) => {
                debug!("Rejecting malformed login form: {e}");
                return Ok(FormResult::form_error(FORM_NOT_SUBMITTED).into());
            }
        };

        let fields = FormFields::from(&credentials);
        let field_errors = FieldErrors::validate(&credentials.username, &credentials.password);
        if !field_errors.is_empty() {
            debug!("Login form failed validation");
            return Ok(FormResult::invalid(field_errors, fields).into());
        }

        match credentials.login_type.clone() {
            LoginType::Login => self.login(credentials, fields).await,
            LoginType::Register => self.register(credentials, fields).await,
            LoginType::Other(value) => {
                debug!("Unknown login type {value:?}");
                Ok(FormResult::rejected(LOGIN_TYPE_INVALID, fields).into())
            }
        }
    }

    async fn login(
        &self,
        credentials: ParsedCredentials,
        fields: FormFields,
    ) -> AuthResult<ActionResult> {
        let request = LoginRequest {
            username: credentials.username,
            password: credentials.password,
        };

        match self.authenticator.login(&request).await? {
            Some(user) => {
                let issued = self
                    .sessions
                    .create_user_session(user.id, &credentials.redirect_to)
                    .await?;
                Ok(issued.into())
            }
            None => {
                warn!("Failed login attempt");
                Ok(FormResult::rejected(INVALID_CREDENTIALS, fields).into())
            }
        }
    }

    async fn register(
        &self,
        credentials: ParsedCredentials,
        fields: FormFields,
    ) -> AuthResult<ActionResult> {
        if self
            .users
            .find_by_username(&credentials.username)
            .await?
            .is_some()
        {
            return Ok(FormResult::rejected(username_taken(&credentials.username), fields).into());
        }

        let request = RegisterRequest {
            username: credentials.username,
            password: credentials.password,
        };

        let user = match self.authenticator.register(&request).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                warn!("Registration refused by the user store");
                return Ok(FormResult::rejected(CREATE_USER_FAILED, fields).into());
            }
            Err(e) => {
                warn!("Registration failed: {e}");
                return Ok(FormResult::rejected(CREATE_USER_FAILED, fields).into());
            }
        };

        let issued = self
            .sessions
            .create_user_session(user.id, &credentials.redirect_to)
            .await?;
        Ok(issued.into())
    }
}
