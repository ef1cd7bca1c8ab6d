//! Outcomes of the login action.

use serde::Serialize;

use super::form::ParsedCredentials;
use crate::auth::{LoginType, validate_password, validate_username};
use crate::session::SessionRedirect;

pub const FORM_NOT_SUBMITTED: &str = "Form not submitted correctly.";
pub const INVALID_CREDENTIALS: &str = "Username/Password combination is incorrect";
pub const CREATE_USER_FAILED: &str = "Something went wrong trying to create a new user.";
pub const LOGIN_TYPE_INVALID: &str = "Login type invalid";

pub fn username_taken(username: &str) -> String {
    format!("User with username {username} already exists")
}

/// Per-field diagnostics shown inline in the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FieldErrors {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl FieldErrors {
    pub fn validate(username: &str, password: &str) -> Self {
        Self {
            username: validate_username(username).map(|e| e.to_string()),
            password: validate_password(password).map(|e| e.to_string()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.password.is_none()
    }
}

/// Submitted values echoed back so the form can be repopulated.
///
/// The password is kept for callers in-process but never serialized.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormFields {
    pub login_type: LoginType,
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl From<&ParsedCredentials> for FormFields {
    fn from(credentials: &ParsedCredentials) -> Self {
        Self {
            login_type: credentials.login_type.clone(),
            username: credentials.username.clone(),
            password: credentials.password.clone(),
        }
    }
}

/// Failure payload consumed by the page rendering the form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<FormFields>,
}

impl FormResult {
    /// Form-level error without echoed fields.
    pub fn form_error(message: impl Into<String>) -> Self {
        Self {
            form_error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn rejected(message: impl Into<String>, fields: FormFields) -> Self {
        Self {
            form_error: Some(message.into()),
            field_errors: None,
            fields: Some(fields),
        }
    }

    pub fn invalid(field_errors: FieldErrors, fields: FormFields) -> Self {
        Self {
            form_error: None,
            field_errors: Some(field_errors),
            fields: Some(fields),
        }
    }
}

/// Exactly one outcome per submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionResult {
    Redirect(SessionRedirect),
    Form(FormResult),
}

impl ActionResult {
    pub fn is_redirect(&self) -> bool {
        matches!(self, ActionResult::Redirect(_))
    }

    pub fn as_form(&self) -> Option<&FormResult> {
        match self {
            ActionResult::Form(form) => Some(form),
            ActionResult::Redirect(_) => None,
        }
    }
}

impl From<FormResult> for ActionResult {
    fn from(form: FormResult) -> Self {
        ActionResult::Form(form)
    }
}

impl From<SessionRedirect> for ActionResult {
    fn from(redirect: SessionRedirect) -> Self {
        ActionResult::Redirect(redirect)
    }
}
