//! Typed parsing of the submitted login form.

use thiserror::Error;

use crate::auth::LoginType;

/// Where a successful login lands when the form carries no `redirectTo`.
pub const DEFAULT_REDIRECT: &str = "/jokes";

/// Raw url-encoded form fields in submission order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSubmission {
    fields: Vec<(String, String)>,
}

/// The form could not be read as a login submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("missing form field `{0}`")]
    MissingField(&'static str),

    #[error("redirect target cannot be sent as a Location header")]
    InvalidRedirect,
}

/// Whether `target` survives as an HTTP header value: no control characters
/// other than tab.
fn is_header_safe(target: &str) -> bool {
    target
        .bytes()
        .all(|b| b == b'\t' || (b >= 0x20 && b != 0x7f))
}

/// A structurally valid login submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCredentials {
    pub login_type: LoginType,
    pub username: String,
    pub password: String,
    pub redirect_to: String,
}

impl FormSubmission {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self { fields }
    }

    /// First value submitted under `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    fn require(&self, key: &'static str) -> Result<&str, ParseError> {
        self.get(key).ok_or(ParseError::MissingField(key))
    }

    pub fn parse(&self) -> Result<ParsedCredentials, ParseError> {
        let login_type = self.require("loginType")?;
        let username = self.require("username")?;
        let password = self.require("password")?;
        let redirect_to = self
            .get("redirectTo")
            .filter(|value| !value.is_empty())
            .unwrap_or(DEFAULT_REDIRECT);
        if !is_header_safe(redirect_to) {
            return Err(ParseError::InvalidRedirect);
        }

        Ok(ParsedCredentials {
            login_type: LoginType::parse(login_type),
            username: username.to_string(),
            password: password.to_string(),
            redirect_to: redirect_to.to_string(),
        })
    }
}

impl<K, V> FromIterator<(K, V)> for FormSubmission
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::new(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}
