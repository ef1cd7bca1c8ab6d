//! Shape checks for submitted credentials.

use std::fmt;
use thiserror::Error;

pub const MIN_USERNAME_LENGTH: usize = 3;
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// The form field a validation error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Username,
    Password,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Field::Username => f.write_str("Username"),
            Field::Password => f.write_str("Password"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be at least {min} characters long")]
    TooShort { field: Field, min: usize },
}

fn check_length(field: Field, value: &str, min: usize) -> Option<ValidationError> {
    // Counted in characters, not bytes.
    (value.chars().count() < min).then_some(ValidationError::TooShort { field, min })
}

pub fn validate_username(username: &str) -> Option<ValidationError> {
    check_length(Field::Username, username, MIN_USERNAME_LENGTH)
}

pub fn validate_password(password: &str) -> Option<ValidationError> {
    check_length(Field::Password, password, MIN_PASSWORD_LENGTH)
}
