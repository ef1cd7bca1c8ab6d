//! Authentication data models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// User ID type
pub type UserId = i64;

/// User model
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// User login request
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// User registration request
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
}

/// Which branch of the login form was submitted.
///
/// Unknown values are kept verbatim so they can be echoed back to the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginType {
    Login,
    Register,
    Other(String),
}

impl LoginType {
    pub fn parse(value: &str) -> Self {
        match value {
            "login" => LoginType::Login,
            "register" => LoginType::Register,
            other => LoginType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            LoginType::Login => "login",
            LoginType::Register => "register",
            LoginType::Other(value) => value,
        }
    }
}

impl fmt::Display for LoginType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for LoginType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Session model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }
}
