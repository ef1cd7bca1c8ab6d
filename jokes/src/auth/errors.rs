//! Authentication error types.

use thiserror::Error;

/// Authentication errors
#[derive(Debug, Error)]
pub enum AuthError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Password hashing failed
    #[error("Password hashing failed")]
    HashingFailed,

    /// Password verification failed
    #[error("Invalid password")]
    InvalidPassword,

    /// Username already exists
    #[error("Username already exists")]
    UsernameTaken,

    /// Session not found
    #[error("Session not found")]
    SessionNotFound,

    /// Session expired
    #[error("Session expired")]
    SessionExpired,

    /// Session signing secret is unusable
    #[error("Session secret must be at least {min} bytes")]
    InvalidSessionSecret { min: usize },

    /// Session expiry falls outside the representable date range
    #[error("Session lifetime is out of range")]
    SessionLifetimeOutOfRange,
}

impl AuthError {
    /// Get a client-safe error message that doesn't leak sensitive information
    ///
    /// Database errors are sanitized to prevent information disclosure
    /// about the internal system structure.
    pub fn client_message(&self) -> String {
        match self {
            AuthError::Database(_)
            | AuthError::InvalidSessionSecret { .. }
            | AuthError::SessionLifetimeOutOfRange => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }
}

/// Result type for authentication operations
pub type AuthResult<T> = Result<T, AuthError>;
