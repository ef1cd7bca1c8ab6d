//! # Jokes
//!
//! Login, registration and session issuance for the jokes site.
//!
//! A submitted login form flows through three collaborators:
//!
//! - **Validation** ([`auth::validation`]): username and password length rules
//! - **Authentication** ([`auth::Authenticator`]): Argon2id verification and
//!   user creation against a [`db::UserRepository`]
//! - **Sessions** ([`session::SessionIssuer`]): a persisted token handed out
//!   in a signed cookie together with the redirect
//!
//! [`action::LoginAction`] orchestrates them and yields either a redirect or a
//! structured form result.
//!
//! ## Example
//!
//! ```
//! use jokes::action::{ActionResult, FormSubmission, LoginAction};
//! use jokes::auth::AuthManager;
//! use jokes::db::{MemorySessionRepository, MemoryUserRepository};
//! use jokes::session::{SessionConfig, SessionManager};
//! use std::sync::Arc;
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let users = Arc::new(MemoryUserRepository::new());
//! let sessions = SessionManager::new(
//!     Arc::new(MemorySessionRepository::new()),
//!     SessionConfig::new("a-session-secret-of-at-least-32-bytes"),
//! )?;
//! let action = LoginAction::new(
//!     Arc::new(AuthManager::new(users.clone(), "pepper".to_string())),
//!     users,
//!     Arc::new(sessions),
//! );
//!
//! let form: FormSubmission = [
//!     ("loginType", "register"),
//!     ("username", "kody"),
//!     ("password", "twixrox"),
//! ]
//! .into_iter()
//! .collect();
//!
//! let result = action.handle(&form).await?;
//! assert!(matches!(result, ActionResult::Redirect(_)));
//! # Ok(())
//! # }
//! ```

/// The login/register form action.
pub mod action;

/// Credential validation, hashing and verification.
pub mod auth;

/// Connection pooling and the user/session stores.
pub mod db;

/// Signed cookie sessions.
pub mod session;

pub use action::{ActionResult, FormResult, FormSubmission, LoginAction};
pub use auth::{AuthError, AuthResult};
