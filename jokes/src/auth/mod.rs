//! Credential validation and verification.
//!
//! - [`validation`]: length rules for usernames and passwords
//! - [`manager`]: Argon2id hashing with a server-side pepper behind the
//!   [`Authenticator`] trait
//!
//! ## Example
//!
//! ```no_run
//! use jokes::auth::{AuthManager, Authenticator, RegisterRequest};
//! use jokes::db::MemoryUserRepository;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let auth = AuthManager::new(
//!         Arc::new(MemoryUserRepository::new()),
//!         "secret_pepper".to_string(),
//!     );
//!
//!     let request = RegisterRequest {
//!         username: "kody".to_string(),
//!         password: "twixrox".to_string(),
//!     };
//!
//!     if let Some(user) = auth.register(&request).await? {
//!         println!("Registered user: {}", user.username);
//!     }
//!     Ok(())
//! }
//! ```

pub mod errors;
pub mod manager;
pub mod models;
pub mod validation;

pub use errors::{AuthError, AuthResult};
pub use manager::{AuthManager, Authenticator};
pub use models::{LoginRequest, LoginType, RegisterRequest, Session, User, UserId};
pub use validation::{Field, ValidationError, validate_password, validate_username};
