//! Authentication manager implementation.

use super::{
    errors::{AuthError, AuthResult},
    models::{LoginRequest, RegisterRequest, User},
};
use crate::db::UserRepository;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use async_trait::async_trait;
use log::{debug, info, warn};
use std::sync::Arc;

/// Argon2id hash with the default cost parameters that no password matches.
/// Unknown usernames are verified against it so both login failures cost one
/// Argon2 run.
const DUMMY_PASSWORD_HASH: &str = "$argon2id$v=19$m=19456,t=2,p=1$c29tZXNhbHRzb21lc2FsdA$AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8";

/// Verifies and creates credentials.
///
/// Both operations answer `None` instead of an error when the credentials
/// are simply not acceptable, so callers can turn that into a form message.
#[async_trait]
pub trait Authenticator: Send + Sync {
    /// Returns the user when the username exists and the password matches.
    ///
    /// An unknown username and a wrong password are indistinguishable.
    async fn login(&self, request: &LoginRequest) -> AuthResult<Option<User>>;

    /// Creates a user, or returns `None` when the store refused the username.
    async fn register(&self, request: &RegisterRequest) -> AuthResult<Option<User>>;
}

/// Authentication manager
#[derive(Clone)]
pub struct AuthManager {
    users: Arc<dyn UserRepository>,
    pepper: String,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `users` - Credential store
    /// * `pepper` - Server-side pepper for password hashing
    pub fn new(users: Arc<dyn UserRepository>, pepper: String) -> Self {
        Self { users, pepper }
    }

    /// Hash password with Argon2id + pepper
    fn hash_password(&self, password: &str) -> AuthResult<String> {
        let peppered = format!("{}{}", password, self.pepper);
        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();

        Ok(argon2
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?
            .to_string())
    }

    /// Verify password against hash
    fn verify_password(&self, password: &str, hash: &str) -> AuthResult<()> {
        let peppered = format!("{}{}", password, self.pepper);
        let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidPassword)?;

        Argon2::default()
            .verify_password(peppered.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidPassword)
    }
}

#[async_trait]
impl Authenticator for AuthManager {
    async fn login(&self, request: &LoginRequest) -> AuthResult<Option<User>> {
        let Some(user) = self.users.find_by_username(&request.username).await? else {
            let _ = self.verify_password(&request.password, DUMMY_PASSWORD_HASH);
            debug!("Login rejected: no such user");
            return Ok(None);
        };

        if self.verify_password(&request.password, &user.password_hash).is_err() {
            debug!("Login rejected: password mismatch for user {}", user.id);
            return Ok(None);
        }

        Ok(Some(user))
    }

    async fn register(&self, request: &RegisterRequest) -> AuthResult<Option<User>> {
        let password_hash = self.hash_password(&request.password)?;

        match self.users.create_user(&request.username, &password_hash).await {
            Ok(user) => {
                info!("Registered user {} ({})", user.id, user.username);
                Ok(Some(user))
            }
            Err(AuthError::UsernameTaken) => {
                // Lost a race against a concurrent registration.
                warn!("Username {} was claimed during registration", request.username);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryUserRepository;

    fn manager() -> (AuthManager, Arc<MemoryUserRepository>) {
        let users = Arc::new(MemoryUserRepository::new());
        let auth = AuthManager::new(users.clone(), "test_pepper_value".to_string());
        (auth, users)
    }

    fn register_request(username: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    fn login_request(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_then_login() {
        let (auth, _) = manager();
        let created = auth
            .register(&register_request("kody", "twixrox"))
            .await
            .unwrap()
            .expect("user should be created");

        let user = auth
            .login(&login_request("kody", "twixrox"))
            .await
            .unwrap()
            .expect("login should succeed");
        assert_eq!(user.id, created.id);
    }

    #[tokio::test]
    async fn test_password_is_stored_hashed() {
        let (auth, users) = manager();
        auth.register(&register_request("kody", "twixrox"))
            .await
            .unwrap();

        let stored = users.find_by_username("kody").await.unwrap().unwrap();
        assert_ne!(stored.password_hash, "twixrox");
        assert!(stored.password_hash.starts_with("$argon2"));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let (auth, _) = manager();
        auth.register(&register_request("kody", "twixrox"))
            .await
            .unwrap();

        let result = auth.login(&login_request("kody", "wrong-pass")).await.unwrap();
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn test_login_unknown_user() {
        let (auth, _) = manager();
        let result = auth.login(&login_request("nobody", "twixrox")).await.unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_dummy_hash_matches_default_cost() {
        let parsed = PasswordHash::new(DUMMY_PASSWORD_HASH).unwrap();
        let params = argon2::Params::try_from(&parsed).unwrap();
        let defaults = argon2::Params::default();
        assert_eq!(params.m_cost(), defaults.m_cost());
        assert_eq!(params.t_cost(), defaults.t_cost());
        assert_eq!(params.p_cost(), defaults.p_cost());
    }

    #[test]
    fn test_dummy_hash_rejects_passwords() {
        let (auth, _) = manager();
        assert!(matches!(
            auth.verify_password("twixrox", DUMMY_PASSWORD_HASH),
            Err(AuthError::InvalidPassword)
        ));
    }

    #[tokio::test]
    async fn test_register_duplicate_returns_none() {
        let (auth, users) = manager();
        auth.register(&register_request("kody", "twixrox"))
            .await
            .unwrap();

        let second = auth
            .register(&register_request("kody", "another1"))
            .await
            .unwrap();
        assert!(second.is_none());
        assert_eq!(users.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_pepper_is_part_of_hash() {
        let users = Arc::new(MemoryUserRepository::new());
        let first = AuthManager::new(users.clone(), "pepper_one_value".to_string());
        let second = AuthManager::new(users, "pepper_two_value".to_string());
        first
            .register(&register_request("kody", "twixrox"))
            .await
            .unwrap();

        let result = second.login(&login_request("kody", "twixrox")).await.unwrap();
        assert!(result.is_none());
    }
}
