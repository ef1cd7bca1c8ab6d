//! Cookie-backed sessions.
//!
//! A session is a random token persisted in a [`SessionRepository`] and handed
//! to the browser in a signed `RJ_session` cookie. The signature is an HMAC
//! keyed from the configured secret, so a cookie whose value was edited no
//! longer resolves to a session.

use async_trait::async_trait;
use chrono::{Duration, Utc};
use cookie::{Cookie, CookieJar, Key, SameSite};
use log::{debug, info, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::auth::{AuthError, AuthResult, Session, UserId};
use crate::db::SessionRepository;

/// Cookie name used for the session token
pub const SESSION_COOKIE_NAME: &str = "RJ_session";

/// Minimum secret length accepted for cookie signing
pub const MIN_SESSION_SECRET_LEN: usize = 32;

/// Session cookie settings
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Secret the signing key is derived from
    pub secret: String,
    /// Name of the session cookie
    pub cookie_name: String,
    /// Whether the cookie carries the `Secure` attribute
    pub secure: bool,
    /// Lifetime of a session and of its cookie
    pub max_age: Duration,
}

impl SessionConfig {
    /// Defaults: `RJ_session`, not secure, 30 days
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            cookie_name: SESSION_COOKIE_NAME.to_string(),
            secure: false,
            max_age: Duration::days(30),
        }
    }
}

/// An HTTP redirect and the cookie that must travel with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub location: String,
    pub set_cookie: String,
}

/// Outcome of a successful authentication: the stored session plus the
/// redirect that hands it to the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRedirect {
    pub session: Session,
    pub redirect: Redirect,
}

/// Issues sessions for authenticated users.
#[async_trait]
pub trait SessionIssuer: Send + Sync {
    /// Persist a session for `user_id` and redirect to `redirect_to` with the
    /// session cookie attached. Call once per successful authentication.
    async fn create_user_session(
        &self,
        user_id: UserId,
        redirect_to: &str,
    ) -> AuthResult<SessionRedirect>;
}

/// Session manager
pub struct SessionManager {
    sessions: Arc<dyn SessionRepository>,
    config: SessionConfig,
    key: Key,
}

impl SessionManager {
    /// Create a new session manager
    ///
    /// # Errors
    ///
    /// * `AuthError::InvalidSessionSecret` - secret shorter than
    ///   [`MIN_SESSION_SECRET_LEN`] bytes
    pub fn new(sessions: Arc<dyn SessionRepository>, config: SessionConfig) -> AuthResult<Self> {
        if config.secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(AuthError::InvalidSessionSecret {
                min: MIN_SESSION_SECRET_LEN,
            });
        }
        let key = Key::derive_from(config.secret.as_bytes());

        Ok(Self {
            sessions,
            config,
            key,
        })
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Resolve the user behind a `Cookie` request header.
    ///
    /// Missing, unsigned or tampered cookies and unknown tokens yield `None`.
    /// An expired session is deleted and also yields `None`.
    pub async fn user_id_from_cookie(&self, cookie_header: &str) -> AuthResult<Option<UserId>> {
        let Some(token) = self.token_from_header(cookie_header) else {
            return Ok(None);
        };

        match self.load_session(&token).await {
            Ok(session) => Ok(Some(session.user_id)),
            Err(AuthError::SessionNotFound | AuthError::SessionExpired) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Destroy the session named by the cookie header and redirect home with
    /// a cookie that clears it in the browser.
    pub async fn logout(&self, cookie_header: &str) -> AuthResult<Redirect> {
        if let Some(token) = self.token_from_header(cookie_header) {
            self.sessions.delete_session(&token).await?;
            info!("Session destroyed");
        }

        let mut removal = self.base_cookie(String::new());
        removal.make_removal();

        Ok(Redirect {
            location: "/".to_string(),
            set_cookie: removal.encoded().to_string(),
        })
    }

    /// Delete every expired session from the store.
    pub async fn purge_expired(&self) -> AuthResult<u64> {
        let purged = self.sessions.purge_expired(Utc::now()).await?;
        if purged > 0 {
            info!("Purged {} expired sessions", purged);
        }
        Ok(purged)
    }

    /// Purge expired sessions every `period` until the task is dropped.
    pub async fn run_purge(self: Arc<Self>, period: std::time::Duration) {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            if let Err(e) = self.purge_expired().await {
                warn!("Session purge failed: {}", e);
            }
        }
    }

    async fn load_session(&self, token: &str) -> AuthResult<Session> {
        let session = self
            .sessions
            .find_session(token)
            .await?
            .ok_or(AuthError::SessionNotFound)?;

        if session.is_expired(Utc::now()) {
            self.sessions.delete_session(token).await?;
            debug!("Dropped expired session for user {}", session.user_id);
            return Err(AuthError::SessionExpired);
        }

        Ok(session)
    }

    fn base_cookie(&self, value: String) -> Cookie<'static> {
        Cookie::build((self.config.cookie_name.clone(), value))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax)
            .secure(self.config.secure)
            .build()
    }

    fn signed_cookie(&self, token: &str) -> String {
        let mut cookie = self.base_cookie(token.to_string());
        cookie.set_max_age(cookie::time::Duration::seconds(
            self.config.max_age.num_seconds(),
        ));

        let mut jar = CookieJar::new();
        jar.signed_mut(&self.key).add(cookie);
        jar.get(&self.config.cookie_name)
            .map(|signed| signed.encoded().to_string())
            .unwrap_or_default()
    }

    fn token_from_header(&self, cookie_header: &str) -> Option<String> {
        let mut jar = CookieJar::new();
        for cookie in Cookie::split_parse_encoded(cookie_header.to_string()).flatten() {
            jar.add_original(cookie.into_owned());
        }

        jar.signed(&self.key)
            .get(&self.config.cookie_name)
            .map(|cookie| cookie.value().to_string())
    }
}

#[async_trait]
impl SessionIssuer for SessionManager {
    async fn create_user_session(
        &self,
        user_id: UserId,
        redirect_to: &str,
    ) -> AuthResult<SessionRedirect> {
        let now = Utc::now();
        let expires_at = now
            .checked_add_signed(self.config.max_age)
            .ok_or(AuthError::SessionLifetimeOutOfRange)?;
        let session = Session {
            token: Uuid::new_v4().to_string(),
            user_id,
            created_at: now,
            expires_at,
        };
        self.sessions.create_session(&session).await?;
        info!("Issued session for user {}", user_id);

        let set_cookie = self.signed_cookie(&session.token);
        Ok(SessionRedirect {
            session,
            redirect: Redirect {
                location: redirect_to.to_string(),
                set_cookie,
            },
        })
    }
}
