//! Store traits for users and sessions, with their PostgreSQL implementations.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::auth::{AuthError, AuthResult, Session, User, UserId};

/// Credential store
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    ///
    /// Fails with [`AuthError::UsernameTaken`] when the username is already
    /// present, even if a concurrent request inserted it.
    async fn create_user(&self, username: &str, password_hash: &str) -> AuthResult<User>;

    /// Find user by username
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>>;
}

/// Session store
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Persist a new session
    async fn create_session(&self, session: &Session) -> AuthResult<()>;

    /// Find session by token
    async fn find_session(&self, token: &str) -> AuthResult<Option<Session>>;

    /// Remove a session; removing an unknown token is not an error
    async fn delete_session(&self, token: &str) -> AuthResult<()>;

    /// Remove every session expired at `now`, returning how many went
    async fn purge_expired(&self, now: DateTime<Utc>) -> AuthResult<u64>;
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        password_hash: row.get("password_hash"),
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
    }
}

/// PostgreSQL implementation of `UserRepository`
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(&self, username: &str, password_hash: &str) -> AuthResult<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AuthError::UsernameTaken,
            other => AuthError::Database(other),
        })?;

        Ok(user_from_row(&row))
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let row =
            sqlx::query("SELECT id, username, password_hash, created_at FROM users WHERE id = $1")
                .bind(user_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.as_ref().map(user_from_row))
    }
}

/// PostgreSQL implementation of `SessionRepository`
pub struct PgSessionRepository {
    pool: PgPool,
}

impl PgSessionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SessionRepository for PgSessionRepository {
    async fn create_session(&self, session: &Session) -> AuthResult<()> {
        sqlx::query(
            r#"
            INSERT INTO sessions (token, user_id, created_at, expires_at)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(&session.token)
        .bind(session.user_id)
        .bind(session.created_at.naive_utc())
        .bind(session.expires_at.naive_utc())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_session(&self, token: &str) -> AuthResult<Option<Session>> {
        let row = sqlx::query(
            "SELECT token, user_id, created_at, expires_at FROM sessions WHERE token = $1",
        )
        .bind(token)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| Session {
            token: r.get("token"),
            user_id: r.get("user_id"),
            created_at: r.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
            expires_at: r.get::<chrono::NaiveDateTime, _>("expires_at").and_utc(),
        }))
    }

    async fn delete_session(&self, token: &str) -> AuthResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = $1")
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now.naive_utc())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
