//! In-process stores for tests and database-less runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::repository::{SessionRepository, UserRepository};
use crate::auth::{AuthError, AuthResult, Session, User, UserId};

#[derive(Default)]
struct UserTable {
    by_id: HashMap<UserId, User>,
    next_id: UserId,
}

/// Users kept in a map; usernames are unique like the `users` table.
#[derive(Default)]
pub struct MemoryUserRepository {
    table: RwLock<UserTable>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.table.read().await.by_id.len()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn create_user(&self, username: &str, password_hash: &str) -> AuthResult<User> {
        // Check and insert under one write lock.
        let mut table = self.table.write().await;
        if table.by_id.values().any(|u| u.username == username) {
            return Err(AuthError::UsernameTaken);
        }

        table.next_id += 1;
        let user = User {
            id: table.next_id,
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: Utc::now(),
        };
        table.by_id.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<User>> {
        let table = self.table.read().await;
        Ok(table.by_id.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        Ok(self.table.read().await.by_id.get(&user_id).cloned())
    }
}

#[derive(Default)]
pub struct MemorySessionRepository {
    sessions: RwLock<HashMap<String, Session>>,
}

impl MemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl SessionRepository for MemorySessionRepository {
    async fn create_session(&self, session: &Session) -> AuthResult<()> {
        self.sessions
            .write()
            .await
            .insert(session.token.clone(), session.clone());
        Ok(())
    }

    async fn find_session(&self, token: &str) -> AuthResult<Option<Session>> {
        Ok(self.sessions.read().await.get(token).cloned())
    }

    async fn delete_session(&self, token: &str) -> AuthResult<()> {
        self.sessions.write().await.remove(token);
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, session| !session.is_expired(now));
        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_create_and_find_user() {
        let repo = MemoryUserRepository::new();
        let user = repo.create_user("kody", "hash").await.unwrap();

        let by_name = repo.find_by_username("kody").await.unwrap().unwrap();
        let by_id = repo.find_by_id(user.id).await.unwrap().unwrap();
        assert_eq!(by_name.id, user.id);
        assert_eq!(by_id.username, "kody");
        assert!(repo.find_by_username("KODY").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_rejected() {
        let repo = MemoryUserRepository::new();
        repo.create_user("kody", "hash").await.unwrap();

        let err = repo.create_user("kody", "other").await.unwrap_err();
        assert!(matches!(err, AuthError::UsernameTaken));
        assert_eq!(repo.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_ids_are_distinct() {
        let repo = MemoryUserRepository::new();
        let a = repo.create_user("alpha", "hash").await.unwrap();
        let b = repo.create_user("bravo", "hash").await.unwrap();
        assert_ne!(a.id, b.id);
    }

    #[tokio::test]
    async fn test_session_lifecycle() {
        let repo = MemorySessionRepository::new();
        let now = Utc::now();
        let session = Session {
            token: "abc".to_string(),
            user_id: 3,
            created_at: now,
            expires_at: now + Duration::days(1),
        };

        repo.create_session(&session).await.unwrap();
        assert_eq!(repo.find_session("abc").await.unwrap(), Some(session));

        repo.delete_session("abc").await.unwrap();
        assert!(repo.find_session("abc").await.unwrap().is_none());
        repo.delete_session("abc").await.unwrap();
        assert_eq!(repo.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_purge_expired_keeps_live_sessions() {
        let repo = MemorySessionRepository::new();
        let now = Utc::now();
        for (token, offset) in [("old", -1), ("edge", 0), ("live", 1)] {
            repo.create_session(&Session {
                token: token.to_string(),
                user_id: 1,
                created_at: now - Duration::days(2),
                expires_at: now + Duration::hours(offset),
            })
            .await
            .unwrap();
        }

        assert_eq!(repo.purge_expired(now).await.unwrap(), 2);
        assert_eq!(repo.session_count().await, 1);
        assert!(repo.find_session("live").await.unwrap().is_some());
        assert_eq!(repo.purge_expired(now).await.unwrap(), 0);
    }
}
