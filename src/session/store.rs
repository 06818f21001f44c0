//! Session store
//!
//! The only state shared across requests. A single lock serializes every
//! access to the underlying map; callers never see the map itself.

use log::{debug, info};
use std::collections::HashMap;
use std::time::{Duration, SystemTime};
use tokio::sync::Mutex;
use uuid::Uuid;

/// One authenticated login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub username: String,
    pub token: String,
    pub expires_at: SystemTime,
}

impl Session {
    /// Valid strictly before `expires_at`.
    pub fn is_valid_at(&self, now: SystemTime) -> bool {
        now < self.expires_at
    }
}

/// Registry of live sessions with absolute expiry.
#[derive(Debug)]
pub struct SessionStore {
    sessions: Mutex<HashMap<String, Session>>,
    duration: Duration,
}

impl SessionStore {
    pub fn new(duration: Duration) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            duration,
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Creates a session for `username` expiring one session duration from now.
    pub async fn create(&self, username: &str) -> Session {
        self.create_at(username, SystemTime::now()).await
    }

    pub async fn create_at(&self, username: &str, now: SystemTime) -> Session {
        let mut sessions = self.sessions.lock().await;

        // Random tokens; regenerate on the (negligible) chance of a live collision.
        let mut token = new_token();
        while sessions.contains_key(&token) {
            token = new_token();
        }

        let session = Session {
            username: username.to_string(),
            token: token.clone(),
            expires_at: now + self.duration,
        };
        sessions.insert(token, session.clone());
        info!(
            "Session created for user {} ({} active)",
            username,
            sessions.len()
        );
        session
    }

    /// Returns the session for `token` if it exists and has not expired. An
    /// expired session is removed on this lookup.
    pub async fn validate(&self, token: &str) -> Option<Session> {
        self.validate_at(token, SystemTime::now()).await
    }

    pub async fn validate_at(&self, token: &str, now: SystemTime) -> Option<Session> {
        let mut sessions = self.sessions.lock().await;
        match sessions.get(token) {
            Some(session) if session.is_valid_at(now) => Some(session.clone()),
            Some(_) => {
                if let Some(expired) = sessions.remove(token) {
                    debug!("Session expired for user {}", expired.username);
                }
                None
            }
            None => None,
        }
    }

    /// Removes `token`. Absent tokens are ignored.
    pub async fn invalidate(&self, token: &str) {
        let mut sessions = self.sessions.lock().await;
        if let Some(session) = sessions.remove(token) {
            info!("Session invalidated for user {}", session.username);
        }
    }

    #[cfg(test)]
    async fn holds(&self, token: &str) -> bool {
        self.sessions.lock().await.contains_key(token)
    }
}

fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    #[tokio::test]
    async fn validate_returns_the_created_username() {
        let store = SessionStore::new(DAY);
        let session = store.create("alice").await;
        let found = store.validate(&session.token).await.unwrap();
        assert_eq!(found.username, "alice");
        assert_eq!(found, session);
    }

    #[tokio::test]
    async fn expiry_is_absolute_from_creation() {
        let store = SessionStore::new(DAY);
        let created = SystemTime::UNIX_EPOCH + Duration::from_secs(1_000_000);
        let session = store.create_at("bob", created).await;
        assert_eq!(session.expires_at, created + DAY);

        let one_sec = Duration::from_secs(1);
        assert!(
            store
                .validate_at(&session.token, session.expires_at - one_sec)
                .await
                .is_some()
        );
        assert!(
            store
                .validate_at(&session.token, session.expires_at + one_sec)
                .await
                .is_none()
        );
        assert!(!store.holds(&session.token).await);
        assert!(
            store
                .validate_at(&session.token, session.expires_at - one_sec)
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn session_is_invalid_exactly_at_expiry() {
        let store = SessionStore::new(DAY);
        let session = store.create("carol").await;
        assert!(store.validate_at(&session.token, session.expires_at).await.is_none());
    }

    #[tokio::test]
    async fn invalidate_is_idempotent() {
        let store = SessionStore::new(DAY);
        let session = store.create("alice").await;
        store.invalidate(&session.token).await;
        store.invalidate(&session.token).await;
        store.invalidate("never-issued").await;
        assert!(store.validate(&session.token).await.is_none());
    }

    #[tokio::test]
    async fn unknown_token_is_invalid() {
        let store = SessionStore::new(DAY);
        assert!(store.validate("").await.is_none());
        assert!(store.validate("nope").await.is_none());
    }

    #[tokio::test]
    async fn concurrent_creates_yield_distinct_tokens() {
        let store = Arc::new(SessionStore::new(DAY));
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = Arc::clone(&store);
            handles.push(tokio::spawn(async move {
                store.create(&format!("user{i}")).await.token
            }));
        }
        let mut tokens = Vec::new();
        for handle in handles {
            tokens.push(handle.await.unwrap());
        }
        tokens.sort();
        tokens.dedup();
        assert_eq!(tokens.len(), 32);
    }
}
