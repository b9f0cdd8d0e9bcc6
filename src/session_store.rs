//! In-memory, TTL-scoped session storage. A session is the sole owner of
//! everything derived during one `analyze -> recommend -> execute`
//! lifecycle; nothing here is ever persisted to disk.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::domain::{RcaError, Result, Session, SessionId};

#[derive(Clone)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<SessionId, Session>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub async fn insert(&self, session: Session) -> SessionId {
        let id = session.id;
        self.sessions.write().await.insert(id, session);
        id
    }

    pub async fn get(&self, id: SessionId) -> Result<Session> {
        let mut sessions = self.sessions.write().await;
        let now = chrono::Utc::now();
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| RcaError::SessionExpired(id.to_string()))?;
        if session.is_expired(now) {
            sessions.remove(&id);
            return Err(RcaError::SessionExpired(id.to_string()));
        }
        session.touch(now);
        Ok(session.clone())
    }

    /// Applies a mutation under the store's single serialized write path,
    /// then returns the value the mutation produced.
    pub async fn with_mut<F, R>(&self, id: SessionId, f: F) -> Result<R>
    where
        F: FnOnce(&mut Session) -> R,
    {
        let mut sessions = self.sessions.write().await;
        let now = chrono::Utc::now();
        let session = sessions
            .get_mut(&id)
            .ok_or_else(|| RcaError::SessionExpired(id.to_string()))?;
        if session.is_expired(now) {
            sessions.remove(&id);
            return Err(RcaError::SessionExpired(id.to_string()));
        }
        session.touch(now);
        Ok(f(session))
    }

    /// Drops every session idle past its TTL. Intended to run on a
    /// background interval; never called from a request path.
    pub async fn sweep_expired(&self) -> usize {
        let now = chrono::Utc::now();
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        let removed = before - sessions.len();
        if removed > 0 {
            info!(removed, "swept expired sessions");
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn expired_session_is_rejected() {
        let store = SessionStore::new();
        let mut session = Session::new("acme", 30, 0);
        session.created_at -= chrono::Duration::seconds(10);
        session.last_accessed_at -= chrono::Duration::seconds(10);
        let id = store.insert(session).await;
        assert!(store.get(id).await.is_err());
    }

    #[tokio::test]
    async fn fresh_session_is_retrievable() {
        let store = SessionStore::new();
        let session = Session::new("acme", 30, 3600);
        let id = store.insert(session).await;
        assert!(store.get(id).await.is_ok());
    }
}
