//! In-memory session store.

use async_trait::async_trait;
use chrono::Duration;
use googlefed_access::{SessionData, SessionStore, SessionStoreError, StoredSession};
use googlefed_core::SessionId;
use rootcause::Report;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Keeps sessions in process memory.
///
/// Sessions do not survive a restart. Each save extends the session's
/// lifetime by the configured duration.
#[derive(Debug)]
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<SessionId, StoredSession>>,
    duration: Duration,
}

impl MemorySessionStore {
    /// Creates an empty store whose sessions live for `duration` after their last save.
    #[must_use]
    pub fn new(duration: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            duration,
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: &SessionId) -> Result<Option<SessionData>, Report<SessionStoreError>> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .get(id)
            .filter(|stored| !stored.is_expired())
            .map(|stored| stored.data().clone()))
    }

    async fn save(
        &self,
        id: &SessionId,
        data: &SessionData,
    ) -> Result<(), Report<SessionStoreError>> {
        let mut data = data.clone();
        data.mark_saved();

        let mut sessions = self.sessions.write().await;
        match sessions.get_mut(id) {
            Some(stored) => stored.refresh(data, self.duration),
            None => {
                sessions.insert(id.clone(), StoredSession::new(data, self.duration));
            }
        }
        Ok(())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), Report<SessionStoreError>> {
        self.sessions.write().await.remove(id);
        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64, Report<SessionStoreError>> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, stored| !stored.is_expired());
        Ok((before - sessions.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use googlefed_access::USERNAME_KEY;

    fn session_with_user() -> SessionData {
        let mut data = SessionData::new();
        data.insert(USERNAME_KEY, "alice@good.org");
        data
    }

    #[tokio::test]
    async fn save_then_load() {
        let store = MemorySessionStore::new(Duration::hours(1));
        let id = SessionId::generate();

        store.save(&id, &session_with_user()).await.expect("save");
        let loaded = store.load(&id).await.expect("load").expect("present");

        assert_eq!(loaded.username(), Some("alice@good.org"));
        assert!(!loaded.is_modified());
    }

    #[tokio::test]
    async fn unknown_session_loads_as_none() {
        let store = MemorySessionStore::new(Duration::hours(1));
        assert!(store.load(&SessionId::generate()).await.expect("load").is_none());
    }

    #[tokio::test]
    async fn expired_session_is_invisible_and_cleaned_up() {
        let store = MemorySessionStore::new(Duration::seconds(-1));
        let id = SessionId::generate();
        store.save(&id, &session_with_user()).await.expect("save");

        assert!(store.load(&id).await.expect("load").is_none());
        assert_eq!(store.delete_expired().await.expect("cleanup"), 1);
        assert_eq!(store.delete_expired().await.expect("cleanup"), 0);
    }

    #[tokio::test]
    async fn delete_removes_session() {
        let store = MemorySessionStore::new(Duration::hours(1));
        let id = SessionId::generate();
        store.save(&id, &session_with_user()).await.expect("save");
        store.delete(&id).await.expect("delete");
        assert!(store.load(&id).await.expect("load").is_none());
    }
}
