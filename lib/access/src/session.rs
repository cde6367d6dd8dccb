//! Request-scoped session data and the contract for its backing store.
//!
//! A request loads its [`SessionData`] once, reads and mutates it while the
//! handler runs, and hands it back to the [`SessionStore`] afterwards. The
//! login protocol only ever touches two keys: [`USERNAME_KEY`] and
//! [`NEXT_KEY`].

use crate::error::SessionStoreError;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use googlefed_core::SessionId;
use rootcause::Report;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Session key holding the authenticated external username.
pub const USERNAME_KEY: &str = "username";

/// Session key holding the post-login return URL.
pub const NEXT_KEY: &str = "next";

/// String-keyed values of one browser session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionData {
    values: BTreeMap<String, String>,
    #[serde(skip)]
    modified: bool,
    #[serde(skip)]
    invalidated: bool,
}

impl SessionData {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Stores `value` under `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
        self.modified = true;
    }

    /// Removes and returns the value stored under `key`.
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let removed = self.values.remove(key);
        if removed.is_some() {
            self.modified = true;
        }
        removed
    }

    /// Drops every value and marks the session for deletion from the store.
    pub fn invalidate(&mut self) {
        self.values.clear();
        self.invalidated = true;
        self.modified = true;
    }

    /// Returns the authenticated external username, ignoring blank values.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.get(USERNAME_KEY).filter(|u| !u.is_empty())
    }

    /// Returns the pending return URL.
    #[must_use]
    pub fn next_url(&self) -> Option<&str> {
        self.get(NEXT_KEY)
    }

    /// Returns true if the session changed since it was loaded.
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    /// Returns true if the session was destroyed during this request.
    #[must_use]
    pub fn is_invalidated(&self) -> bool {
        self.invalidated
    }

    /// Returns true if no values are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Clears the change flags, as after a successful save.
    pub fn mark_saved(&mut self) {
        self.modified = false;
        self.invalidated = false;
    }
}

/// A session as held by a backing store, with its lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredSession {
    /// The session's values.
    data: SessionData,
    /// When the session was created.
    created_at: DateTime<Utc>,
    /// When the session expires.
    expires_at: DateTime<Utc>,
}

impl StoredSession {
    /// Creates a stored session valid for `duration`.
    #[must_use]
    pub fn new(data: SessionData, duration: Duration) -> Self {
        let now = Utc::now();
        Self {
            data,
            created_at: now,
            expires_at: now + duration,
        }
    }

    /// Returns the session's values.
    #[must_use]
    pub fn data(&self) -> &SessionData {
        &self.data
    }

    /// Returns when the session was created.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Returns when the session expires.
    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.expires_at
    }

    /// Returns true if the session has expired.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        Utc::now() >= self.expires_at
    }

    /// Replaces the values and extends expiration.
    pub fn refresh(&mut self, data: SessionData, duration: Duration) {
        self.data = data;
        self.expires_at = Utc::now() + duration;
    }
}

/// Server-side session persistence.
///
/// Expiry is owned by the store: an expired session must load as `None`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads the session, or `None` if it is unknown or expired.
    async fn load(&self, id: &SessionId) -> Result<Option<SessionData>, Report<SessionStoreError>>;

    /// Saves the session and extends its expiry.
    async fn save(&self, id: &SessionId, data: &SessionData)
    -> Result<(), Report<SessionStoreError>>;

    /// Deletes the session.
    async fn delete(&self, id: &SessionId) -> Result<(), Report<SessionStoreError>>;

    /// Deletes every expired session, returning how many were removed.
    async fn delete_expired(&self) -> Result<u64, Report<SessionStoreError>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_session_is_clean() {
        let session = SessionData::new();
        assert!(session.is_empty());
        assert!(!session.is_modified());
        assert!(!session.is_invalidated());
        assert!(session.username().is_none());
    }

    #[test]
    fn insert_and_remove_track_modification() {
        let mut session = SessionData::new();
        session.insert(NEXT_KEY, "/reports");
        assert!(session.is_modified());
        assert_eq!(session.next_url(), Some("/reports"));

        session.mark_saved();
        assert_eq!(session.remove("missing"), None);
        assert!(!session.is_modified());

        assert_eq!(session.remove(NEXT_KEY).as_deref(), Some("/reports"));
        assert!(session.is_modified());
        assert!(session.next_url().is_none());
    }

    #[test]
    fn blank_username_is_absent() {
        let mut session = SessionData::new();
        session.insert(USERNAME_KEY, "");
        assert!(session.username().is_none());
    }

    #[test]
    fn invalidate_clears_everything() {
        let mut session = SessionData::new();
        session.insert(USERNAME_KEY, "alice@good.org");
        session.insert(NEXT_KEY, "/");
        session.invalidate();

        assert!(session.is_empty());
        assert!(session.is_invalidated());
        assert!(session.username().is_none());
    }

    #[test]
    fn session_data_serializes_values_only() {
        let mut session = SessionData::new();
        session.insert(USERNAME_KEY, "alice@good.org");
        let json = serde_json::to_string(&session).expect("serialize");
        assert_eq!(json, r#"{"username":"alice@good.org"}"#);

        let parsed: SessionData = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed.username(), Some("alice@good.org"));
        assert!(!parsed.is_modified());
    }

    #[test]
    fn stored_session_expiration() {
        let expired = StoredSession::new(SessionData::new(), Duration::seconds(-1));
        assert!(expired.is_expired());

        let live = StoredSession::new(SessionData::new(), Duration::hours(1));
        assert!(!live.is_expired());
        assert!(live.expires_at() > live.created_at());
    }

    #[test]
    fn stored_session_refresh_extends_expiry() {
        let mut stored = StoredSession::new(SessionData::new(), Duration::seconds(1));
        let old_expires = stored.expires_at();

        let mut data = SessionData::new();
        data.insert(USERNAME_KEY, "alice@good.org");
        stored.refresh(data, Duration::hours(2));

        assert!(stored.expires_at() > old_expires);
        assert_eq!(stored.data().username(), Some("alice@good.org"));
    }
}
