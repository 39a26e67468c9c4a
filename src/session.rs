//! Session State: the one current `(token, role, user id, username)` record.
//!
//! Persisted as a single Sled value so a reader never sees a half-written
//! session. Last writer wins; there is no compare-and-swap.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

use crate::models::Role;
use crate::storage::{Storage, StorageResult};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub role: Role,
    pub user_id: u64,
    pub username: String,
}

#[derive(Clone)]
pub struct SessionState {
    storage: Storage,
}

impl SessionState {
    pub fn new(storage: Storage) -> Self {
        Self { storage }
    }

    pub fn set(&self, session: &Session) -> StorageResult<()> {
        self.storage.store_session(session)
    }

    pub fn clear(&self) -> StorageResult<()> {
        self.storage.remove_session()
    }

    /// An unreadable record counts as no session
    pub fn current(&self) -> Option<Session> {
        match self.storage.load_session::<Session>() {
            Ok(session) => session,
            Err(e) => {
                warn!("ignoring unreadable session record: {}", e);
                None
            }
        }
    }

    pub fn token(&self) -> Option<String> {
        self.current().map(|s| s.token).filter(|t| !t.is_empty())
    }

    /// Role of the current session, USER when there is none
    pub fn role(&self) -> Role {
        self.current().map(|s| s.role).unwrap_or_default()
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.current().map(|s| s.role == Role::Admin).unwrap_or(false)
    }

    /// Subscribe to session writes made through any handle on the same database
    pub fn watch(&self) -> SessionWatcher {
        SessionWatcher {
            subscriber: self.storage.watch_session(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionChange {
    SignedIn(Session),
    SignedOut,
}

/// Advisory change feed for resynchronising a surface's view of the session
pub struct SessionWatcher {
    subscriber: sled::Subscriber,
}

impl SessionWatcher {
    /// Blocks up to `timeout` for the next change
    pub fn next_change(&mut self, timeout: Duration) -> Option<SessionChange> {
        match self.subscriber.next_timeout(timeout).ok()? {
            sled::Event::Insert { value, .. } => match serde_json::from_slice::<Session>(&value) {
                Ok(session) => Some(SessionChange::SignedIn(session)),
                Err(_) => Some(SessionChange::SignedOut),
            },
            sled::Event::Remove { .. } => Some(SessionChange::SignedOut),
        }
    }
    /// Consume every pending change and return the latest one
    pub fn latest(&mut self, timeout: Duration) -> Option<SessionChange> {
        let mut last = None;
        while let Some(change) = self.next_change(timeout) {
            last = Some(change);
        }
        last
    }
}
