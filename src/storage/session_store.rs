//! The persistent session: one signed-in user (with token) per storage profile.
//!
//! Every write replaces the whole user object and bumps a monotonic version kept in
//! storage next to it. Subscribers receive each new snapshot; another process sharing
//! the same storage file is picked up through [`SessionStore::reload`], which only
//! adopts snapshots newer than the one already held.

use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, warn};

use crate::errors::{ClientError, Result};
use crate::models::{AuthenticatedUser, Role};
use crate::storage::local_storage::{LocalStorage, SharedStorage};

const USER_KEY: &str = "user";
const VERSION_KEY: &str = "sessionVersion";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionSnapshot {
    pub version: u64,
    pub user: Option<AuthenticatedUser>,
}

impl SessionSnapshot {
    pub fn token(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.token.as_deref())
    }

    pub fn is_authenticated(&self) -> bool {
        self.token().is_some()
    }

    pub fn role(&self) -> Role {
        self.user.as_ref().map(|u| u.role).unwrap_or(Role::Guest)
    }
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    storage: SharedStorage,
    tx: Arc<watch::Sender<SessionSnapshot>>,
}

impl SessionStore {
    pub fn new(storage: SharedStorage) -> Self {
        let snapshot = read_snapshot(&storage.lock());
        let (tx, _rx) = watch::channel(snapshot);
        Self { storage, tx: Arc::new(tx) }
    }

    /// Replaces the stored user wholesale. The user and its version land in one write.
    pub fn save(&self, user: &AuthenticatedUser) -> Result<()> {
        let json = serde_json::to_string(user)?;
        let held = self.tx.borrow().version;
        let version = self.storage.lock().update(|entries| {
            let version = next_version(entries, held);
            entries.insert(USER_KEY.to_string(), json);
            entries.insert(VERSION_KEY.to_string(), version.to_string());
            version
        })?;
        debug!("Session saved for {} (version {version})", user.email);
        self.tx.send_replace(SessionSnapshot { version, user: Some(user.clone()) });
        Ok(())
    }

    /// [`save`](Self::save) on the blocking pool, for callers on the runtime.
    pub async fn save_async(&self, user: &AuthenticatedUser) -> Result<()> {
        let store = self.clone();
        let user = user.clone();
        run_blocking(move || store.save(&user)).await
    }

    /// Reads the persisted user. Absent or unreadable data means nobody is signed in.
    pub fn load(&self) -> Option<AuthenticatedUser> {
        read_user(&self.storage.lock())
    }

    /// Forgets the user; everything reading the store falls back to guest.
    pub fn clear(&self) -> Result<()> {
        let held = self.tx.borrow().version;
        let version = self.storage.lock().update(|entries| {
            let version = next_version(entries, held);
            entries.remove(USER_KEY);
            entries.insert(VERSION_KEY.to_string(), version.to_string());
            version
        })?;
        debug!("Session cleared (version {version})");
        self.tx.send_replace(SessionSnapshot { version, user: None });
        Ok(())
    }

    pub async fn clear_async(&self) -> Result<()> {
        let store = self.clone();
        run_blocking(move || store.clear()).await
    }

    /// Adopts the persisted session if another writer stored a newer one.
    /// Returns whether the in-memory snapshot changed.
    pub fn reload(&self) -> Result<bool> {
        let persisted = {
            let mut storage = self.storage.lock();
            storage.reload()?;
            read_snapshot(&storage)
        };
        Ok(self.tx.send_if_modified(|current| {
            if persisted.version > current.version {
                *current = persisted;
                true
            } else {
                false
            }
        }))
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    pub fn current(&self) -> Option<AuthenticatedUser> {
        self.tx.borrow().user.clone()
    }

    pub fn token(&self) -> Option<String> {
        self.tx.borrow().token().map(str::to_string)
    }

    pub fn role(&self) -> Role {
        self.tx.borrow().role()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }
}

fn next_version(entries: &BTreeMap<String, String>, held: u64) -> u64 {
    let persisted: u64 = entries.get(VERSION_KEY).and_then(|v| v.parse().ok()).unwrap_or(0);
    persisted.max(held) + 1
}

async fn run_blocking(f: impl FnOnce() -> Result<()> + Send + 'static) -> Result<()> {
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ClientError::Unexpected(format!("Session storage task failed: {e}")))?
}

fn read_user(storage: &LocalStorage) -> Option<AuthenticatedUser> {
    let raw = storage.get(USER_KEY)?;
    match serde_json::from_str(&raw) {
        Ok(user) => Some(user),
        Err(e) => {
            warn!("Failed to parse stored user, treating as signed out: {e}");
            None
        }
    }
}

fn read_version(storage: &LocalStorage) -> u64 {
    storage.get(VERSION_KEY).and_then(|v| v.parse().ok()).unwrap_or(0)
}

fn read_snapshot(storage: &LocalStorage) -> SessionSnapshot {
    SessionSnapshot { version: read_version(storage), user: read_user(storage) }
}
