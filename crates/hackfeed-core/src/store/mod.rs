//! Persistent session store.
//!
//! A small durable key/value store holding the credentials of the
//! authenticated user and a cached copy of their favorites. Values are
//! strings; the favorites list is stored as a JSON array.
//!
//! # Module Structure
//!
//! - `memory`: in-process implementation used by tests and ephemeral sessions
//!
//! File-backed storage lives in the infrastructure crate.

mod memory;

pub use memory::MemorySessionStore;

use std::collections::BTreeSet;
use std::fmt;

use crate::error::Result;
use crate::model::{Credentials, Identity};

/// Keys of the persistent session store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StoreKey {
    Token,
    Username,
    Name,
    Created,
    Favorites,
}

impl StoreKey {
    /// Every key, in a stable order.
    pub const ALL: [StoreKey; 5] = [
        StoreKey::Token,
        StoreKey::Username,
        StoreKey::Name,
        StoreKey::Created,
        StoreKey::Favorites,
    ];

    /// The key as it appears in storage.
    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::Token => "token",
            StoreKey::Username => "username",
            StoreKey::Name => "name",
            StoreKey::Created => "created",
            StoreKey::Favorites => "favorites",
        }
    }

    /// Parses a stored key name. Unknown names yield `None`.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == name)
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Durable key/value storage scoped to one client installation.
///
/// Calls are synchronous so a write completes before the in-memory change it
/// mirrors is committed. Failures are reported as
/// [`FeedError::StorageUnavailable`](crate::error::FeedError::StorageUnavailable).
pub trait SessionStore: Send + Sync {
    fn get(&self, key: StoreKey) -> Result<Option<String>>;

    fn set(&self, key: StoreKey, value: &str) -> Result<()>;

    fn remove(&self, key: StoreKey) -> Result<()>;

    /// Removes every key, including ones this version never wrote.
    fn clear(&self) -> Result<()>;
}

/// Typed accessors layered over the raw key/value contract.
pub trait SessionStoreExt: SessionStore {
    /// Persists the profile part of an identity (token, username, name, created).
    fn save_identity(&self, identity: &Identity) -> Result<()> {
        self.set(StoreKey::Token, &identity.login_token)?;
        self.set(StoreKey::Username, &identity.username)?;
        self.set(StoreKey::Name, &identity.name)?;
        self.set(StoreKey::Created, &identity.created_at.to_rfc3339())?;
        Ok(())
    }

    /// Returns the stored credentials when both token and username are present.
    fn load_credentials(&self) -> Result<Option<Credentials>> {
        let token = self.get(StoreKey::Token)?.filter(|t| !t.is_empty());
        let username = self.get(StoreKey::Username)?.filter(|u| !u.is_empty());
        Ok(token
            .zip(username)
            .map(|(token, username)| Credentials { token, username }))
    }

    fn save_favorites(&self, favorites: &BTreeSet<String>) -> Result<()> {
        let encoded = serde_json::to_string(favorites)?;
        self.set(StoreKey::Favorites, &encoded)
    }

    /// Cached favorites. A missing key is an empty set.
    fn load_favorites(&self) -> Result<BTreeSet<String>> {
        match self.get(StoreKey::Favorites)? {
            Some(raw) => {
                let ids: Vec<String> = serde_json::from_str(&raw)?;
                Ok(ids.into_iter().collect())
            }
            None => Ok(BTreeSet::new()),
        }
    }
}

impl<T: SessionStore + ?Sized> SessionStoreExt for T {}
