use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

use super::{SessionStore, StoreKey};
use crate::error::Result;

/// Session store kept in process memory.
///
/// Nothing survives a restart. Useful for tests and for one-shot sessions
/// that must not touch the disk.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<StoreKey, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: StoreKey) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(&key).cloned())
    }

    fn set(&self, key: StoreKey, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, value.to_string());
        Ok(())
    }

    fn remove(&self, key: StoreKey) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.remove(&key);
        Ok(())
    }

    fn clear(&self) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_get_remove() {
        let store = MemorySessionStore::new();
        assert!(store.get(StoreKey::Token).unwrap().is_none());

        store.set(StoreKey::Token, "abc").unwrap();
        assert_eq!(store.get(StoreKey::Token).unwrap().as_deref(), Some("abc"));

        store.remove(StoreKey::Token).unwrap();
        assert!(store.get(StoreKey::Token).unwrap().is_none());
    }

    #[test]
    fn test_clear_removes_everything() {
        let store = MemorySessionStore::new();
        for key in StoreKey::ALL {
            store.set(key, "x").unwrap();
        }
        assert_eq!(store.len(), 5);

        store.clear().unwrap();
        assert!(store.is_empty());
    }
}
