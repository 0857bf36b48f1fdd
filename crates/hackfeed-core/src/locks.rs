//! Per-entity serialization of mutating operations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// A set of async mutexes addressed by key.
///
/// Operations on the same key run one after another; operations on different
/// keys do not wait for each other. Entries nobody holds or waits on are
/// pruned on the next acquisition.
#[derive(Debug, Default)]
pub struct KeyedLocks {
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl KeyedLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until `key` is free and returns a guard holding it.
    pub async fn lock(&self, key: &str) -> OwnedMutexGuard<()> {
        let entry = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|k, m| k == key || Arc::strong_count(m) > 1);
            locks.entry(key.to_string()).or_default().clone()
        };
        entry.lock_owned().await
    }

    /// Returns true while some task holds the lock for `key`.
    pub fn is_locked(&self, key: &str) -> bool {
        let locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks
            .get(key)
            .map(|m| m.try_lock().is_err())
            .unwrap_or(false)
    }

    #[cfg(test)]
    fn tracked(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
