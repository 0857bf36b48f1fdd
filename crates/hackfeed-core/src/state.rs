//! Explicit session state shared by the engines.

use std::collections::BTreeSet;
use std::sync::{Arc, PoisonError, RwLock};

use crate::model::{Credentials, Identity, SharedSnapshot, StorySnapshot};

/// Everything the client knows about the current session.
///
/// One instance is owned by the [`NewsClient`](crate::client::NewsClient) and
/// shared by reference with the session, favorites and feed engines. Reads are
/// synchronous and never suspend; guards are never held across an `.await`.
#[derive(Debug, Default)]
pub struct SessionState {
    identity: RwLock<Option<Identity>>,
    favorites: RwLock<BTreeSet<String>>,
    snapshot: RwLock<SharedSnapshot>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    // ============================================================================
    // Identity
    // ============================================================================

    pub fn identity(&self) -> Option<Identity> {
        self.identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_logged_in(&self) -> bool {
        self.identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    pub fn credentials(&self) -> Option<Credentials> {
        self.identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(Identity::credentials)
    }

    /// Display name of the logged-in user.
    pub fn display_name(&self) -> Option<String> {
        self.identity
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|i| i.name.clone())
    }

    pub(crate) fn set_identity(&self, identity: Identity) {
        *self.identity.write().unwrap_or_else(PoisonError::into_inner) = Some(identity);
    }

    // ============================================================================
    // Favorites
    // ============================================================================

    pub fn favorites(&self) -> BTreeSet<String> {
        self.favorites
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_favorite(&self, story_id: &str) -> bool {
        self.favorites
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(story_id)
    }

    pub(crate) fn replace_favorites(&self, favorites: BTreeSet<String>) {
        if let Some(identity) = self
            .identity
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .as_mut()
        {
            identity.favorites = favorites.clone();
        }
        *self.favorites.write().unwrap_or_else(PoisonError::into_inner) = favorites;
    }

    // ============================================================================
    // Snapshot
    // ============================================================================

    /// The current snapshot. Holding the handle keeps it alive across refreshes.
    pub fn snapshot(&self) -> SharedSnapshot {
        self.snapshot
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(crate) fn replace_snapshot(&self, snapshot: StorySnapshot) -> SharedSnapshot {
        let shared = Arc::new(snapshot);
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = shared.clone();
        shared
    }

    // ============================================================================
    // Lifecycle
    // ============================================================================

    /// Drops identity and favorites. The public snapshot is kept.
    pub fn reset(&self) {
        *self.identity.write().unwrap_or_else(PoisonError::into_inner) = None;
        self.favorites
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn identity() -> Identity {
        Identity {
            username: "ada".to_string(),
            name: "Ada".to_string(),
            login_token: "tok".to_string(),
            created_at: Utc::now(),
            favorites: BTreeSet::new(),
        }
    }

    #[test]
    fn test_new_state_is_logged_out() {
        let state = SessionState::new();
        assert!(!state.is_logged_in());
        assert!(state.credentials().is_none());
        assert!(state.favorites().is_empty());
        assert!(state.snapshot().is_empty());
    }

    #[test]
    fn test_replace_favorites_updates_identity() {
        let state = SessionState::new();
        state.set_identity(identity());
        state.replace_favorites(BTreeSet::from(["s1".to_string()]));

        assert!(state.is_favorite("s1"));
        assert!(state.identity().unwrap().favorites.contains("s1"));
    }

    #[test]
    fn test_reset_keeps_snapshot() {
        let state = SessionState::new();
        state.set_identity(identity());
        state.replace_favorites(BTreeSet::from(["s1".to_string()]));
        state.replace_snapshot(StorySnapshot::new(Vec::new()));

        state.reset();

        assert!(!state.is_logged_in());
        assert!(!state.is_favorite("s1"));
        assert!(state.snapshot().fetched_at().is_some());
    }
}
