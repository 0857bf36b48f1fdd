use std::collections::BTreeSet;
use std::sync::Arc;

use crate::error::{FeedError, Result};
use crate::locks::KeyedLocks;
use crate::model::FavoriteRef;
use crate::remote::RemoteService;
use crate::state::SessionState;
use crate::store::{SessionStore, SessionStoreExt};

/// Owns the authoritative favorites set of the logged-in user.
///
/// The server is the source of truth: after every add/remove the collection it
/// returns replaces the local set wholesale. Nothing is committed before the
/// server has answered.
pub struct FavoritesEngine {
    state: Arc<SessionState>,
    remote: Arc<dyn RemoteService>,
    store: Arc<dyn SessionStore>,
    in_flight: KeyedLocks,
}

impl FavoritesEngine {
    pub fn new(
        state: Arc<SessionState>,
        remote: Arc<dyn RemoteService>,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            state,
            remote,
            store,
            in_flight: KeyedLocks::new(),
        }
    }

    /// Replaces the set with `favorites` and writes it through to the store.
    pub fn initialize(&self, favorites: &[FavoriteRef]) -> Result<()> {
        let set = favorites.iter().map(|f| f.story_id.clone()).collect();
        self.commit(set)
    }

    /// Seeds the set from the store's cached copy.
    ///
    /// Lets membership queries answer before the stored identity has been
    /// resolved against the server.
    pub fn restore_cached(&self) -> Result<()> {
        let cached = self.store.load_favorites()?;
        tracing::debug!("Restored {} cached favorites", cached.len());
        self.state.replace_favorites(cached);
        Ok(())
    }

    /// Flips the favorite status of `story_id` on the server.
    ///
    /// Returns the membership of `story_id` in the set the server answered
    /// with. Toggles of the same story wait for each other.
    ///
    /// # Errors
    ///
    /// - `FavoriteSync` when logged out, when the server call fails, or when
    ///   the session changed while the call was in flight. The set is left
    ///   untouched in all three cases.
    /// - `StorageUnavailable` when the new set could not be persisted. The
    ///   in-memory set already follows the server in that case, so memory is
    ///   ahead of the store until the next successful write.
    pub async fn toggle(&self, story_id: &str) -> Result<bool> {
        let entry = self
            .state
            .credentials()
            .ok_or_else(|| FeedError::favorite_sync(story_id, "not logged in"))?;

        let _guard = self.in_flight.lock(story_id).await;

        // A toggle queued behind another must not outlive the session it
        // was issued in.
        let credentials = match self.state.credentials() {
            Some(current) if current == entry => current,
            _ => return Err(FeedError::favorite_sync(story_id, "not logged in")),
        };

        let was_favorite = self.state.is_favorite(story_id);
        let response = if was_favorite {
            tracing::debug!(story_id, "Removing favorite");
            self.remote.remove_favorite(&credentials, story_id).await
        } else {
            tracing::debug!(story_id, "Adding favorite");
            self.remote.add_favorite(&credentials, story_id).await
        };

        let favorites = response.map_err(|e| {
            tracing::warn!(story_id, error = %e, "Favorite toggle failed");
            FeedError::favorite_sync(story_id, e.to_string())
        })?;

        if self.state.credentials().as_ref() != Some(&credentials) {
            return Err(FeedError::favorite_sync(
                story_id,
                "session changed before the server answered",
            ));
        }

        let set: BTreeSet<String> = favorites.into_iter().map(|f| f.story_id).collect();
        let now_favorite = set.contains(story_id);
        self.commit(set)?;
        Ok(now_favorite)
    }

    /// Synchronous membership query.
    pub fn is_favorite(&self, story_id: &str) -> bool {
        self.state.is_favorite(story_id)
    }

    /// Sorted copy of the current set.
    pub fn ids(&self) -> Vec<String> {
        self.state.favorites().into_iter().collect()
    }

    /// Returns true while a toggle of `story_id` is waiting on the server.
    pub fn is_pending(&self, story_id: &str) -> bool {
        self.in_flight.is_locked(story_id)
    }

    /// Drops the in-memory set. The store is left to the caller.
    pub fn clear(&self) {
        self.state.replace_favorites(BTreeSet::new());
    }

    /// Writes `set` to the store, then makes it the in-memory set.
    ///
    /// The in-memory set follows the server even when the write fails; the
    /// write failure is still reported.
    fn commit(&self, set: BTreeSet<String>) -> Result<()> {
        let written = self.store.save_favorites(&set);
        if let Err(e) = &written {
            tracing::warn!(error = %e, "Failed to persist favorites");
        }
        self.state.replace_favorites(set);
        written
    }
}
