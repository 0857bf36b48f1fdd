//! Controller tying the engines to one explicit session state.

use std::sync::{Arc, PoisonError, RwLock};

use crate::error::Result;
use crate::favorites::FavoritesEngine;
use crate::feed::FeedEngine;
use crate::model::{FeedView, Identity, Story, ViewItem};
use crate::remote::RemoteService;
use crate::session::SessionManager;
use crate::state::SessionState;
use crate::store::SessionStore;

/// The client a front end drives.
///
/// `NewsClient` owns the [`SessionState`] and hands it by reference to the
/// session, favorites and feed engines. User actions go through it; each one
/// ends with the list reloaded from the server and the active view projected
/// again, so nothing the renderer sees is local-only state.
pub struct NewsClient {
    state: Arc<SessionState>,
    session: SessionManager,
    favorites: Arc<FavoritesEngine>,
    feed: FeedEngine,
    active_view: RwLock<FeedView>,
}

impl NewsClient {
    pub fn new(remote: Arc<dyn RemoteService>, store: Arc<dyn SessionStore>) -> Self {
        let state = Arc::new(SessionState::new());
        let favorites = Arc::new(FavoritesEngine::new(
            state.clone(),
            remote.clone(),
            store.clone(),
        ));
        let session = SessionManager::new(state.clone(), remote.clone(), store, favorites.clone());
        let feed = FeedEngine::new(state.clone(), remote);

        Self {
            state,
            session,
            favorites,
            feed,
            active_view: RwLock::new(FeedView::All),
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn session(&self) -> &SessionManager {
        &self.session
    }

    pub fn favorites(&self) -> &FavoritesEngine {
        &self.favorites
    }

    pub fn feed(&self) -> &FeedEngine {
        &self.feed
    }

    /// Startup sequence: cached favorites, stored session, first fetch.
    ///
    /// A session that cannot be restored leaves the client logged out; only a
    /// failed story fetch is reported.
    pub async fn start(&self) -> Result<Vec<ViewItem>> {
        if let Err(e) = self.favorites.restore_cached() {
            tracing::warn!(error = %e, "Ignoring unreadable cached favorites");
        }
        self.session.rehydrate().await;
        self.refresh().await
    }

    /// Reloads the master list and projects the active view.
    ///
    /// This is the one reload path of the client. On failure the previous
    /// snapshot stays in place.
    pub async fn refresh(&self) -> Result<Vec<ViewItem>> {
        self.feed.load_master().await?;
        Ok(self.current_view())
    }

    pub fn active_view(&self) -> FeedView {
        *self
            .active_view
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Projects the active view from the current snapshot without fetching.
    pub fn current_view(&self) -> Vec<ViewItem> {
        self.feed.project(self.active_view())
    }

    /// Switches the active view and projects it.
    pub fn show(&self, view: FeedView) -> Vec<ViewItem> {
        *self
            .active_view
            .write()
            .unwrap_or_else(PoisonError::into_inner) = view;
        tracing::debug!(%view, "Switched view");
        self.current_view()
    }

    pub fn is_favorite(&self, story_id: &str) -> bool {
        self.favorites.is_favorite(story_id)
    }

    pub fn current_identity(&self) -> Option<Identity> {
        self.session.current()
    }

    // ============================================================================
    // User actions
    // ============================================================================

    pub async fn login(&self, username: &str, password: &str) -> Result<Identity> {
        let identity = self.session.login(username, password).await?;
        self.refresh_after("login").await;
        Ok(identity)
    }

    pub async fn register(&self, username: &str, password: &str, name: &str) -> Result<Identity> {
        let identity = self.session.register(username, password, name).await?;
        self.refresh_after("registration").await;
        Ok(identity)
    }

    /// Logs out and falls back to the public view.
    pub async fn logout(&self) -> Result<()> {
        let result = self.session.logout();
        self.show(FeedView::All);
        self.refresh_after("logout").await;
        result
    }

    /// Toggles a favorite and returns the new membership.
    pub async fn toggle_favorite(&self, story_id: &str) -> Result<bool> {
        let now_favorite = self.favorites.toggle(story_id).await?;
        self.refresh_after("favorite toggle").await;
        Ok(now_favorite)
    }

    /// Submits a story. The feed engine reloads the list itself.
    pub async fn submit_story(&self, title: &str, url: &str) -> Result<Story> {
        self.feed.submit_story(title, url).await
    }

    /// Deletes a story. The feed engine reloads the list itself.
    pub async fn delete_story(&self, story_id: &str) -> Result<()> {
        self.feed.delete_story(story_id).await
    }

    /// Reload after a successful action; a failure only leaves the view stale.
    async fn refresh_after(&self, action: &str) {
        if let Err(e) = self.feed.load_master().await {
            tracing::warn!(action, error = %e, "Reload failed, view may be stale");
        }
    }
}
