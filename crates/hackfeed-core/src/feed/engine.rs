use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::error::{FeedError, Result};
use crate::locks::KeyedLocks;
use crate::model::{FeedView, NewStory, SharedSnapshot, Story, StorySnapshot, ViewItem};
use crate::remote::RemoteService;
use crate::state::SessionState;

use super::hostname_of;

/// Holds the master story list and derives the views the renderer draws.
///
/// Projections are computed from one snapshot handle and one copy of the
/// favorites set, so a refresh landing mid-projection cannot mix two lists.
///
/// # Own stories
///
/// A story counts as "own" when its `author` equals the display name of the
/// logged-in user. Two accounts sharing a display name are indistinguishable
/// to this check, both for the own-stories view and for the delete
/// affordance. The server still decides whether a deletion is allowed.
pub struct FeedEngine {
    state: Arc<SessionState>,
    remote: Arc<dyn RemoteService>,
    submissions: Mutex<()>,
    deletions: KeyedLocks,
}

impl FeedEngine {
    pub fn new(state: Arc<SessionState>, remote: Arc<dyn RemoteService>) -> Self {
        Self {
            state,
            remote,
            submissions: Mutex::new(()),
            deletions: KeyedLocks::new(),
        }
    }

    /// Fetches every story and swaps in the new snapshot.
    ///
    /// # Errors
    ///
    /// `Fetch` when the listing fails; the previous snapshot is kept.
    pub async fn load_master(&self) -> Result<SharedSnapshot> {
        let stories = self.remote.list_stories().await.map_err(|e| {
            tracing::warn!(error = %e, "Failed to load stories");
            FeedError::fetch(e.to_string())
        })?;
        tracing::debug!("Loaded {} stories", stories.len());
        Ok(self.state.replace_snapshot(StorySnapshot::new(stories)))
    }

    /// The snapshot currently projected from.
    pub fn snapshot(&self) -> SharedSnapshot {
        self.state.snapshot()
    }

    // ============================================================================
    // Projections
    // ============================================================================

    /// Every story in snapshot order.
    pub fn project_all(&self) -> Vec<ViewItem> {
        self.project_where(|_| true)
    }

    /// Favorited stories in snapshot order.
    ///
    /// Favorites whose story is no longer listed are skipped.
    pub fn project_favorites(&self) -> Vec<ViewItem> {
        self.project_where(|item| item.is_favorite)
    }

    /// Stories authored under the logged-in user's display name.
    ///
    /// Empty while logged out.
    pub fn project_own_stories(&self) -> Vec<ViewItem> {
        self.project_where(|item| item.is_own_story)
    }

    pub fn project(&self, view: FeedView) -> Vec<ViewItem> {
        match view {
            FeedView::All => self.project_all(),
            FeedView::Favorites => self.project_favorites(),
            FeedView::OwnStories => self.project_own_stories(),
        }
    }

    /// IDs of the stories a delete affordance is offered for.
    pub fn deletable_ids(&self) -> Vec<String> {
        self.project_own_stories()
            .into_iter()
            .map(|item| item.story.story_id)
            .collect()
    }

    fn project_where<F>(&self, keep: F) -> Vec<ViewItem>
    where
        F: Fn(&ViewItem) -> bool,
    {
        let snapshot = self.state.snapshot();
        let favorites = self.state.favorites();
        let display_name = self.state.display_name();

        snapshot
            .stories()
            .iter()
            .map(|story| annotate(story, &favorites, display_name.as_deref()))
            .filter(|item| keep(item))
            .collect()
    }

    // ============================================================================
    // Mutations
    // ============================================================================

    /// Submits a story under the logged-in identity, then reloads the list.
    ///
    /// The story is never appended locally; it appears once the reload
    /// returns it. Submissions run one at a time.
    ///
    /// # Errors
    ///
    /// `Submission` when logged out, on empty input, or when the server
    /// refuses. A failed reload after a successful submission is only logged.
    pub async fn submit_story(&self, title: &str, url: &str) -> Result<Story> {
        if title.trim().is_empty() {
            return Err(FeedError::submission("title must not be empty"));
        }
        if url.trim().is_empty() {
            return Err(FeedError::submission("url must not be empty"));
        }
        let entry = self
            .state
            .credentials()
            .ok_or_else(|| FeedError::submission("not logged in"))?;

        let _guard = self.submissions.lock().await;

        // Re-read under the guard: a queued submission belongs to the session
        // that is current when it runs, or to none.
        let identity = match self.state.identity() {
            Some(identity) if identity.credentials() == entry => identity,
            _ => return Err(FeedError::submission("not logged in")),
        };

        let new_story = NewStory {
            author: identity.name.clone(),
            title: title.to_string(),
            url: url.to_string(),
        };
        let story = self
            .remote
            .create_story(&identity.credentials(), &new_story)
            .await
            .map_err(|e| {
                tracing::warn!(error = %e, "Story submission failed");
                FeedError::submission(e.to_string())
            })?;
        tracing::info!(story_id = %story.story_id, "Story submitted");

        if let Err(e) = self.load_master().await {
            tracing::warn!(error = %e, "Reload after submission failed");
        }
        Ok(story)
    }

    /// Deletes a story on the server, then reloads the list.
    ///
    /// Deletions of the same story run one at a time.
    ///
    /// # Errors
    ///
    /// `Deletion` when logged out or when the server refuses. A failed
    /// reload after a successful deletion is only logged.
    pub async fn delete_story(&self, story_id: &str) -> Result<()> {
        let entry = self
            .state
            .credentials()
            .ok_or_else(|| FeedError::deletion(story_id, "not logged in"))?;

        let _guard = self.deletions.lock(story_id).await;

        let credentials = match self.state.credentials() {
            Some(current) if current == entry => current,
            _ => return Err(FeedError::deletion(story_id, "not logged in")),
        };

        self.remote
            .delete_story(&credentials, story_id)
            .await
            .map_err(|e| {
                tracing::warn!(story_id, error = %e, "Story deletion failed");
                FeedError::deletion(story_id, e.to_string())
            })?;
        tracing::info!(story_id, "Story deleted");

        if let Err(e) = self.load_master().await {
            tracing::warn!(error = %e, "Reload after deletion failed");
        }
        Ok(())
    }
}

fn annotate(story: &Story, favorites: &BTreeSet<String>, display_name: Option<&str>) -> ViewItem {
    ViewItem {
        story: story.clone(),
        hostname: hostname_of(&story.url),
        is_favorite: favorites.contains(&story.story_id),
        is_own_story: display_name.is_some_and(|name| name == story.author),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::favorites::FavoritesEngine;
    use crate::model::FavoriteRef;
    use crate::store::MemorySessionStore;
    use crate::testing::FakeRemote;
    use std::time::Duration;

    struct Fixture {
        remote: Arc<FakeRemote>,
        state: Arc<SessionState>,
        feed: FeedEngine,
        favorites: FavoritesEngine,
    }

    async fn fixture() -> Fixture {
        let remote = Arc::new(
            FakeRemote::new()
                .with_account("ada", "pw", "Ada")
                .with_account("bob", "pw", "Bob"),
        );
        remote.seed_story("Bob one", "https://www.bob.dev/1", "Bob", "bob");
        remote.seed_story("Ada one", "http://ada.org/a", "Ada", "ada");
        remote.seed_story("Bob two", "bob.dev/2", "Bob", "bob");

        let state = Arc::new(SessionState::new());
        let feed = FeedEngine::new(state.clone(), remote.clone());
        let favorites = FavoritesEngine::new(
            state.clone(),
            remote.clone(),
            Arc::new(MemorySessionStore::new()),
        );
        Fixture {
            remote,
            state,
            feed,
            favorites,
        }
    }

    async fn login(f: &Fixture, username: &str) {
        let identity = f.remote.authenticate(username, "pw").await.unwrap();
        let refs = identity.favorite_refs();
        f.state.set_identity(identity);
        f.favorites.initialize(&refs).unwrap();
    }

    fn titles(items: &[ViewItem]) -> Vec<&str> {
        items.iter().map(|i| i.story.title.as_str()).collect()
    }

    #[tokio::test]
    async fn test_project_all_keeps_server_order() {
        let f = fixture().await;
        f.feed.load_master().await.unwrap();

        let all = f.feed.project_all();
        assert_eq!(titles(&all), vec!["Bob two", "Ada one", "Bob one"]);
        assert_eq!(all[0].hostname, "bob.dev");
        assert_eq!(all[2].hostname, "bob.dev");
        assert!(all.iter().all(|i| !i.is_favorite && !i.is_own_story));
    }

    #[tokio::test]
    async fn test_project_before_load_is_empty() {
        let f = fixture().await;
        assert!(f.feed.project_all().is_empty());
        assert!(f.feed.snapshot().fetched_at().is_none());
    }

    #[tokio::test]
    async fn test_project_favorites_in_snapshot_order() {
        let f = fixture().await;
        login(&f, "ada").await;
        let snapshot = f.feed.load_master().await.unwrap();
        let ids: Vec<String> = snapshot.stories().iter().map(|s| s.story_id.clone()).collect();

        // Favorite in reverse display order, plus a story that no longer exists.
        f.favorites
            .initialize(&[
                FavoriteRef::new(ids[2].clone()),
                FavoriteRef::new(ids[0].clone()),
                FavoriteRef::new("gone"),
            ])
            .unwrap();

        let favorites = f.feed.project_favorites();
        assert_eq!(titles(&favorites), vec!["Bob two", "Bob one"]);
        assert!(favorites.iter().all(|i| i.is_favorite));

        let all = f.feed.project_all();
        let all_ids: Vec<&str> = all.iter().map(|i| i.story.story_id.as_str()).collect();
        let mut last = 0;
        for item in &favorites {
            let pos = all_ids
                .iter()
                .position(|id| *id == item.story.story_id)
                .unwrap();
            assert!(pos >= last);
            last = pos;
        }
    }

    #[tokio::test]
    async fn test_project_own_stories_matches_display_name() {
        let f = fixture().await;
        login(&f, "bob").await;
        f.feed.load_master().await.unwrap();

        let own = f.feed.project_own_stories();
        assert_eq!(titles(&own), vec!["Bob two", "Bob one"]);
        assert_eq!(f.feed.deletable_ids().len(), 2);
        assert_eq!(f.feed.project(FeedView::OwnStories), own);
    }

    #[tokio::test]
    async fn test_shared_display_name_is_indistinguishable() {
        let f = fixture().await;
        f.remote
            .seed_story("Other Bob", "https://imposter.io", "Bob", "bob2");
        login(&f, "bob").await;
        f.feed.load_master().await.unwrap();

        let own = f.feed.project_own_stories();
        assert!(own.iter().any(|i| i.story.username == "bob2"));
    }

    #[tokio::test]
    async fn test_own_stories_empty_when_logged_out() {
        let f = fixture().await;
        f.feed.load_master().await.unwrap();
        assert!(f.feed.project_own_stories().is_empty());
        assert!(f.feed.deletable_ids().is_empty());
    }

    #[tokio::test]
    async fn test_submit_reloads_from_server() {
        let f = fixture().await;
        login(&f, "ada").await;
        f.feed.load_master().await.unwrap();

        let story = f.feed.submit_story("T", "  http://x.com ").await.unwrap();

        assert_eq!(story.author, "Ada");
        let snapshot = f.feed.snapshot();
        let listed = snapshot.get(&story.story_id).unwrap();
        assert_eq!(listed.title, "T");
        // The server normalized the URL; the snapshot carries its version.
        assert_eq!(listed.url, "http://x.com");
        assert!(
            f.feed
                .project_own_stories()
                .iter()
                .any(|i| i.story.story_id == story.story_id)
        );
    }

    #[tokio::test]
    async fn test_submit_requires_login_and_input() {
        let f = fixture().await;
        assert!(f.feed.submit_story("T", "http://x.com").await.unwrap_err().is_submission());

        login(&f, "ada").await;
        assert!(f.feed.submit_story("", "http://x.com").await.unwrap_err().is_submission());
        assert!(f.feed.submit_story("T", " ").await.unwrap_err().is_submission());
        assert_eq!(f.remote.call_count("create_story"), 0);
    }

    #[tokio::test]
    async fn test_submit_offline_keeps_snapshot() {
        let f = fixture().await;
        login(&f, "ada").await;
        let before = f.feed.load_master().await.unwrap();
        f.remote.set_offline(true);

        let err = f.feed.submit_story("T", "http://x.com").await.unwrap_err();

        assert!(err.is_submission());
        assert!(Arc::ptr_eq(&before, &f.feed.snapshot()));
    }

    #[tokio::test]
    async fn test_delete_reloads() {
        let f = fixture().await;
        login(&f, "bob").await;
        f.feed.load_master().await.unwrap();
        let target = f.feed.deletable_ids()[0].clone();

        f.feed.delete_story(&target).await.unwrap();

        assert!(!f.feed.snapshot().contains(&target));
        assert_eq!(f.feed.project_all().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_refused_by_server() {
        let f = fixture().await;
        login(&f, "ada").await;
        let snapshot = f.feed.load_master().await.unwrap();
        let bobs = snapshot
            .stories()
            .iter()
            .find(|s| s.username == "bob")
            .unwrap()
            .story_id
            .clone();

        let err = f.feed.delete_story(&bobs).await.unwrap_err();

        assert!(matches!(err, FeedError::Deletion { ref story_id, .. } if *story_id == bobs));
        assert!(f.feed.snapshot().contains(&bobs));
    }

    #[tokio::test]
    async fn test_load_master_failure_keeps_previous_snapshot() {
        let f = fixture().await;
        let before = f.feed.load_master().await.unwrap();
        f.remote.set_offline(true);

        let err = f.feed.load_master().await.unwrap_err();

        assert!(err.is_fetch());
        assert!(Arc::ptr_eq(&before, &f.feed.snapshot()));
    }

    #[tokio::test]
    async fn test_queued_submission_does_not_survive_logout() {
        let f = fixture().await;
        login(&f, "ada").await;
        f.remote.set_latency(Some(Duration::from_millis(40)));

        let (first, queued, _) = tokio::join!(
            f.feed.submit_story("First", "http://one.com"),
            async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                f.feed.submit_story("Second", "http://two.com").await
            },
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                f.state.reset();
            },
        );

        assert_eq!(first.unwrap().title, "First");
        assert!(queued.unwrap_err().is_submission());
        assert_eq!(f.remote.call_count("create_story"), 1);
    }

    #[tokio::test]
    async fn test_queued_deletion_does_not_survive_logout() {
        let f = fixture().await;
        login(&f, "ada").await;
        let snapshot = f.feed.load_master().await.unwrap();
        let own = snapshot
            .stories()
            .iter()
            .find(|s| s.username == "ada")
            .map(|s| s.story_id.clone())
            .unwrap();
        f.remote.set_latency(Some(Duration::from_millis(40)));

        let (first, queued, _) = tokio::join!(
            f.feed.delete_story(&own),
            async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                f.feed.delete_story(&own).await
            },
            async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                f.state.reset();
            },
        );

        assert!(first.is_ok());
        assert!(queued.unwrap_err().is_deletion());
        assert_eq!(f.remote.call_count("delete_story"), 1);
    }
}
