//! Domain models shared by the engines.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use crate::feed::hostname_of;

/// The authenticated user's session data.
///
/// Created by login, registration or rehydration and owned by the
/// [`SessionManager`](crate::session::SessionManager). Cleared on logout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    /// Display name. Stories carry it as their `author`.
    pub name: String,
    pub login_token: String,
    pub created_at: DateTime<Utc>,
    /// Story IDs the server reports as favorited by this user.
    #[serde(default)]
    pub favorites: BTreeSet<String>,
}

impl Identity {
    /// Returns the credential pair sent with authenticated requests.
    pub fn credentials(&self) -> Credentials {
        Credentials {
            token: self.login_token.clone(),
            username: self.username.clone(),
        }
    }

    /// Returns the favorites as the reference list the remote service speaks.
    pub fn favorite_refs(&self) -> Vec<FavoriteRef> {
        self.favorites.iter().map(FavoriteRef::new).collect()
    }
}

/// Token and username carried by every authenticated remote call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub token: String,
    pub username: String,
}

/// A story as the server returned it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Story {
    pub story_id: String,
    pub title: String,
    pub url: String,
    /// Display name of the submitting user.
    pub author: String,
    /// Account name of the submitting user.
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Story {
    /// Hostname derived from the story URL.
    pub fn hostname(&self) -> String {
        hostname_of(&self.url)
    }
}

/// Fields of a story about to be submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewStory {
    pub author: String,
    pub title: String,
    pub url: String,
}

/// One entry of a favorites collection returned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FavoriteRef {
    pub story_id: String,
}

impl FavoriteRef {
    pub fn new(story_id: impl Into<String>) -> Self {
        Self {
            story_id: story_id.into(),
        }
    }
}

/// The full story collection as last fetched, in server order.
///
/// Snapshots are never patched: a fetch builds a new one and swaps it in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorySnapshot {
    stories: Vec<Story>,
    fetched_at: Option<DateTime<Utc>>,
}

impl StorySnapshot {
    /// Creates a snapshot stamped with the current time.
    pub fn new(stories: Vec<Story>) -> Self {
        Self {
            stories,
            fetched_at: Some(Utc::now()),
        }
    }

    /// The snapshot held before the first fetch.
    pub fn empty() -> Self {
        Self {
            stories: Vec::new(),
            fetched_at: None,
        }
    }

    pub fn stories(&self) -> &[Story] {
        &self.stories
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    /// `None` until the first successful fetch.
    pub fn fetched_at(&self) -> Option<DateTime<Utc>> {
        self.fetched_at
    }

    pub fn get(&self, story_id: &str) -> Option<&Story> {
        self.stories.iter().find(|s| s.story_id == story_id)
    }

    pub fn contains(&self, story_id: &str) -> bool {
        self.get(story_id).is_some()
    }
}

impl Default for StorySnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

/// Shared, immutable handle to a snapshot.
pub type SharedSnapshot = Arc<StorySnapshot>;

/// A story annotated for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ViewItem {
    pub story: Story,
    pub hostname: String,
    pub is_favorite: bool,
    /// Also decides whether a delete affordance is offered.
    pub is_own_story: bool,
}

/// Which projection of the master list is displayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedView {
    #[default]
    All,
    Favorites,
    OwnStories,
}

impl fmt::Display for FeedView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            FeedView::All => "all",
            FeedView::Favorites => "favorites",
            FeedView::OwnStories => "mine",
        };
        f.write_str(label)
    }
}

impl FromStr for FeedView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(FeedView::All),
            "favorites" | "favs" => Ok(FeedView::Favorites),
            "mine" | "own" | "own_stories" => Ok(FeedView::OwnStories),
            other => Err(format!("unknown feed view: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn story(id: &str) -> Story {
        Story {
            story_id: id.to_string(),
            title: format!("Story {}", id),
            url: "https://www.example.com/x".to_string(),
            author: "Ada".to_string(),
            username: "ada".to_string(),
            created_at: None,
        }
    }

    #[test]
    fn test_empty_snapshot() {
        let snapshot = StorySnapshot::empty();
        assert!(snapshot.is_empty());
        assert!(snapshot.fetched_at().is_none());
    }

    #[test]
    fn test_snapshot_lookup() {
        let snapshot = StorySnapshot::new(vec![story("a"), story("b")]);
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.contains("b"));
        assert!(!snapshot.contains("c"));
        assert!(snapshot.fetched_at().is_some());
    }

    #[test]
    fn test_story_hostname() {
        assert_eq!(story("a").hostname(), "example.com");
    }

    #[test]
    fn test_feed_view_parse() {
        assert_eq!("all".parse::<FeedView>(), Ok(FeedView::All));
        assert_eq!("Favorites".parse::<FeedView>(), Ok(FeedView::Favorites));
        assert_eq!("mine".parse::<FeedView>(), Ok(FeedView::OwnStories));
        assert!("hot".parse::<FeedView>().is_err());
        assert_eq!(FeedView::OwnStories.to_string(), "mine");
    }
}
