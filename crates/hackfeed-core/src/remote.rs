//! Remote service contract.

use async_trait::async_trait;

use crate::error::RemoteError;
use crate::model::{Credentials, FavoriteRef, Identity, NewStory, Story};

/// Result of a remote call.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// The backend the engines talk to.
///
/// This trait decouples the state engine from the wire protocol (HTTP API,
/// in-process fake, ...). Every failure is reported as a [`RemoteError`].
#[async_trait]
pub trait RemoteService: Send + Sync {
    /// Exchanges a username and password for a full identity.
    async fn authenticate(&self, username: &str, password: &str) -> RemoteResult<Identity>;

    /// Creates an account and returns it already authenticated.
    async fn create_account(
        &self,
        username: &str,
        password: &str,
        name: &str,
    ) -> RemoteResult<Identity>;

    /// Resolves a stored token/username pair into a full identity.
    async fn resolve_identity(&self, token: &str, username: &str) -> RemoteResult<Identity>;

    /// Lists every story, in display order.
    async fn list_stories(&self) -> RemoteResult<Vec<Story>>;

    async fn create_story(&self, credentials: &Credentials, story: &NewStory)
    -> RemoteResult<Story>;

    async fn delete_story(&self, credentials: &Credentials, story_id: &str) -> RemoteResult<()>;

    /// Adds a favorite and returns the user's complete favorites collection.
    async fn add_favorite(
        &self,
        credentials: &Credentials,
        story_id: &str,
    ) -> RemoteResult<Vec<FavoriteRef>>;

    /// Removes a favorite and returns the user's complete favorites collection.
    async fn remove_favorite(
        &self,
        credentials: &Credentials,
        story_id: &str,
    ) -> RemoteResult<Vec<FavoriteRef>>;
}
