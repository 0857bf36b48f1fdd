//! Testing utilities for the state engine.
//!
//! This module provides tools for deterministic tests without a network:
//! - `FakeRemote`, an in-process stand-in for the news service
//! - `UnavailableStore`, a session store whose every call fails

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::error::{FeedError, RemoteError, Result};
use crate::model::{Credentials, FavoriteRef, Identity, NewStory, Story};
use crate::remote::{RemoteResult, RemoteService};
use crate::store::{SessionStore, StoreKey};

#[derive(Debug, Clone)]
struct Account {
    password: String,
    name: String,
    token: String,
    created_at: chrono::DateTime<Utc>,
    /// Server order, which is insertion order.
    favorites: Vec<String>,
}

#[derive(Debug, Default)]
struct Server {
    accounts: HashMap<String, Account>,
    /// Newest first, like the real listing.
    stories: Vec<Story>,
    next_story: u64,
    next_token: u64,
}

impl Server {
    fn issue_token(&mut self, username: &str) -> String {
        self.next_token += 1;
        format!("token-{}-{}", username, self.next_token)
    }

    fn identity(&self, username: &str) -> Option<Identity> {
        self.accounts.get(username).map(|a| Identity {
            username: username.to_string(),
            name: a.name.clone(),
            login_token: a.token.clone(),
            created_at: a.created_at,
            favorites: a.favorites.iter().cloned().collect(),
        })
    }

    fn authorize(&mut self, credentials: &Credentials) -> RemoteResult<&mut Account> {
        match self.accounts.get_mut(&credentials.username) {
            Some(account) if account.token == credentials.token => Ok(account),
            Some(_) => Err(RemoteError::Unauthorized("invalid token".into())),
            None => Err(RemoteError::NotFound(format!(
                "no user '{}'",
                credentials.username
            ))),
        }
    }
}

/// An in-process news service.
///
/// Behaves like the real API closely enough for the engines: token checks,
/// owner-only deletion, favorites returned as the whole collection, newest
/// stories first. The server trims submitted URLs, so callers that echo
/// their own input instead of the server's answer are caught.
#[derive(Debug, Default)]
pub struct FakeRemote {
    server: Mutex<Server>,
    offline: AtomicBool,
    latency: Mutex<Option<Duration>>,
    calls: Mutex<Vec<String>>,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an account directly on the server.
    pub fn with_account(self, username: &str, password: &str, name: &str) -> Self {
        {
            let mut server = self.lock_server();
            let token = server.issue_token(username);
            server.accounts.insert(
                username.to_string(),
                Account {
                    password: password.to_string(),
                    name: name.to_string(),
                    token,
                    created_at: Utc::now(),
                    favorites: Vec::new(),
                },
            );
        }
        self
    }

    /// Adds a story on the server and returns its ID.
    pub fn seed_story(&self, title: &str, url: &str, author: &str, username: &str) -> String {
        let mut server = self.lock_server();
        server.next_story += 1;
        let story_id = format!("s{}", server.next_story);
        server.stories.insert(
            0,
            Story {
                story_id: story_id.clone(),
                title: title.to_string(),
                url: url.to_string(),
                author: author.to_string(),
                username: username.to_string(),
                created_at: Some(Utc::now()),
            },
        );
        story_id
    }

    /// Marks a story as favorited by `username` on the server.
    pub fn seed_favorite(&self, username: &str, story_id: &str) {
        let mut server = self.lock_server();
        if let Some(account) = server.accounts.get_mut(username) {
            if !account.favorites.iter().any(|f| f == story_id) {
                account.favorites.push(story_id.to_string());
            }
        }
    }

    /// Favorites of `username` as the server currently holds them.
    pub fn server_favorites(&self, username: &str) -> Vec<String> {
        self.lock_server()
            .accounts
            .get(username)
            .map(|a| a.favorites.clone())
            .unwrap_or_default()
    }

    /// Rotates the token of `username`, invalidating any stored copy.
    pub fn expire_token(&self, username: &str) {
        let mut server = self.lock_server();
        let token = server.issue_token(username);
        if let Some(account) = server.accounts.get_mut(username) {
            account.token = token;
        }
    }

    /// When offline every call fails with a transport error.
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Delay applied before every call is served.
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock().unwrap_or_else(PoisonError::into_inner) = latency;
    }

    /// Names of the calls served so far, in order.
    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn call_count(&self, name: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == name).count()
    }

    fn lock_server(&self) -> std::sync::MutexGuard<'_, Server> {
        self.server.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn enter(&self, call: &str) -> RemoteResult<()> {
        let latency = *self.latency.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call.to_string());
        if self.offline.load(Ordering::SeqCst) {
            return Err(RemoteError::Transport("network unreachable".into()));
        }
        Ok(())
    }

    fn favorites_of(account: &Account) -> Vec<FavoriteRef> {
        account.favorites.iter().map(FavoriteRef::new).collect()
    }
}

#[async_trait]
impl RemoteService for FakeRemote {
    async fn authenticate(&self, username: &str, password: &str) -> RemoteResult<Identity> {
        self.enter("authenticate").await?;
        let mut server = self.lock_server();
        match server.accounts.get(username) {
            Some(account) if account.password == password => {}
            Some(_) => return Err(RemoteError::Unauthorized("invalid password".into())),
            None => return Err(RemoteError::NotFound(format!("no user '{}'", username))),
        }
        let token = server.issue_token(username);
        if let Some(account) = server.accounts.get_mut(username) {
            account.token = token;
        }
        server
            .identity(username)
            .ok_or_else(|| RemoteError::NotFound(username.to_string()))
    }

    async fn create_account(
        &self,
        username: &str,
        password: &str,
        name: &str,
    ) -> RemoteResult<Identity> {
        self.enter("create_account").await?;
        let mut server = self.lock_server();
        if server.accounts.contains_key(username) {
            return Err(RemoteError::Conflict(format!(
                "username '{}' already taken",
                username
            )));
        }
        let token = server.issue_token(username);
        server.accounts.insert(
            username.to_string(),
            Account {
                password: password.to_string(),
                name: name.to_string(),
                token,
                created_at: Utc::now(),
                favorites: Vec::new(),
            },
        );
        server
            .identity(username)
            .ok_or_else(|| RemoteError::NotFound(username.to_string()))
    }

    async fn resolve_identity(&self, token: &str, username: &str) -> RemoteResult<Identity> {
        self.enter("resolve_identity").await?;
        let mut server = self.lock_server();
        server.authorize(&Credentials {
            token: token.to_string(),
            username: username.to_string(),
        })?;
        server
            .identity(username)
            .ok_or_else(|| RemoteError::NotFound(username.to_string()))
    }

    async fn list_stories(&self) -> RemoteResult<Vec<Story>> {
        self.enter("list_stories").await?;
        Ok(self.lock_server().stories.clone())
    }

    async fn create_story(
        &self,
        credentials: &Credentials,
        story: &NewStory,
    ) -> RemoteResult<Story> {
        self.enter("create_story").await?;
        let mut server = self.lock_server();
        server.authorize(credentials)?;
        server.next_story += 1;
        let created = Story {
            story_id: format!("s{}", server.next_story),
            title: story.title.clone(),
            url: story.url.trim().to_string(),
            author: story.author.clone(),
            username: credentials.username.clone(),
            created_at: Some(Utc::now()),
        };
        server.stories.insert(0, created.clone());
        Ok(created)
    }

    async fn delete_story(&self, credentials: &Credentials, story_id: &str) -> RemoteResult<()> {
        self.enter("delete_story").await?;
        let mut server = self.lock_server();
        server.authorize(credentials)?;
        let owner = server
            .stories
            .iter()
            .find(|s| s.story_id == story_id)
            .map(|s| s.username.clone())
            .ok_or_else(|| RemoteError::NotFound(format!("no story '{}'", story_id)))?;
        if owner != credentials.username {
            return Err(RemoteError::Unauthorized(
                "only the submitter can delete a story".into(),
            ));
        }
        server.stories.retain(|s| s.story_id != story_id);
        Ok(())
    }

    async fn add_favorite(
        &self,
        credentials: &Credentials,
        story_id: &str,
    ) -> RemoteResult<Vec<FavoriteRef>> {
        self.enter("add_favorite").await?;
        let mut server = self.lock_server();
        if !server.stories.iter().any(|s| s.story_id == story_id) {
            return Err(RemoteError::NotFound(format!("no story '{}'", story_id)));
        }
        let account = server.authorize(credentials)?;
        if !account.favorites.iter().any(|f| f == story_id) {
            account.favorites.push(story_id.to_string());
        }
        Ok(Self::favorites_of(account))
    }

    async fn remove_favorite(
        &self,
        credentials: &Credentials,
        story_id: &str,
    ) -> RemoteResult<Vec<FavoriteRef>> {
        self.enter("remove_favorite").await?;
        let mut server = self.lock_server();
        let account = server.authorize(credentials)?;
        account.favorites.retain(|f| f != story_id);
        Ok(Self::favorites_of(account))
    }
}

/// A session store that is never reachable.
#[derive(Debug, Default)]
pub struct UnavailableStore;

impl SessionStore for UnavailableStore {
    fn get(&self, key: StoreKey) -> Result<Option<String>> {
        Err(FeedError::storage(format!("cannot read '{}'", key)))
    }

    fn set(&self, key: StoreKey, _value: &str) -> Result<()> {
        Err(FeedError::storage(format!("cannot write '{}'", key)))
    }

    fn remove(&self, key: StoreKey) -> Result<()> {
        Err(FeedError::storage(format!("cannot remove '{}'", key)))
    }

    fn clear(&self) -> Result<()> {
        Err(FeedError::storage("cannot clear"))
    }
}
