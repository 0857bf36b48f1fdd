use std::sync::Arc;

use crate::error::{FeedError, Result};
use crate::favorites::FavoritesEngine;
use crate::model::{Credentials, Identity};
use crate::remote::RemoteService;
use crate::state::SessionState;
use crate::store::{SessionStore, SessionStoreExt};

/// Manages the identity of the current user.
///
/// `SessionManager` is responsible for:
/// - Logging in and registering through the remote service
/// - Persisting the credentials so a restart can rehydrate them
/// - Seeding the favorites engine from the identity it establishes
/// - Wiping every trace of the session on logout
///
/// After any successful login, registration or rehydration exactly one
/// identity is held in the shared [`SessionState`]; after logout none is.
pub struct SessionManager {
    state: Arc<SessionState>,
    remote: Arc<dyn RemoteService>,
    store: Arc<dyn SessionStore>,
    favorites: Arc<FavoritesEngine>,
}

impl SessionManager {
    pub fn new(
        state: Arc<SessionState>,
        remote: Arc<dyn RemoteService>,
        store: Arc<dyn SessionStore>,
        favorites: Arc<FavoritesEngine>,
    ) -> Self {
        Self {
            state,
            remote,
            store,
            favorites,
        }
    }

    /// Logs in with a username and password.
    ///
    /// # Errors
    ///
    /// - `Auth` for empty input or when the server refuses the credentials
    /// - `StorageUnavailable` when the session could not be persisted; the
    ///   client stays logged out in that case
    pub async fn login(&self, username: &str, password: &str) -> Result<Identity> {
        require("username", username)?;
        require("password", password)?;

        let identity = self
            .remote
            .authenticate(username, password)
            .await
            .map_err(|e| {
                tracing::warn!(username, error = %e, "Login failed");
                FeedError::auth(e.to_string())
            })?;

        tracing::info!(username, "Logged in");
        self.establish(identity)
    }

    /// Creates an account and logs it in.
    ///
    /// # Errors
    ///
    /// Same as [`login`](Self::login); a taken username is an `Auth` error.
    pub async fn register(&self, username: &str, password: &str, name: &str) -> Result<Identity> {
        require("username", username)?;
        require("password", password)?;
        require("name", name)?;

        let identity = self
            .remote
            .create_account(username, password, name)
            .await
            .map_err(|e| {
                tracing::warn!(username, error = %e, "Registration failed");
                FeedError::auth(e.to_string())
            })?;

        tracing::info!(username, "Registered new account");
        self.establish(identity)
    }

    /// Restores the session persisted by a previous run.
    ///
    /// Never fails: an absent, expired or unresolvable session leaves the
    /// client logged out. Credentials the server explicitly rejects are
    /// removed from the store; on a transport failure they are kept for the
    /// next start.
    pub async fn rehydrate(&self) -> Option<Identity> {
        let credentials = match self.store.load_credentials() {
            Ok(Some(credentials)) => credentials,
            Ok(None) => {
                tracing::debug!("No stored session");
                self.state.reset();
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, "Cannot read stored session");
                self.state.reset();
                return None;
            }
        };

        match self
            .remote
            .resolve_identity(&credentials.token, &credentials.username)
            .await
        {
            Ok(mut identity) => {
                if identity.login_token.is_empty() {
                    identity.login_token = credentials.token;
                }
                match self.establish(identity) {
                    Ok(identity) => {
                        tracing::info!(username = %identity.username, "Session rehydrated");
                        Some(identity)
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Rehydrated session could not be persisted");
                        None
                    }
                }
            }
            Err(e) if e.is_rejection_of_credentials() => {
                tracing::info!(
                    username = %credentials.username,
                    error = %e,
                    "Stored session rejected, clearing it"
                );
                self.state.reset();
                self.discard_stored();
                None
            }
            Err(e) => {
                tracing::warn!(
                    username = %credentials.username,
                    error = %e,
                    "Could not resolve stored session"
                );
                self.state.reset();
                None
            }
        }
    }

    /// Wipes the persisted session and the in-memory identity and favorites.
    ///
    /// The in-memory state is always dropped; a store that cannot be cleared
    /// is reported as `StorageUnavailable`.
    pub fn logout(&self) -> Result<()> {
        let cleared = self.store.clear();
        self.state.reset();
        match &cleared {
            Ok(()) => tracing::info!("Logged out"),
            Err(e) => tracing::warn!(error = %e, "Logged out but stored session remains"),
        }
        cleared
    }

    pub fn current(&self) -> Option<Identity> {
        self.state.identity()
    }

    pub fn credentials(&self) -> Option<Credentials> {
        self.state.credentials()
    }

    pub fn is_logged_in(&self) -> bool {
        self.state.is_logged_in()
    }

    /// Persists `identity`, makes it current and seeds the favorites from it.
    ///
    /// On a storage failure nothing of the new session is kept.
    fn establish(&self, identity: Identity) -> Result<Identity> {
        if let Err(e) = self.store.save_identity(&identity) {
            self.state.reset();
            self.discard_stored();
            return Err(e);
        }
        self.state.set_identity(identity.clone());

        if let Err(e) = self.favorites.initialize(&identity.favorite_refs()) {
            self.state.reset();
            self.discard_stored();
            return Err(e);
        }
        Ok(self.state.identity().unwrap_or(identity))
    }

    fn discard_stored(&self) {
        if let Err(e) = self.store.clear() {
            tracing::warn!(error = %e, "Failed to clear stored session");
        }
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(FeedError::auth(format!("{} must not be empty", field)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemorySessionStore, StoreKey};
    use crate::testing::{FakeRemote, UnavailableStore};

    struct Fixture {
        remote: Arc<FakeRemote>,
        store: Arc<MemorySessionStore>,
        state: Arc<SessionState>,
        manager: SessionManager,
    }

    fn fixture_with(remote: FakeRemote, store: Arc<MemorySessionStore>) -> Fixture {
        let remote = Arc::new(remote);
        let state = Arc::new(SessionState::new());
        let favorites = Arc::new(FavoritesEngine::new(
            state.clone(),
            remote.clone(),
            store.clone(),
        ));
        let manager = SessionManager::new(state.clone(), remote.clone(), store.clone(), favorites);
        Fixture {
            remote,
            store,
            state,
            manager,
        }
    }

    fn fixture() -> Fixture {
        fixture_with(
            FakeRemote::new().with_account("ada", "pw", "Ada"),
            Arc::new(MemorySessionStore::new()),
        )
    }

    #[tokio::test]
    async fn test_login_persists_credentials() {
        let f = fixture();
        let identity = f.manager.login("ada", "pw").await.unwrap();

        assert_eq!(identity.username, "ada");
        assert!(f.manager.is_logged_in());
        assert_eq!(
            f.store.get(StoreKey::Token).unwrap(),
            Some(identity.login_token.clone())
        );
        assert_eq!(f.store.get(StoreKey::Username).unwrap().as_deref(), Some("ada"));
        assert_eq!(f.store.get(StoreKey::Name).unwrap().as_deref(), Some("Ada"));
        assert!(f.store.get(StoreKey::Created).unwrap().is_some());
        assert_eq!(f.store.get(StoreKey::Favorites).unwrap().as_deref(), Some("[]"));
    }

    #[tokio::test]
    async fn test_login_seeds_favorites() {
        let f = fixture();
        f.remote.seed_favorite("ada", "s1");

        f.manager.login("ada", "pw").await.unwrap();

        assert!(f.state.is_favorite("s1"));
        assert!(!f.state.is_favorite("s2"));
    }

    #[tokio::test]
    async fn test_login_bad_password() {
        let f = fixture();
        let err = f.manager.login("ada", "nope").await.unwrap_err();

        assert!(err.is_auth());
        assert!(!f.manager.is_logged_in());
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn test_login_rejects_empty_input_without_network() {
        let f = fixture();
        assert!(f.manager.login("", "pw").await.unwrap_err().is_auth());
        assert!(f.manager.login("ada", "  ").await.unwrap_err().is_auth());
        assert!(f.remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_register_duplicate_is_auth_error() {
        let f = fixture();
        let err = f.manager.register("ada", "pw2", "Other Ada").await.unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn test_register_logs_in() {
        let f = fixture();
        let identity = f.manager.register("bob", "pw", "Bob").await.unwrap();

        assert_eq!(identity.name, "Bob");
        assert_eq!(f.manager.current().unwrap().username, "bob");
        assert_eq!(f.store.get(StoreKey::Name).unwrap().as_deref(), Some("Bob"));
    }

    #[tokio::test]
    async fn test_rehydrate_from_store() {
        let f = fixture();
        f.manager.login("ada", "pw").await.unwrap();

        // Fresh process sharing the same store and server.
        let state = Arc::new(SessionState::new());
        let favorites = Arc::new(FavoritesEngine::new(
            state.clone(),
            f.remote.clone(),
            f.store.clone(),
        ));
        let manager = SessionManager::new(state, f.remote.clone(), f.store.clone(), favorites);

        let identity = manager.rehydrate().await.unwrap();
        assert_eq!(identity.username, "ada");
        assert!(manager.is_logged_in());
    }

    #[tokio::test]
    async fn test_rehydrate_without_stored_session() {
        let f = fixture();
        assert!(f.manager.rehydrate().await.is_none());
        assert!(f.remote.calls().is_empty());
    }

    #[tokio::test]
    async fn test_rehydrate_rejected_token_clears_store() {
        let f = fixture();
        f.manager.login("ada", "pw").await.unwrap();
        f.remote.expire_token("ada");

        assert!(f.manager.rehydrate().await.is_none());
        assert!(!f.manager.is_logged_in());
        assert!(f.store.is_empty());
    }

    #[tokio::test]
    async fn test_rehydrate_offline_keeps_store() {
        let f = fixture();
        f.manager.login("ada", "pw").await.unwrap();
        f.remote.set_offline(true);

        assert!(f.manager.rehydrate().await.is_none());
        assert!(!f.manager.is_logged_in());
        assert!(f.store.get(StoreKey::Token).unwrap().is_some());
    }

    #[tokio::test]
    async fn test_logout_wipes_everything() {
        let f = fixture();
        f.remote.seed_favorite("ada", "s1");
        f.manager.login("ada", "pw").await.unwrap();

        f.manager.logout().unwrap();

        assert!(!f.manager.is_logged_in());
        assert!(f.state.favorites().is_empty());
        for key in StoreKey::ALL {
            assert!(f.store.get(key).unwrap().is_none(), "{} survived logout", key);
        }
        assert!(f.manager.rehydrate().await.is_none());
    }

    #[tokio::test]
    async fn test_login_with_unavailable_store_stays_logged_out() {
        let remote = Arc::new(FakeRemote::new().with_account("ada", "pw", "Ada"));
        let state = Arc::new(SessionState::new());
        let store: Arc<dyn SessionStore> = Arc::new(UnavailableStore);
        let favorites = Arc::new(FavoritesEngine::new(
            state.clone(),
            remote.clone(),
            store.clone(),
        ));
        let manager = SessionManager::new(state, remote, store, favorites);

        let err = manager.login("ada", "pw").await.unwrap_err();
        assert!(err.is_storage_unavailable());
        assert!(!manager.is_logged_in());
        assert!(manager.rehydrate().await.is_none());
    }
}
