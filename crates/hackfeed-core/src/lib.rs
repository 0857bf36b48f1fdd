//! Session and feed state engine for a social news client.
//!
//! The crate is split the way the client is used:
//!
//! - `store`: durable key/value session storage
//! - `remote`: the contract of the backend service
//! - `session`: identity lifecycle (login, registration, rehydration, logout)
//! - `favorites`: the authoritative favorites set
//! - `feed`: master story list and its projections
//! - `client`: the controller tying the engines to one [`SessionState`]

pub mod client;
pub mod error;
pub mod favorites;
pub mod feed;
pub mod locks;
pub mod model;
pub mod remote;
pub mod session;
pub mod state;
pub mod store;
pub mod testing;

pub use client::NewsClient;
pub use error::{FeedError, RemoteError, Result};
pub use favorites::FavoritesEngine;
pub use feed::{FeedEngine, hostname_of};
pub use model::{
    Credentials, FavoriteRef, FeedView, Identity, NewStory, Story, StorySnapshot, ViewItem,
};
pub use remote::RemoteService;
pub use session::SessionManager;
pub use state::SessionState;
pub use store::{MemorySessionStore, SessionStore, StoreKey};
