//! Concrete adapters for the hackfeed state engine.
//!
//! - `config`: `ClientConfig` loaded from `config.toml`
//! - `paths`: platform locations of hackfeed files
//! - `storage`: the file-backed session store
//! - `dto` / `http_remote`: the HTTP client of the news API

pub mod config;
pub mod dto;
pub mod http_remote;
pub mod paths;
pub mod storage;

pub use crate::config::{ClientConfig, ConfigError};
pub use crate::http_remote::HttpRemoteService;
pub use crate::paths::HackfeedPaths;
pub use crate::storage::FileSessionStore;
