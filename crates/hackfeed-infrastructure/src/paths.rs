//! Path management for hackfeed files.
//!
//! # Directory Structure
//!
//! ```text
//! ~/.config/hackfeed/          # Config directory (platform specific)
//! ├── config.toml              # Client configuration
//! └── session.json             # Persisted login session and favorites
//! ```

use std::path::PathBuf;
use thiserror::Error;

const APP_DIR: &str = "hackfeed";

/// Errors that can occur during path resolution.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Cannot determine the platform config directory")]
    ConfigDirNotFound,
}

pub struct HackfeedPaths;

impl HackfeedPaths {
    /// Returns the hackfeed configuration directory (e.g. `~/.config/hackfeed/`).
    pub fn config_dir() -> Result<PathBuf, PathError> {
        dirs::config_dir()
            .map(|dir| dir.join(APP_DIR))
            .ok_or(PathError::ConfigDirNotFound)
    }

    pub fn config_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Default location of the session store.
    pub fn session_file() -> Result<PathBuf, PathError> {
        Ok(Self::config_dir()?.join("session.json"))
    }
}
