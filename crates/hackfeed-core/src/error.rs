//! Error types for the hackfeed client.

use thiserror::Error;

/// Failure reported by a [`RemoteService`](crate::remote::RemoteService).
///
/// Implementations translate whatever transport they use into one of these
/// variants so that no raw transport fault reaches the engines.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    /// Credentials were missing, wrong or expired.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The request conflicts with existing server state (e.g. duplicate account).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The addressed user or story does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Any other non-success answer from the server.
    #[error("Rejected by server ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The request never produced an answer (offline, timeout, DNS, ...).
    #[error("Transport error: {0}")]
    Transport(String),

    /// The answer could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Returns true when the server explicitly refused the credentials or user.
    ///
    /// Used by rehydration to tell a stale stored session apart from a network
    /// hiccup.
    pub fn is_rejection_of_credentials(&self) -> bool {
        matches!(self, Self::Unauthorized(_) | Self::NotFound(_))
    }
}

/// The shared error type of the state engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    /// Bad credentials, duplicate account or invalid auth input.
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// A favorite toggle could not be synchronized with the server.
    #[error("Favorite sync failed for story '{story_id}': {message}")]
    FavoriteSync { story_id: String, message: String },

    /// A story submission failed.
    #[error("Story submission failed: {0}")]
    Submission(String),

    /// A story deletion failed.
    #[error("Deletion of story '{story_id}' failed: {message}")]
    Deletion { story_id: String, message: String },

    /// The persistent session store could not be read or written.
    #[error("Session storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The master story list could not be fetched. The previous snapshot stays.
    #[error("Story list unavailable: {0}")]
    Fetch(String),
}

impl FeedError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates an Auth error
    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth(message.into())
    }

    /// Creates a FavoriteSync error
    pub fn favorite_sync(story_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::FavoriteSync {
            story_id: story_id.into(),
            message: message.into(),
        }
    }

    /// Creates a Submission error
    pub fn submission(message: impl Into<String>) -> Self {
        Self::Submission(message.into())
    }

    /// Creates a Deletion error
    pub fn deletion(story_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Deletion {
            story_id: story_id.into(),
            message: message.into(),
        }
    }

    /// Creates a StorageUnavailable error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageUnavailable(message.into())
    }

    /// Creates a Fetch error
    pub fn fetch(message: impl Into<String>) -> Self {
        Self::Fetch(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }

    pub fn is_favorite_sync(&self) -> bool {
        matches!(self, Self::FavoriteSync { .. })
    }

    pub fn is_submission(&self) -> bool {
        matches!(self, Self::Submission(_))
    }

    pub fn is_deletion(&self) -> bool {
        matches!(self, Self::Deletion { .. })
    }

    pub fn is_storage_unavailable(&self) -> bool {
        matches!(self, Self::StorageUnavailable(_))
    }

    pub fn is_fetch(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }
}

impl From<serde_json::Error> for FeedError {
    fn from(err: serde_json::Error) -> Self {
        Self::StorageUnavailable(format!("corrupt stored value: {}", err))
    }
}

/// A type alias for `Result<T, FeedError>`.
pub type Result<T> = std::result::Result<T, FeedError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejection_of_credentials() {
        assert!(RemoteError::Unauthorized("bad token".into()).is_rejection_of_credentials());
        assert!(RemoteError::NotFound("user".into()).is_rejection_of_credentials());
        assert!(!RemoteError::Transport("offline".into()).is_rejection_of_credentials());
        assert!(
            !RemoteError::Rejected {
                status: 500,
                message: "boom".into()
            }
            .is_rejection_of_credentials()
        );
    }

    #[test]
    fn test_display_includes_story_id() {
        let err = FeedError::favorite_sync("s9", "offline");
        assert_eq!(
            err.to_string(),
            "Favorite sync failed for story 's9': offline"
        );
        assert!(err.is_favorite_sync());
        assert!(!err.is_auth());
    }
}
