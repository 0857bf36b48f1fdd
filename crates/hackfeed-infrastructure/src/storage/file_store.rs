//! File-backed session store.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use hackfeed_core::error::{FeedError, Result};
use hackfeed_core::store::{SessionStore, StoreKey};

use super::atomic_json::{AtomicFileError, AtomicJsonFile};

type Document = BTreeMap<String, String>;

/// [`SessionStore`] persisted as one flat JSON object.
///
/// Every call goes to disk, so two processes sharing the file see each
/// other's writes. Unknown keys written by other versions survive `set` and
/// `remove`, and are dropped by `clear`.
pub struct FileSessionStore {
    file: AtomicJsonFile<Document>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            file: AtomicJsonFile::new(path.into()),
        }
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }

    fn load(&self) -> Result<Document> {
        self.file
            .load()
            .map(Option::unwrap_or_default)
            .map_err(|e| unavailable(self.path(), e))
    }

    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut Document),
    {
        self.file
            .update(Document::new(), |doc| {
                f(doc);
                Ok(())
            })
            .map_err(|e| unavailable(self.path(), e))
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: StoreKey) -> Result<Option<String>> {
        Ok(self.load()?.remove(key.as_str()))
    }

    fn set(&self, key: StoreKey, value: &str) -> Result<()> {
        self.update(|doc| {
            doc.insert(key.as_str().to_string(), value.to_string());
        })
    }

    fn remove(&self, key: StoreKey) -> Result<()> {
        self.update(|doc| {
            doc.remove(key.as_str());
        })
    }

    fn clear(&self) -> Result<()> {
        self.update(Document::clear)?;
        tracing::debug!(path = %self.path().display(), "Cleared session file");
        Ok(())
    }
}

fn unavailable(path: &Path, err: AtomicFileError) -> FeedError {
    tracing::warn!(path = %path.display(), error = %err, "Session file unavailable");
    FeedError::storage(format!("{}: {}", path.display(), err))
}
