//! On-disk storage.
//!
//! - `atomic_json`: crash-safe JSON documents (temp file, fsync, rename, lock)
//! - `file_store`: the session store built on top of it

pub mod atomic_json;
pub mod file_store;

pub use atomic_json::{AtomicFileError, AtomicJsonFile};
pub use file_store::FileSessionStore;
