//! Key-value storage ports backing the session store.
//!
//! This module provides:
//! - `StoragePort`: the contract every scope satisfies
//! - `MemoryStore`: process-local storage, gone when the process exits
//! - `FileStore`: file-backed storage that survives restarts
//!
//! Session code only ever sees `StoragePort`, so tests can swap the
//! file-backed scope for an in-memory one.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

use anyhow::Result;

/// String-keyed, string-valued storage.
///
/// All values are strings; structured data is serialized to JSON before
/// it reaches a port.
pub trait StoragePort: Send + Sync {
    /// Look up a value. `Ok(None)` means the key is not present.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Insert or replace a value.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Delete a key. Removing an absent key is not an error.
    fn remove(&self, key: &str) -> Result<()>;
}
