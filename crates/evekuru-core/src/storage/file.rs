use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use anyhow::{anyhow, Context, Result};
use tracing::warn;

use super::StoragePort;

/// File-backed store holding a single JSON object of string entries.
///
/// Every mutation is written through to disk, so the contents survive a
/// restart. Concurrent processes sharing the same file are last-write-wins;
/// there is no cross-process locking.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: RwLock<HashMap<String, String>>,
}

impl FileStore {
    /// Open a store at `path`. A missing file is an empty store. An
    /// unreadable or malformed file is logged and treated as empty, so a
    /// corrupted store file never blocks startup.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match Self::read_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Discarding unreadable store file");
                HashMap::new()
            }
        };
        Self {
            path,
            entries: RwLock::new(entries),
        }
    }

    fn read_entries(path: &Path) -> Result<HashMap<String, String>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read store file {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse store file {}", path.display()))
    }

    fn persist(&self, entries: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write store file {}", self.path.display()))
    }
}

impl StoragePort for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self
            .entries
            .read()
            .map_err(|e| anyhow!("Storage lock poisoned: {}", e))?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| anyhow!("Storage lock poisoned: {}", e))?;
        entries.insert(key.to_string(), value.to_string());
        self.persist(&entries)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| anyhow!("Storage lock poisoned: {}", e))?;
        if entries.remove(key).is_some() {
            self.persist(&entries)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_values_survive_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");

        let store = FileStore::open(&path);
        store.set("evekuru.session", "{\"sheetId\":\"abc\"}").unwrap();
        drop(store);

        let reopened = FileStore::open(&path);
        assert_eq!(
            reopened.get("evekuru.session").unwrap().as_deref(),
            Some("{\"sheetId\":\"abc\"}")
        );
    }

    #[test]
    fn test_remove_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");

        let store = FileStore::open(&path);
        store.set("evekuru.session", "value").unwrap();
        store.remove("evekuru.session").unwrap();
        drop(store);

        let reopened = FileStore::open(&path);
        assert!(reopened.get("evekuru.session").unwrap().is_none());
    }

    #[test]
    fn test_malformed_file_opens_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.json");
        std::fs::write(&path, "not json at all").unwrap();

        let store = FileStore::open(&path);
        assert!(store.get("evekuru.session").unwrap().is_none());

        // The store is still usable and recovers the file on the next write
        store.set("evekuru.session", "fresh").unwrap();
        let reopened = FileStore::open(&path);
        assert_eq!(
            reopened.get("evekuru.session").unwrap().as_deref(),
            Some("fresh")
        );
    }

    #[test]
    fn test_creates_missing_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data").join("evekuru").join("store.json");

        let store = FileStore::open(&path);
        store.set("key", "value").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_missing_file_reads_as_empty() {
        let dir = TempDir::new().unwrap();
        let store = FileStore::open(dir.path().join("store.json"));
        assert!(store.get("anything").unwrap().is_none());
    }
}
