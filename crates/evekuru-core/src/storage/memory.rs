use std::collections::HashMap;
use std::sync::RwLock;

use anyhow::{anyhow, Result};

use super::StoragePort;

/// In-memory store. Backs the tab-local scope in the running app and
/// stands in for the file-backed scope in tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StoragePort for MemoryStore {
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
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|e| anyhow!("Storage lock poisoned: {}", e))?;
        entries.remove(key);
        Ok(())
    }
}
