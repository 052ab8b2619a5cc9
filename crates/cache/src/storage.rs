//! Durable flat key/value storage
//!
//! Every call is one synchronous unit of mutation: `update` returns only
//! after the new state for that key has been persisted, and `update_many`
//! persists a whole batch at once or none of it.

use dashmap::DashMap;
use forcebridge_core::{Error, Result};
use forcebridge_utils::write_atomic;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Flat key/value store backing the conflict cache
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Store `value` under `key`; `None` removes the key
    fn update(&self, key: &str, value: Option<Value>) -> Result<()>;

    /// Apply several updates in order
    fn update_many(&self, updates: Vec<(String, Option<Value>)>) -> Result<()> {
        for (key, value) in updates {
            self.update(&key, value)?;
        }
        Ok(())
    }

    /// All keys currently stored
    fn keys(&self) -> Result<Vec<String>>;
}

/// JSON-file backed storage
///
/// The whole map is kept in memory and rewritten atomically on every
/// update, so a crash leaves either the previous or the new file on disk.
pub struct FileStorage {
    path: PathBuf,
    entries: Mutex<BTreeMap<String, Value>>,
}

impl FileStorage {
    /// Open the store at `path`, loading existing entries if the file exists
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = Self::load(&path)?;
        tracing::debug!(path = %path.display(), entries = entries.len(), "opened cache storage");
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Location of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<BTreeMap<String, Value>> {
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::file_system(path, "read cache file", e))?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&content).map_err(|e| {
            Error::storage(
                path.display().to_string(),
                format!("cache file is not a JSON object: {e}"),
            )
        })
    }

    fn persist(&self, entries: &BTreeMap<String, Value>) -> Result<()> {
        let content = serde_json::to_vec_pretty(entries)?;
        write_atomic(&self.path, &content)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.lock().get(key).cloned())
    }

    fn update(&self, key: &str, value: Option<Value>) -> Result<()> {
        let mut entries = self.entries.lock();
        let previous = match value {
            Some(value) => entries.insert(key.to_string(), value),
            None => entries.remove(key),
        };
        if let Err(e) = self.persist(&entries) {
            // Keep memory in step with what is on disk
            match previous {
                Some(old) => entries.insert(key.to_string(), old),
                None => entries.remove(key),
            };
            return Err(Error::storage(key, e.to_string()));
        }
        Ok(())
    }

    fn update_many(&self, updates: Vec<(String, Option<Value>)>) -> Result<()> {
        if updates.is_empty() {
            return Ok(());
        }
        let mut entries = self.entries.lock();
        let mut undo = Vec::with_capacity(updates.len());
        for (key, value) in updates {
            let previous = match value {
                Some(value) => entries.insert(key.clone(), value),
                None => entries.remove(&key),
            };
            undo.push((key, previous));
        }
        if let Err(e) = self.persist(&entries) {
            for (key, previous) in undo.into_iter().rev() {
                match previous {
                    Some(old) => entries.insert(key, old),
                    None => entries.remove(&key),
                };
            }
            return Err(Error::storage(
                self.path.display().to_string(),
                format!("batch update failed: {e}"),
            ));
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.lock().keys().cloned().collect())
    }
}

/// In-memory storage, for tests and short-lived processes
#[derive(Default)]
pub struct MemoryStorage {
    entries: DashMap<String, Value>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.entries.get(key).map(|v| v.value().clone()))
    }

    fn update(&self, key: &str, value: Option<Value>) -> Result<()> {
        match value {
            Some(value) => {
                self.entries.insert(key.to_string(), value);
            }
            None => {
                self.entries.remove(key);
            }
        }
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut keys: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        keys.sort();
        Ok(keys)
    }
}
