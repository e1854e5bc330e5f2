//! Key/value stores used as hand-off and cache media between pages.
//!
//! Two scopes exist: a session store (address and analysis payload in flight) and a
//! durable local store (the draft). Both are plain string maps; values are JSON text
//! where structure is needed. Neither store is used for coordination.

use crate::{VeritasError, VeritasResult};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// A string-keyed store with browser-storage semantics.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> VeritasResult<Option<String>>;
    fn set(&self, key: &str, value: &str) -> VeritasResult<()>;
    fn remove(&self, key: &str) -> VeritasResult<()>;
    fn clear(&self) -> VeritasResult<()>;
}

/// Shared handle to a store.
pub type SharedStore = Arc<dyn KeyValueStore>;

/// In-memory store, lost when dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedStore {
        Arc::new(Self::new())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> VeritasResult<Option<String>> {
        let entries = self.entries.lock().map_err(|_| VeritasError::StorePoisoned)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> VeritasResult<()> {
        let mut entries = self.entries.lock().map_err(|_| VeritasError::StorePoisoned)?;
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> VeritasResult<()> {
        let mut entries = self.entries.lock().map_err(|_| VeritasError::StorePoisoned)?;
        entries.remove(key);
        Ok(())
    }

    fn clear(&self) -> VeritasResult<()> {
        let mut entries = self.entries.lock().map_err(|_| VeritasError::StorePoisoned)?;
        entries.clear();
        Ok(())
    }
}

/// Store persisted as one JSON object in a file.
///
/// Every operation reads and rewrites the whole file, so separate processes (for example
/// successive CLI invocations) see each other's writes.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    /// Opens a store at `path`, creating its parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `VeritasError::StateDirCreation` if the parent directory cannot be created.
    pub fn open(path: impl Into<PathBuf>) -> VeritasResult<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(VeritasError::StateDirCreation)?;
            }
        }
        Ok(Self {
            path,
            lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> VeritasResult<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = fs::read_to_string(&self.path).map_err(VeritasError::FileRead)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(&contents).map_err(VeritasError::Deserialization)
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> VeritasResult<()> {
        let json = serde_json::to_string_pretty(entries).map_err(VeritasError::Serialization)?;
        fs::write(&self.path, json).map_err(VeritasError::FileWrite)
    }

    fn update<F>(&self, f: F) -> VeritasResult<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self.lock.lock().map_err(|_| VeritasError::StorePoisoned)?;
        let mut entries = self.read_all()?;
        f(&mut entries);
        self.write_all(&entries)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> VeritasResult<Option<String>> {
        let _guard = self.lock.lock().map_err(|_| VeritasError::StorePoisoned)?;
        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> VeritasResult<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> VeritasResult<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }

    fn clear(&self) -> VeritasResult<()> {
        self.update(BTreeMap::clear)
    }
}
