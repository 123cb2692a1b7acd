//! Durable key-value stores for drafts.
//!
//! This module provides the [`DurableStore`] trait and its built-in
//! implementations. The interface is deliberately small and synchronous:
//! `get`, `set`, `delete` and `keys` over string keys and string values.
//!
//! ## Backends
//!
//! - [`MemoryStore`] - Thread-safe in-memory map with an optional byte ceiling
//! - [`FileStore`] - One JSON file per key, survives restarts
//! - [`DisabledStore`] - Storage switched off; every operation fails
//!
//! ## Usage
//!
//! ```
//! use kilnqa_drafts::storage::{DurableStore, MemoryStore};
//!
//! let store = MemoryStore::new();
//! store.set("autosave_waste_add", r#"{"quantity_kg":"120"}"#).unwrap();
//! assert!(store.get("autosave_waste_add").unwrap().is_some());
//! ```

use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};

use serde::{Deserialize, Serialize};

use kilnqa_core::{DraftSettings, QaError, QaResult, StorageBackend};

/// A synchronous string key-value store with an implementation-defined
/// capacity ceiling.
pub trait DurableStore: Send + Sync {
    /// Returns the value stored under `key`, if any.
    fn get(&self, key: &str) -> QaResult<Option<String>>;

    /// Stores `value` under `key`, replacing any previous value.
    ///
    /// A failed write leaves the previous value in place.
    fn set(&self, key: &str, value: &str) -> QaResult<()>;

    /// Removes `key`. Returns `true` if it existed.
    fn delete(&self, key: &str) -> QaResult<bool>;

    /// Lists every stored key, sorted.
    fn keys(&self) -> QaResult<Vec<String>>;
}

// ============================================================================
// MemoryStore
// ============================================================================

/// Thread-safe in-memory store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
    capacity: Option<usize>,
}

impl MemoryStore {
    /// Creates an unbounded store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a store holding at most `capacity` bytes of keys plus values.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            capacity: Some(capacity),
        }
    }

    /// Bytes currently used by keys and values.
    pub fn used_bytes(&self) -> usize {
        self.entries
            .read()
            .expect("store lock poisoned")
            .iter()
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

impl DurableStore for MemoryStore {
    fn get(&self, key: &str) -> QaResult<Option<String>> {
        let entries = self.entries.read().expect("store lock poisoned");
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> QaResult<()> {
        let mut entries = self.entries.write().expect("store lock poisoned");
        if let Some(capacity) = self.capacity {
            let used: usize = entries
                .iter()
                .filter(|(k, _)| k.as_str() != key)
                .map(|(k, v)| k.len() + v.len())
                .sum();
            let needed = used + key.len() + value.len();
            if needed > capacity {
                return Err(QaError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    capacity,
                });
            }
        }
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&self, key: &str) -> QaResult<bool> {
        let mut entries = self.entries.write().expect("store lock poisoned");
        Ok(entries.remove(key).is_some())
    }

    fn keys(&self) -> QaResult<Vec<String>> {
        let entries = self.entries.read().expect("store lock poisoned");
        let mut keys: Vec<String> = entries.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

// ============================================================================
// FileStore
// ============================================================================

/// File-backed store: one JSON entry file per key under a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    /// The directory holding the entry files.
    pub dir: PathBuf,
}

/// Serialized representation of one file store entry.
#[derive(Serialize, Deserialize)]
struct FileEntry {
    key: String,
    value: String,
}

const ENTRY_EXTENSION: &str = "draft";

impl FileStore {
    /// Creates a store in `dir`, creating the directory if needed.
    pub fn new(dir: impl Into<PathBuf>) -> QaResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    /// Returns the entry path for a given key: the hex-encoded key bytes,
    /// so the same key maps to the same file in every build.
    fn key_path(&self, key: &str) -> PathBuf {
        self.dir
            .join(format!("{}.{ENTRY_EXTENSION}", hex::encode(key.as_bytes())))
    }

    fn read_entry(path: &std::path::Path) -> QaResult<Option<FileEntry>> {
        match fs::read(path) {
            Ok(data) => serde_json::from_slice(&data)
                .map(Some)
                .map_err(|e| QaError::SerializationError(e.to_string())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(QaError::IoError(e)),
        }
    }
}

impl DurableStore for FileStore {
    fn get(&self, key: &str) -> QaResult<Option<String>> {
        let entry = Self::read_entry(&self.key_path(key))?;
        Ok(entry.filter(|e| e.key == key).map(|e| e.value))
    }

    fn set(&self, key: &str, value: &str) -> QaResult<()> {
        let entry = FileEntry {
            key: key.to_string(),
            value: value.to_string(),
        };
        let data =
            serde_json::to_vec(&entry).map_err(|e| QaError::SerializationError(e.to_string()))?;

        // Staged write: the previous entry stays intact until the rename.
        let path = self.key_path(key);
        let staging = path.with_extension("tmp");
        fs::write(&staging, data)?;
        fs::rename(&staging, &path)?;
        Ok(())
    }

    fn delete(&self, key: &str) -> QaResult<bool> {
        let path = self.key_path(key);
        match Self::read_entry(&path)? {
            Some(entry) if entry.key == key => {
                fs::remove_file(&path)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn keys(&self) -> QaResult<Vec<String>> {
        let mut keys = Vec::new();
        for dir_entry in fs::read_dir(&self.dir)? {
            let path = dir_entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(ENTRY_EXTENSION) {
                continue;
            }
            match Self::read_entry(&path) {
                Ok(Some(entry)) => keys.push(entry.key),
                Ok(None) => {}
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping unreadable entry");
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

// ============================================================================
// DisabledStore
// ============================================================================

/// A store that refuses every operation, as when the user agent has storage
/// turned off.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledStore;

impl DisabledStore {
    fn unavailable() -> QaError {
        QaError::StorageUnavailable("storage is disabled".to_string())
    }
}

impl DurableStore for DisabledStore {
    fn get(&self, _key: &str) -> QaResult<Option<String>> {
        Err(Self::unavailable())
    }

    fn set(&self, _key: &str, _value: &str) -> QaResult<()> {
        Err(Self::unavailable())
    }

    fn delete(&self, _key: &str) -> QaResult<bool> {
        Err(Self::unavailable())
    }

    fn keys(&self) -> QaResult<Vec<String>> {
        Err(Self::unavailable())
    }
}

/// Builds the store selected by the draft settings.
pub fn store_from_settings(settings: &DraftSettings) -> QaResult<Arc<dyn DurableStore>> {
    let store: Arc<dyn DurableStore> = match settings.backend {
        StorageBackend::Memory => match settings.capacity_bytes {
            Some(capacity) => Arc::new(MemoryStore::with_capacity(capacity)),
            None => Arc::new(MemoryStore::new()),
        },
        StorageBackend::File => {
            let dir = settings.location.clone().ok_or_else(|| {
                QaError::ConfigurationError("file draft storage needs a location".to_string())
            })?;
            Arc::new(FileStore::new(dir)?)
        }
        StorageBackend::Disabled => Arc::new(DisabledStore),
    };
    Ok(store)
}
