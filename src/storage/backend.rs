//! Storage backend implementations.
//!
//! This module provides two key-value backends:
//! - InMemoryStore: ephemeral storage for tests
//! - FileStore: a single JSON file with hex-encoded keys and values
//!
//! and a [`TypedStore`] wrapper that bincode-encodes values.

use serde::{de::DeserializeOwned, Serialize};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{Error, Result};

// ═══════════════════════════════════════════════════════════════════════════════
// STORAGE TRAIT
// ═══════════════════════════════════════════════════════════════════════════════

/// Key type for storage operations
pub type StorageKey = Vec<u8>;

/// Value type for storage operations
pub type StorageValue = Vec<u8>;

/// Trait for storage backends
pub trait StorageBackend: Send + Sync {
    /// Get a value by key
    fn get(&self, key: &[u8]) -> Result<Option<StorageValue>>;

    /// Set a value for a key
    fn set(&self, key: &[u8], value: &[u8]) -> Result<()>;

    /// Delete a key, returning whether it existed
    fn delete(&self, key: &[u8]) -> Result<bool>;

    /// Check if a key exists
    fn exists(&self, key: &[u8]) -> Result<bool> {
        Ok(self.get(key)?.is_some())
    }

    /// List all keys with a given prefix
    fn list_prefix(&self, prefix: &[u8]) -> Result<Vec<StorageKey>>;

    /// Flush any pending writes to persistent storage
    fn flush(&self) -> Result<()>;
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read().map_err(|_| Error::Lock)
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write().map_err(|_| Error::Lock)
}

fn keys_with_prefix(data: &HashMap<StorageKey, StorageValue>, prefix: &[u8]) -> Vec<StorageKey> {
    let mut keys: Vec<_> = data
        .keys()
        .filter(|k| k.starts_with(prefix))
        .cloned()
        .collect();
    keys.sort();
    keys
}

// ═══════════════════════════════════════════════════════════════════════════════
// IN-MEMORY STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// In-memory storage backend (for testing and ephemeral use)
#[derive(Debug, Default)]
pub struct InMemoryStore {
    data: RwLock<HashMap<StorageKey, StorageValue>>,
}

impl InMemoryStore {
    /// Create a new in-memory store
    pub fn new() -> Self {
        Self::default()
    }

    /// Get number of entries
    pub fn len(&self) -> Result<usize> {
        Ok(read(&self.data)?.len())
    }

    /// Check if empty
    pub fn is_empty(&self) -> Result<bool> {
        Ok(read(&self.data)?.is_empty())
    }
}

impl StorageBackend for InMemoryStore {
    fn get(&self, key: &[u8]) -> Result<Option<StorageValue>> {
        Ok(read(&self.data)?.get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        write(&self.data)?.insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    fn delete(&self, key: &[u8]) -> Result<bool> {
        Ok(write(&self.data)?.remove(key).is_some())
    }

    fn list_prefix(&self, prefix: &[u8]) -> Result<Vec<StorageKey>> {
        let data = read(&self.data)?;
        Ok(keys_with_prefix(&data, prefix))
    }

    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// FILE-BASED STORE
// ═══════════════════════════════════════════════════════════════════════════════

/// File-based storage backend writing `data.json` under a directory
#[derive(Debug)]
pub struct FileStore {
    /// Base directory for storage
    base_path: PathBuf,
    /// In-memory cache
    cache: RwLock<HashMap<StorageKey, StorageValue>>,
    /// Whether the cache has unsaved changes
    dirty: RwLock<bool>,
}

impl FileStore {
    /// Name of the data file inside the base directory
    pub const DATA_FILE: &'static str = "data.json";

    /// Open (or create) a file store at the given directory
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let base_path = path.as_ref().to_path_buf();
        fs::create_dir_all(&base_path).map_err(|e| {
            Error::Storage(format!("cannot create {}: {}", base_path.display(), e))
        })?;

        let store = Self {
            base_path,
            cache: RwLock::new(HashMap::new()),
            dirty: RwLock::new(false),
        };
        store.load_from_disk()?;
        Ok(store)
    }

    /// Path of the data file
    pub fn data_file_path(&self) -> PathBuf {
        self.base_path.join(Self::DATA_FILE)
    }

    fn load_from_disk(&self) -> Result<()> {
        let path = self.data_file_path();
        if !path.exists() {
            return Ok(());
        }

        let file = File::open(&path)
            .map_err(|e| Error::Storage(format!("cannot open {}: {}", path.display(), e)))?;
        let data: HashMap<String, String> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| Error::Storage(format!("cannot parse {}: {}", path.display(), e)))?;

        let mut cache = write(&self.cache)?;
        for (key_hex, value_hex) in data {
            let key = hex::decode(&key_hex)
                .map_err(|e| Error::Storage(format!("invalid key in storage: {}", e)))?;
            let value = hex::decode(&value_hex)
                .map_err(|e| Error::Storage(format!("invalid value in storage: {}", e)))?;
            cache.insert(key, value);
        }
        Ok(())
    }

    fn save_to_disk(&self) -> Result<()> {
        let data: HashMap<String, String> = read(&self.cache)?
            .iter()
            .map(|(k, v)| (hex::encode(k), hex::encode(v)))
            .collect();

        let path = self.data_file_path();
        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&path)
            .map_err(|e| Error::Storage(format!("cannot write {}: {}", path.display(), e)))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &data)
            .map_err(|e| Error::Storage(format!("cannot write {}: {}", path.display(), e)))?;

        *write(&self.dirty)? = false;
        Ok(())
    }

    fn mark_dirty(&self) -> Result<()> {
        *write(&self.dirty)? = true;
        Ok(())
    }
}

impl StorageBackend for FileStore {
    fn get(&self, key: &[u8]) -> Result<Option<StorageValue>> {
        Ok(read(&self.cache)?.get(key).cloned())
    }

    fn set(&self, key: &[u8], value: &[u8]) -> Result<()> {
        write(&self.cache)?.insert(key.to_vec(), value.to_vec());
        self.mark_dirty()
    }

    fn delete(&self, key: &[u8]) -> Result<bool> {
        let existed = write(&self.cache)?.remove(key).is_some();
        if existed {
            self.mark_dirty()?;
        }
        Ok(existed)
    }

    fn list_prefix(&self, prefix: &[u8]) -> Result<Vec<StorageKey>> {
        let cache = read(&self.cache)?;
        Ok(keys_with_prefix(&cache, prefix))
    }

    fn flush(&self) -> Result<()> {
        if *read(&self.dirty)? {
            self.save_to_disk()?;
        }
        Ok(())
    }
}

impl Drop for FileStore {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::warn!("failed to flush {}: {}", self.base_path.display(), e);
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TYPED STORE WRAPPER
// ═══════════════════════════════════════════════════════════════════════════════

/// Type-safe wrapper around a storage backend
#[derive(Debug)]
pub struct TypedStore<B: StorageBackend> {
    backend: B,
}

impl<B: StorageBackend> TypedStore<B> {
    /// Create a new typed store
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Get a typed value
    pub fn get<T: DeserializeOwned>(&self, key: &[u8]) -> Result<Option<T>> {
        self.backend
            .get(key)?
            .map(|data| {
                bincode::deserialize(&data).map_err(|e| Error::Deserialization(e.to_string()))
            })
            .transpose()
    }

    /// Set a typed value
    pub fn set<T: Serialize>(&self, key: &[u8], value: &T) -> Result<()> {
        let data = bincode::serialize(value).map_err(|e| Error::Serialization(e.to_string()))?;
        self.backend.set(key, &data)
    }

    /// Delete a value
    pub fn delete(&self, key: &[u8]) -> Result<bool> {
        self.backend.delete(key)
    }

    /// Check if a key exists
    pub fn exists(&self, key: &[u8]) -> Result<bool> {
        self.backend.exists(key)
    }

    /// List keys with prefix
    pub fn list_prefix(&self, prefix: &[u8]) -> Result<Vec<StorageKey>> {
        self.backend.list_prefix(prefix)
    }

    /// Flush pending writes
    pub fn flush(&self) -> Result<()> {
        self.backend.flush()
    }

    /// Get the underlying backend
    pub fn backend(&self) -> &B {
        &self.backend
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// KEY PREFIXES
// ═══════════════════════════════════════════════════════════════════════════════

/// Key prefixes for different data types
pub mod prefixes {
    /// Deployment snapshots
    pub const DEPLOYMENT: &[u8] = b"dep:";
    /// Snapshot metadata
    pub const META: &[u8] = b"meta:";
}

/// Create a key with a prefix
pub fn make_key(prefix: &[u8], key: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(prefix.len() + key.len());
    result.extend_from_slice(prefix);
    result.extend_from_slice(key);
    result
}
