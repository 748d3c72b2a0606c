//! In-memory key/value store.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::cache::kv::{BoxFuture, KvStore};
use crate::cache::types::StoreError;

/// In-memory store backed by a mutex-guarded map.
///
/// The default backend for tests and key-less operation. Unbounded; callers
/// that need eviction should use [`super::DiskKvStore`] or an external
/// store.
#[derive(Default)]
pub struct MemoryKvStore {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryKvStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently stored.
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    /// Whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl KvStore for MemoryKvStore {
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<Vec<u8>>, StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            let entries = self.entries.lock().map_err(|_| StoreError::Lock)?;
            Ok(entries.get(&key).cloned())
        })
    }

    fn set(&self, key: &str, value: Vec<u8>) -> BoxFuture<'_, Result<(), StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut entries = self.entries.lock().map_err(|_| StoreError::Lock)?;
            entries.insert(key, value);
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> BoxFuture<'_, Result<bool, StoreError>> {
        let key = key.to_string();
        Box::pin(async move {
            let mut entries = self.entries.lock().map_err(|_| StoreError::Lock)?;
            Ok(entries.remove(&key).is_some())
        })
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        Box::pin(async move {
            let mut entries = self.entries.lock().map_err(|_| StoreError::Lock)?;
            entries.clear();
            Ok(())
        })
    }
}
