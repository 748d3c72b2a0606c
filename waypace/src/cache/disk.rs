//! Embedded disk-backed key/value store.
//!
//! One file per hashed key under a cache directory, written atomically via a
//! temp file and rename. Suitable for a single local process; a remote or
//! transactional KV store can be substituted through the [`KvStore`] trait.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::cache::kv::{BoxFuture, KvStore};
use crate::cache::types::StoreError;

const ENTRY_EXTENSION: &str = "seg";

/// Disk-backed store rooted at one directory.
pub struct DiskKvStore {
    directory: PathBuf,
}

impl DiskKvStore {
    /// Open (creating if needed) a store rooted at `directory`.
    pub fn open(directory: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let directory = directory.into();
        std::fs::create_dir_all(&directory)?;
        debug!(dir = %directory.display(), "Opened disk segment store");
        Ok(Self { directory })
    }

    /// Generate a safe filename from a cache key.
    fn key_to_filename(key: &str) -> String {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        format!("{:016x}.{}", hasher.finish(), ENTRY_EXTENSION)
    }

    /// Get the file path for a cache key.
    fn key_path(&self, key: &str) -> PathBuf {
        self.directory.join(Self::key_to_filename(key))
    }

    fn is_entry(path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == ENTRY_EXTENSION)
    }
}

impl KvStore for DiskKvStore {
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<Vec<u8>>, StoreError>> {
        let path = self.key_path(key);
        Box::pin(async move {
            match tokio::fs::read(&path).await {
                Ok(data) => Ok(Some(data)),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
                Err(e) => Err(StoreError::Io(e)),
            }
        })
    }

    fn set(&self, key: &str, value: Vec<u8>) -> BoxFuture<'_, Result<(), StoreError>> {
        let path = self.key_path(key);
        Box::pin(async move {
            // Write atomically via temp file.
            let temp_path = path.with_extension("tmp");
            tokio::fs::write(&temp_path, &value)
                .await
                .map_err(StoreError::Io)?;
            tokio::fs::rename(&temp_path, &path)
                .await
                .map_err(StoreError::Io)?;
            Ok(())
        })
    }

    fn remove(&self, key: &str) -> BoxFuture<'_, Result<bool, StoreError>> {
        let path = self.key_path(key);
        Box::pin(async move {
            match tokio::fs::remove_file(&path).await {
                Ok(()) => Ok(true),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
                Err(e) => Err(StoreError::Io(e)),
            }
        })
    }

    fn clear(&self) -> BoxFuture<'_, Result<(), StoreError>> {
        let directory = self.directory.clone();
        Box::pin(async move {
            let mut dir = tokio::fs::read_dir(&directory).await.map_err(StoreError::Io)?;
            while let Some(entry) = dir.next_entry().await.map_err(StoreError::Io)? {
                let path = entry.path();
                if Self::is_entry(&path) {
                    // A concurrent remove is not an error.
                    let _ = tokio::fs::remove_file(&path).await;
                }
            }
            Ok(())
        })
    }
}
