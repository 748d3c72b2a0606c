//! Key/value store trait for dependency injection.

use std::future::Future;
use std::pin::Pin;

use crate::cache::types::StoreError;

/// Boxed future alias used to keep the store trait object-safe.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Namespaced key/value persistence abstraction.
///
/// Any embedded or remote KV store qualifies: only point get/set/remove and
/// a whole-namespace clear are required, no range scans or secondary
/// indexes. Implementations must be safe for concurrent access; writes are
/// last-write-wins with no optimistic locking.
pub trait KvStore: Send + Sync {
    /// Fetch the raw value for `key`, if present.
    fn get(&self, key: &str) -> BoxFuture<'_, Result<Option<Vec<u8>>, StoreError>>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: Vec<u8>) -> BoxFuture<'_, Result<(), StoreError>>;

    /// Remove `key`; returns whether it was present.
    fn remove(&self, key: &str) -> BoxFuture<'_, Result<bool, StoreError>>;

    /// Drop every entry in the namespace.
    fn clear(&self) -> BoxFuture<'_, Result<(), StoreError>>;
}
