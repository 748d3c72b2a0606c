//! TTL-aware segment cache over a key/value store.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::cache::kv::KvStore;
use crate::cache::types::StoreError;
use crate::model::{CachedSegment, TravelMode};
use crate::time::unix_time_ms;

/// TTL policy for cached segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlConfig {
    /// Default time-to-live (one week).
    pub default_ttl: Duration,
    /// Ceiling for transit entries regardless of the configured TTL;
    /// transit results are schedule-sensitive and decay in accuracy faster.
    pub transit_cap: Duration,
}

impl Default for TtlConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_secs(7 * 24 * 3600),
            transit_cap: Duration::from_secs(6 * 3600),
        }
    }
}

impl TtlConfig {
    fn ttl_for(&self, mode: TravelMode) -> Duration {
        if mode == TravelMode::Transit {
            self.default_ttl.min(self.transit_cap)
        } else {
            self.default_ttl
        }
    }
}

/// Stored envelope: the segment plus its own expiry stamp.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    expires_at_ms: u64,
    segment: CachedSegment,
}

/// TTL layer over a [`KvStore`].
///
/// Expired entries are never actively swept; `get` just treats them as
/// absent and they remain until overwritten. Reads fail open (a store error
/// is a miss) and write errors are swallowed - a failed cache write must
/// never fail the overall computation.
pub struct SegmentCache {
    store: Arc<dyn KvStore>,
    ttl: TtlConfig,
}

impl SegmentCache {
    /// Create a cache over the given store with the given TTL policy.
    pub fn new(store: Arc<dyn KvStore>, ttl: TtlConfig) -> Self {
        Self { store, ttl }
    }

    /// Fetch an unexpired segment, treating store errors and undecodable
    /// entries as misses.
    pub async fn get(&self, key: &str) -> Option<CachedSegment> {
        let raw = match self.store.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key, error = %e, "Cache read failed, treating as miss");
                return None;
            }
        };

        let entry: CacheEntry = match serde_json::from_slice(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(key, error = %e, "Undecodable cache entry, treating as miss");
                return None;
            }
        };

        if entry.expires_at_ms <= unix_time_ms() {
            return None;
        }

        Some(entry.segment)
    }

    /// Store a segment under the mode-appropriate TTL.
    ///
    /// Last write wins; errors are logged and dropped.
    pub async fn set(&self, key: &str, segment: &CachedSegment) {
        let ttl = self.ttl.ttl_for(segment.mode);
        let expires_at_ms = segment
            .fetched_at_ms
            .saturating_add(ttl.as_millis() as u64);

        let entry = CacheEntry {
            expires_at_ms,
            segment: segment.clone(),
        };

        let encoded = match serde_json::to_vec(&entry) {
            Ok(encoded) => encoded,
            Err(e) => {
                warn!(key, error = %e, "Failed to encode cache entry");
                return;
            }
        };

        if let Err(e) = self.store.set(key, encoded).await {
            warn!(key, error = %e, "Cache write failed, continuing without cache");
        }
    }

    /// Wipe the whole cache namespace.
    pub async fn clear(&self) -> Result<(), StoreError> {
        self.store.clear().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::kv::BoxFuture;
    use crate::cache::memory::MemoryKvStore;

    fn segment(mode: TravelMode, fetched_at_ms: u64) -> CachedSegment {
        CachedSegment {
            from_id: Some("a".to_string()),
            to_id: Some("b".to_string()),
            mode,
            traffic_aware: false,
            distance_meters: 1000.0,
            duration_seconds: 740,
            geometry: None,
            fetched_at_ms,
            provider_tag: "routes".to_string(),
        }
    }

    fn cache_with(ttl: TtlConfig) -> (Arc<MemoryKvStore>, SegmentCache) {
        let store = Arc::new(MemoryKvStore::new());
        let cache = SegmentCache::new(Arc::clone(&store) as Arc<dyn KvStore>, ttl);
        (store, cache)
    }

    #[tokio::test]
    async fn test_round_trip_before_ttl() {
        let (_store, cache) = cache_with(TtlConfig::default());
        let seg = segment(TravelMode::Walk, unix_time_ms());

        cache.set("k", &seg).await;
        assert_eq!(cache.get("k").await, Some(seg));
    }

    #[tokio::test]
    async fn test_expired_entry_reads_as_absent_but_remains_stored() {
        let (store, cache) = cache_with(TtlConfig {
            default_ttl: Duration::from_millis(20),
            transit_cap: Duration::from_secs(3600),
        });
        let seg = segment(TravelMode::Walk, unix_time_ms());

        cache.set("k", &seg).await;
        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(cache.get("k").await, None);
        // No sweeping: the raw entry stays until overwritten.
        assert!(store.get("k").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_transit_ttl_is_capped() {
        let (store, cache) = cache_with(TtlConfig::default());
        let now = unix_time_ms();

        cache.set("walk", &segment(TravelMode::Walk, now)).await;
        cache.set("transit", &segment(TravelMode::Transit, now)).await;

        let decode = |raw: Vec<u8>| -> CacheEntry { serde_json::from_slice(&raw).unwrap() };
        let walk = decode(store.get("walk").await.unwrap().unwrap());
        let transit = decode(store.get("transit").await.unwrap().unwrap());

        assert_eq!(walk.expires_at_ms, now + 7 * 24 * 3600 * 1000);
        assert_eq!(transit.expires_at_ms, now + 6 * 3600 * 1000);
    }

    #[tokio::test]
    async fn test_overwrite_replaces_segment() {
        let (_store, cache) = cache_with(TtlConfig::default());
        let now = unix_time_ms();

        cache.set("k", &segment(TravelMode::Walk, now)).await;
        let mut fresher = segment(TravelMode::Walk, now + 1000);
        fresher.duration_seconds = 600;
        cache.set("k", &fresher).await;

        assert_eq!(cache.get("k").await.unwrap().duration_seconds, 600);
    }

    #[tokio::test]
    async fn test_undecodable_entry_is_a_miss() {
        let (store, cache) = cache_with(TtlConfig::default());
        store.set("k", b"not json".to_vec()).await.unwrap();
        assert_eq!(cache.get("k").await, None);
    }

    /// Store whose every operation fails.
    struct FailingStore;

    impl KvStore for FailingStore {
        fn get(&self, _key: &str) -> BoxFuture<'_, Result<Option<Vec<u8>>, StoreError>> {
            Box::pin(async { Err(StoreError::Unavailable("down".to_string())) })
        }
        fn set(&self, _key: &str, _value: Vec<u8>) -> BoxFuture<'_, Result<(), StoreError>> {
            Box::pin(async { Err(StoreError::Unavailable("down".to_string())) })
        }
        fn remove(&self, _key: &str) -> BoxFuture<'_, Result<bool, StoreError>> {
            Box::pin(async { Err(StoreError::Unavailable("down".to_string())) })
        }
        fn clear(&self) -> BoxFuture<'_, Result<(), StoreError>> {
            Box::pin(async { Err(StoreError::Unavailable("down".to_string())) })
        }
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_open() {
        let cache = SegmentCache::new(Arc::new(FailingStore), TtlConfig::default());

        // Read errors are misses, write errors are dropped.
        assert_eq!(cache.get("k").await, None);
        cache.set("k", &segment(TravelMode::Walk, unix_time_ms())).await;

        // Administrative clear does surface the failure.
        assert!(cache.clear().await.is_err());
    }
}
