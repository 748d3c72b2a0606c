//! High-level facade and composition root.
//!
//! `TravelService` wires the queue registry, segment cache, HTTP client, and
//! provider adapter together and exposes the caller-facing API. It is the
//! only place that owns shared pacing state; everything below it receives
//! its queue by injection.
//!
//! # Usage
//!
//! ```ignore
//! use waypace::service::{CacheBackend, ServiceConfig, TravelService};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = ServiceConfig::default()
//!     .with_api_key("YOUR_API_KEY")
//!     .with_cache(CacheBackend::Disk("/var/cache/waypace".into()));
//! let service = TravelService::new(config)?;
//!
//! let result = service
//!     .compute_travel_for_day(&day, None, false, &CancellationToken::new())
//!     .await;
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::cache::{DiskKvStore, KvStore, MemoryKvStore, SegmentCache, StoreError, TtlConfig};
use crate::defaults::{resolve_effective_for_edge, resolve_trip_defaults, EffectiveTravel};
use crate::model::{CachedSegment, DayPlan, DayTravelResult, TravelPrefs, Waypoint};
use crate::orchestrator::{DayTravelOrchestrator, SegmentOutcome};
use crate::pacing::{QueueRegistry, RetryPolicy};
use crate::provider::{ReqwestClient, RouteError, RoutesProvider, DEFAULT_ENDPOINT};

/// Which key/value backend holds the segment cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheBackend {
    /// In-process map; nothing survives a restart.
    Memory,
    /// One-file-per-entry store under the given directory.
    Disk(PathBuf),
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Upstream target name; also the pacing queue name and the tag stored
    /// on every cached segment.
    pub provider_tag: String,
    /// Provider credentials. `None` is an expected state: computations
    /// report [`SegmentOutcome::NoApiKey`] and the caller falls back to
    /// estimation.
    pub api_key: Option<String>,
    /// Route computation endpoint.
    pub endpoint: String,
    /// Minimum interval between provider dispatches.
    pub min_dispatch_interval: Duration,
    /// Transient-failure retry policy.
    pub retry: RetryPolicy,
    /// Cache TTL policy.
    pub ttl: TtlConfig,
    /// Cache backend.
    pub cache: CacheBackend,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            provider_tag: "routes".to_string(),
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            min_dispatch_interval: Duration::from_millis(1000),
            retry: RetryPolicy::default(),
            ttl: TtlConfig::default(),
            cache: CacheBackend::Memory,
        }
    }
}

impl ServiceConfig {
    /// Set the provider API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the cache backend.
    pub fn with_cache(mut self, cache: CacheBackend) -> Self {
        self.cache = cache;
        self
    }

    /// Set the route computation endpoint.
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

/// Errors from service construction or administrative operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The HTTP client could not be built.
    #[error("failed to create HTTP client: {0}")]
    Http(String),
    /// The cache backend could not be opened or cleared.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// The composed travel routing engine.
pub struct TravelService {
    cache: Arc<SegmentCache>,
    provider_tag: String,
    orchestrator: Option<DayTravelOrchestrator<ReqwestClient>>,
    /// Kept so every component asking for this provider's queue shares one
    /// pacing lane.
    _registry: QueueRegistry,
}

impl TravelService {
    /// Build the engine from configuration.
    pub fn new(config: ServiceConfig) -> Result<Self, ServiceError> {
        let store: Arc<dyn KvStore> = match &config.cache {
            CacheBackend::Memory => Arc::new(MemoryKvStore::new()),
            CacheBackend::Disk(dir) => Arc::new(DiskKvStore::open(dir.clone())?),
        };
        let cache = Arc::new(SegmentCache::new(store, config.ttl));

        let registry = QueueRegistry::new(config.min_dispatch_interval);

        let orchestrator = match &config.api_key {
            None => {
                info!(provider = %config.provider_tag, "No API key configured; serving cache and estimates only");
                None
            }
            Some(key) => {
                let client =
                    ReqwestClient::new().map_err(|e| ServiceError::Http(e.to_string()))?;
                let provider = RoutesProvider::new(
                    client,
                    key.clone(),
                    config.endpoint.clone(),
                    registry.queue(&config.provider_tag),
                    config.retry,
                );
                Some(DayTravelOrchestrator::new(
                    Arc::new(provider),
                    Arc::clone(&cache),
                    config.provider_tag.clone(),
                ))
            }
        };

        Ok(Self {
            cache,
            provider_tag: config.provider_tag,
            orchestrator,
            _registry: registry,
        })
    }

    /// Whether provider credentials are configured.
    pub fn has_api_key(&self) -> bool {
        self.orchestrator.is_some()
    }

    /// Fill in a day's travel segments.
    ///
    /// Without credentials this serves cache hits only; misses are simply
    /// absent from the result (not failures) and the caller estimates them.
    pub async fn compute_travel_for_day(
        &self,
        day: &DayPlan,
        trip_prefs: Option<&TravelPrefs>,
        force: bool,
        cancel: &CancellationToken,
    ) -> DayTravelResult {
        let trip_defaults = resolve_trip_defaults(trip_prefs);

        match &self.orchestrator {
            Some(orchestrator) => {
                orchestrator
                    .compute_travel_for_day(day, &trip_defaults, force, cancel)
                    .await
            }
            None => self.cache_only_day(day, &trip_defaults, force).await,
        }
    }

    /// Compute one segment's route.
    pub async fn compute_segment_route(
        &self,
        from: &Waypoint,
        to: &Waypoint,
        effective: EffectiveTravel,
        force: bool,
        cancel: &CancellationToken,
    ) -> Result<SegmentOutcome, RouteError> {
        match &self.orchestrator {
            Some(orchestrator) => {
                orchestrator
                    .compute_segment_route(from, to, effective, force, cancel)
                    .await
            }
            None => Ok(SegmentOutcome::NoApiKey),
        }
    }

    /// Point lookup for one pair's cached segment.
    pub async fn get_cached_segment(
        &self,
        from: &Waypoint,
        to: &Waypoint,
        effective: EffectiveTravel,
    ) -> Option<CachedSegment> {
        use crate::cache::segment_key;
        use crate::time::unix_time_ms;

        // Works with or without credentials; the cache is shared.
        let key = segment_key(
            &self.provider_tag,
            effective.mode,
            effective.traffic_aware,
            from,
            to,
            unix_time_ms(),
        );
        self.cache.get(&key).await
    }

    /// Administratively wipe the cache namespace.
    pub async fn clear_cache(&self) -> Result<(), ServiceError> {
        self.cache.clear().await?;
        info!("Segment cache cleared");
        Ok(())
    }

    /// Cache-only orchestration used when no credentials are configured.
    async fn cache_only_day(
        &self,
        day: &DayPlan,
        trip_defaults: &EffectiveTravel,
        force: bool,
    ) -> DayTravelResult {
        use crate::cache::segment_key;
        use crate::defaults::normalize_overrides;
        use crate::model::build_edge_key;
        use crate::time::unix_time_ms;

        let mut result = DayTravelResult::default();
        if force {
            return result;
        }

        let day = normalize_overrides(day);
        let now = unix_time_ms();

        for window in day.items.windows(2) {
            let (Some(from), Some(to)) = (&window[0].waypoint, &window[1].waypoint) else {
                continue;
            };
            let effective =
                resolve_effective_for_edge(&day, &window[0].id, &window[1].id, trip_defaults);
            let key = segment_key(
                &self.provider_tag,
                effective.mode,
                effective.traffic_aware,
                from,
                to,
                now,
            );
            if let Some(segment) = self.cache.get(&key).await {
                result.cached_count += 1;
                result
                    .segments_by_edge
                    .insert(build_edge_key(&window[0].id, &window[1].id), segment);
            }
        }

        debug!(cached = result.cached_count, "Cache-only day lookup finished");
        result
    }
}
