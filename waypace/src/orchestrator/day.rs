//! Day travel orchestration implementation.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::cache::{segment_key, SegmentCache};
use crate::defaults::{
    normalize_overrides, resolve_day_defaults, resolve_effective_for_edge, EffectiveTravel,
};
use crate::model::{build_edge_key, CachedSegment, DayPlan, DayTravelResult, Waypoint};
use crate::orchestrator::types::SegmentOutcome;
use crate::provider::{AsyncHttpClient, RouteError, RouteLeg, RoutesProvider};
use crate::time::unix_time_ms;

/// One adjacent located pair, resolved and keyed.
struct PairPlan {
    edge: String,
    from: Waypoint,
    to: Waypoint,
    effective: EffectiveTravel,
    key: String,
}

/// Composes resolver, cache, and provider to fill in a day's segments with
/// as few provider calls as possible.
///
/// Multiple orchestrations (e.g. for different days) may run concurrently;
/// they compete only for the provider's paced queue, never for the cache.
/// Two concurrent orchestrations of the same day are wasteful but safe:
/// cache writes are last-write-wins.
pub struct DayTravelOrchestrator<C: AsyncHttpClient> {
    provider: Arc<RoutesProvider<C>>,
    cache: Arc<SegmentCache>,
    provider_tag: String,
}

impl<C: AsyncHttpClient> DayTravelOrchestrator<C> {
    /// Create an orchestrator over the given provider and cache.
    pub fn new(
        provider: Arc<RoutesProvider<C>>,
        cache: Arc<SegmentCache>,
        provider_tag: impl Into<String>,
    ) -> Self {
        Self {
            provider,
            cache,
            provider_tag: provider_tag.into(),
        }
    }

    /// Compute (or serve from cache) every located adjacent segment of a
    /// day.
    ///
    /// `force` skips cache probes entirely but still writes fresh results
    /// under normal TTL rules. Partial failure is expected: failed edges
    /// land in `errors_by_edge` and never abort their siblings.
    pub async fn compute_travel_for_day(
        &self,
        day: &DayPlan,
        trip_defaults: &EffectiveTravel,
        force: bool,
        cancel: &CancellationToken,
    ) -> DayTravelResult {
        let day = normalize_overrides(day);
        let day_defaults = resolve_day_defaults(&day, trip_defaults);
        let now = unix_time_ms();

        // Adjacent pairs where both endpoints carry a location; unlocated
        // pairs are skipped silently, not errors.
        let mut pairs = Vec::new();
        for window in day.items.windows(2) {
            let (Some(from), Some(to)) = (&window[0].waypoint, &window[1].waypoint) else {
                continue;
            };
            let effective =
                resolve_effective_for_edge(&day, &window[0].id, &window[1].id, trip_defaults);
            pairs.push(PairPlan {
                edge: build_edge_key(&window[0].id, &window[1].id),
                from: from.clone(),
                to: to.clone(),
                effective,
                key: segment_key(
                    &self.provider_tag,
                    effective.mode,
                    effective.traffic_aware,
                    from,
                    to,
                    now,
                ),
            });
        }

        let mut result = DayTravelResult::default();

        let mut missing = Vec::new();
        for pair in pairs {
            if !force {
                if let Some(segment) = self.cache.get(&pair.key).await {
                    result.cached_count += 1;
                    result.segments_by_edge.insert(pair.edge, segment);
                    continue;
                }
            }
            missing.push(pair);
        }

        // Fast path: misses at the day default recompute the whole located
        // chain in one call; per-edge path: override-diverging misses go
        // one call each.
        let (fast, per_edge): (Vec<_>, Vec<_>) = missing
            .into_iter()
            .partition(|pair| pair.effective == day_defaults);

        if !fast.is_empty() {
            self.run_fast_path(&day, &day_defaults, fast, now, cancel, &mut result)
                .await;
        }

        for pair in per_edge {
            match self
                .provider
                .compute_pair(
                    &pair.from,
                    &pair.to,
                    pair.effective.mode,
                    pair.effective.traffic_aware,
                    cancel,
                )
                .await
            {
                Ok(leg) => {
                    let segment = self.segment_from_leg(&pair.from, &pair.to, pair.effective, &leg, now);
                    self.cache.set(&pair.key, &segment).await;
                    result.computed_count += 1;
                    result.segments_by_edge.insert(pair.edge, segment);
                }
                Err(e) => {
                    warn!(edge = %pair.edge, error = %e, "Per-edge route failed");
                    result.failed_count += 1;
                    result.errors_by_edge.insert(pair.edge, e.human_message());
                }
            }
        }

        debug!(
            computed = result.computed_count,
            cached = result.cached_count,
            failed = result.failed_count,
            "Day travel orchestration finished"
        );

        result
    }

    /// One batched call spanning every located waypoint of the day, at the
    /// day default mode. Recomputing the full chain in one call is cheaper
    /// than one call per missing pair.
    async fn run_fast_path(
        &self,
        day: &DayPlan,
        day_defaults: &EffectiveTravel,
        fast: Vec<PairPlan>,
        now: u64,
        cancel: &CancellationToken,
        result: &mut DayTravelResult,
    ) {
        let chain: Vec<Waypoint> = day
            .items
            .iter()
            .filter_map(|item| item.waypoint.clone())
            .collect();

        match self
            .provider
            .compute_chain(&chain, day_defaults.mode, day_defaults.traffic_aware, cancel)
            .await
        {
            Ok(legs) => {
                for (i, leg) in legs.iter().enumerate() {
                    let from = &chain[i];
                    let to = &chain[i + 1];
                    let key = segment_key(
                        &self.provider_tag,
                        day_defaults.mode,
                        day_defaults.traffic_aware,
                        from,
                        to,
                        now,
                    );
                    let segment = self.segment_from_leg(from, to, *day_defaults, leg, now);
                    self.cache.set(&key, &segment).await;
                }

                // The missing pairs are now populated; read them back.
                for pair in fast {
                    match self.cache.get(&pair.key).await {
                        Some(segment) => {
                            result.computed_count += 1;
                            result.segments_by_edge.insert(pair.edge, segment);
                        }
                        None => {
                            // Only reachable when the cache itself is failing open.
                            result.failed_count += 1;
                            result
                                .errors_by_edge
                                .insert(pair.edge, "Routing failed. Please retry.".to_string());
                        }
                    }
                }
            }
            Err(e) => {
                // A single batch failure cannot be disambiguated into
                // partial successes; every pair in the subset fails alike.
                warn!(error = %e, edges = fast.len(), "Batched route failed");
                let message = e.human_message();
                for pair in fast {
                    result.failed_count += 1;
                    result.errors_by_edge.insert(pair.edge, message.clone());
                }
            }
        }
    }

    /// Compute the route for one pair: cache probe, then provider, then
    /// cache write.
    pub async fn compute_segment_route(
        &self,
        from: &Waypoint,
        to: &Waypoint,
        effective: EffectiveTravel,
        force: bool,
        cancel: &CancellationToken,
    ) -> Result<SegmentOutcome, RouteError> {
        let now = unix_time_ms();
        let key = segment_key(
            &self.provider_tag,
            effective.mode,
            effective.traffic_aware,
            from,
            to,
            now,
        );

        if !force {
            if let Some(segment) = self.cache.get(&key).await {
                return Ok(SegmentOutcome::Cached(segment));
            }
        }

        let leg = self
            .provider
            .compute_pair(from, to, effective.mode, effective.traffic_aware, cancel)
            .await?;

        let segment = self.segment_from_leg(from, to, effective, &leg, now);
        self.cache.set(&key, &segment).await;
        Ok(SegmentOutcome::Computed(segment))
    }

    /// Point lookup for one pair's cached segment.
    pub async fn get_cached_segment(
        &self,
        from: &Waypoint,
        to: &Waypoint,
        effective: EffectiveTravel,
    ) -> Option<CachedSegment> {
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

    fn segment_from_leg(
        &self,
        from: &Waypoint,
        to: &Waypoint,
        effective: EffectiveTravel,
        leg: &RouteLeg,
        now: u64,
    ) -> CachedSegment {
        CachedSegment {
            from_id: Some(from.item_id.clone()),
            to_id: Some(to.item_id.clone()),
            mode: effective.mode,
            traffic_aware: effective.traffic_aware,
            distance_meters: leg.distance_meters,
            duration_seconds: leg.duration_seconds,
            geometry: leg.geometry.clone(),
            fetched_at_ms: now,
            provider_tag: self.provider_tag.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{KvStore, MemoryKvStore, TtlConfig};
    use crate::defaults::resolve_trip_defaults;
    use crate::estimate::haversine_distance;
    use crate::model::{DayItem, TravelMode, TravelOverride, TravelPrefs};
    use crate::pacing::{PacedQueue, RetryPolicy};
    use crate::provider::MockHttpClient;
    use std::time::Duration;

    fn orchestrator(
        client: Arc<MockHttpClient>,
    ) -> DayTravelOrchestrator<Arc<MockHttpClient>> {
        let provider = RoutesProvider::new(
            client,
            "test-key",
            "https://routing.test/v1/computeRoutes",
            Arc::new(PacedQueue::new("routes", Duration::from_millis(1))),
            RetryPolicy {
                max_retries: 0,
                base_backoff: Duration::from_millis(1),
            },
        );
        let cache = SegmentCache::new(
            Arc::new(MemoryKvStore::new()) as Arc<dyn KvStore>,
            TtlConfig::default(),
        );
        DayTravelOrchestrator::new(Arc::new(provider), Arc::new(cache), "routes")
    }

    fn three_stop_day() -> DayPlan {
        DayPlan {
            items: vec![
                DayItem::located("a", 48.8584, 2.2945),
                DayItem::located("b", 48.8606, 2.3376),
                DayItem::located("c", 48.8530, 2.3499),
            ],
            travel: None,
            overrides: Default::default(),
        }
    }

    fn leg_json(distance: f64, duration: &str) -> String {
        format!(
            r#"{{"distanceMeters":{},"duration":"{}"}}"#,
            distance, duration
        )
    }

    fn routes_json(legs: &[String]) -> String {
        format!(r#"{{"routes":[{{"legs":[{}]}}]}}"#, legs.join(","))
    }

    #[tokio::test]
    async fn test_cold_cache_uses_one_batched_call() {
        // Scenario: 3 located items, no overrides, walking, cold cache.
        let client = Arc::new(MockHttpClient::new());
        client.push_status(
            200,
            &routes_json(&[leg_json(3200.0, "2370s"), leg_json(1100.0, "815s")]),
        );

        let orch = orchestrator(Arc::clone(&client));
        let trip = resolve_trip_defaults(None);
        let result = orch
            .compute_travel_for_day(&three_stop_day(), &trip, false, &CancellationToken::new())
            .await;

        assert_eq!(client.call_count(), 1);
        assert_eq!(result.computed_count, 2);
        assert_eq!(result.cached_count, 0);
        assert_eq!(result.failed_count, 0);
        assert!(result.segments_by_edge.contains_key("a->b"));
        assert!(result.segments_by_edge.contains_key("b->c"));
        // The single call carried the middle stop as an intermediate.
        assert!(client.calls()[0].body.contains("intermediates"));
    }

    #[tokio::test]
    async fn test_rerun_serves_both_legs_from_cache() {
        let client = Arc::new(MockHttpClient::new());
        client.push_status(
            200,
            &routes_json(&[leg_json(3200.0, "2370s"), leg_json(1100.0, "815s")]),
        );

        let orch = orchestrator(Arc::clone(&client));
        let trip = resolve_trip_defaults(None);
        let cancel = CancellationToken::new();

        orch.compute_travel_for_day(&three_stop_day(), &trip, false, &cancel)
            .await;
        let rerun = orch
            .compute_travel_for_day(&three_stop_day(), &trip, false, &cancel)
            .await;

        // No further provider calls.
        assert_eq!(client.call_count(), 1);
        assert_eq!(rerun.cached_count, 2);
        assert_eq!(rerun.computed_count, 0);
        assert_eq!(rerun.failed_count, 0);
    }

    #[tokio::test]
    async fn test_overridden_edge_gets_its_own_call_and_key() {
        // Day default stays walking; b->c is overridden to traffic-aware
        // driving.
        let client = Arc::new(MockHttpClient::new());
        // Batched walking call over all three stops.
        client.push_status(
            200,
            &routes_json(&[leg_json(3200.0, "2370s"), leg_json(1100.0, "815s")]),
        );
        // Independent driving call for the overridden edge.
        client.push_status(200, &routes_json(&[leg_json(1400.0, "260s")]));

        let mut day = three_stop_day();
        day.overrides.insert(
            build_edge_key("b", "c"),
            TravelOverride {
                mode: TravelMode::Drive,
                traffic_aware: Some(true),
            },
        );

        let orch = orchestrator(Arc::clone(&client));
        let trip = resolve_trip_defaults(None);
        let result = orch
            .compute_travel_for_day(&day, &trip, false, &CancellationToken::new())
            .await;

        assert_eq!(client.call_count(), 2);
        assert_eq!(result.computed_count, 2);
        assert_eq!(result.failed_count, 0);
        assert_eq!(result.segments_by_edge["b->c"].mode, TravelMode::Drive);
        assert!(result.segments_by_edge["b->c"].traffic_aware);
        assert!(client.calls()[1].body.contains("TRAFFIC_AWARE"));

        // The overridden edge was cached under its driving key; the batched
        // walking call cached the same pair under its walking key too.
        let from = day.items[1].waypoint.clone().unwrap();
        let to = day.items[2].waypoint.clone().unwrap();
        let drive = EffectiveTravel {
            mode: TravelMode::Drive,
            traffic_aware: true,
        };
        let walk = EffectiveTravel {
            mode: TravelMode::Walk,
            traffic_aware: false,
        };
        let drive_hit = orch.get_cached_segment(&from, &to, drive).await.unwrap();
        let walk_hit = orch.get_cached_segment(&from, &to, walk).await.unwrap();
        assert_eq!(drive_hit.mode, TravelMode::Drive);
        assert_eq!(walk_hit.mode, TravelMode::Walk);
    }

    #[tokio::test]
    async fn test_batch_failure_marks_every_edge_alike() {
        let client = Arc::new(MockHttpClient::new());
        client.push_status(429, "{}");

        let orch = orchestrator(Arc::clone(&client));
        let trip = resolve_trip_defaults(None);
        let day = three_stop_day();
        let result = orch
            .compute_travel_for_day(&day, &trip, false, &CancellationToken::new())
            .await;

        assert_eq!(result.failed_count, 2);
        assert!(result.segments_by_edge.is_empty());
        let messages: Vec<_> = result.errors_by_edge.values().collect();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0], messages[1]);
        assert!(messages[0].contains("retry shortly"));

        // Fallback estimation stays computable for the failed edges.
        let a = day.items[0].waypoint.clone().unwrap();
        let b = day.items[1].waypoint.clone().unwrap();
        assert!(haversine_distance(a.lat, a.lon, b.lat, b.lon) > 0.0);
    }

    #[tokio::test]
    async fn test_unlocated_pairs_are_skipped_silently() {
        let client = Arc::new(MockHttpClient::new());
        let orch = orchestrator(Arc::clone(&client));
        let trip = resolve_trip_defaults(None);

        let day = DayPlan {
            items: vec![
                DayItem::located("a", 48.8584, 2.2945),
                DayItem::unlocated("b"),
                DayItem::located("c", 48.8530, 2.3499),
            ],
            travel: None,
            overrides: Default::default(),
        };

        let result = orch
            .compute_travel_for_day(&day, &trip, false, &CancellationToken::new())
            .await;

        assert_eq!(client.call_count(), 0);
        assert_eq!(result.computed_count, 0);
        assert_eq!(result.cached_count, 0);
        assert_eq!(result.failed_count, 0);
    }

    #[tokio::test]
    async fn test_force_skips_cache_but_rewrites_it() {
        let client = Arc::new(MockHttpClient::new());
        client.push_status(
            200,
            &routes_json(&[leg_json(3200.0, "2370s"), leg_json(1100.0, "815s")]),
        );
        client.push_status(
            200,
            &routes_json(&[leg_json(3300.0, "2400s"), leg_json(1150.0, "830s")]),
        );

        let orch = orchestrator(Arc::clone(&client));
        let trip = resolve_trip_defaults(None);
        let cancel = CancellationToken::new();
        let day = three_stop_day();

        orch.compute_travel_for_day(&day, &trip, false, &cancel).await;
        let forced = orch.compute_travel_for_day(&day, &trip, true, &cancel).await;

        assert_eq!(client.call_count(), 2);
        assert_eq!(forced.computed_count, 2);
        assert_eq!(forced.cached_count, 0);
        assert_eq!(forced.segments_by_edge["a->b"].distance_meters, 3300.0);
    }

    #[tokio::test]
    async fn test_per_edge_failure_never_aborts_siblings() {
        // Day default drive for a->b (fast path), b->c overridden to
        // transit; the transit call fails, the batch succeeds.
        let client = Arc::new(MockHttpClient::new());
        client.push_status(
            200,
            &routes_json(&[leg_json(3200.0, "300s"), leg_json(1100.0, "120s")]),
        );
        client.push_status(200, r#"{"routes":[]}"#);

        let mut day = three_stop_day();
        day.travel = Some(TravelPrefs {
            mode: Some(TravelMode::Drive),
            traffic_aware: None,
        });
        day.overrides.insert(
            build_edge_key("b", "c"),
            TravelOverride {
                mode: TravelMode::Transit,
                traffic_aware: None,
            },
        );

        let orch = orchestrator(Arc::clone(&client));
        let trip = resolve_trip_defaults(None);
        let result = orch
            .compute_travel_for_day(&day, &trip, false, &CancellationToken::new())
            .await;

        assert_eq!(result.computed_count, 1);
        assert_eq!(result.failed_count, 1);
        assert!(result.segments_by_edge.contains_key("a->b"));
        assert!(result.errors_by_edge.contains_key("b->c"));
    }

    #[tokio::test]
    async fn test_cancellation_fails_edges_without_cache_writes() {
        let client = Arc::new(MockHttpClient::new());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let orch = orchestrator(Arc::clone(&client));
        let trip = resolve_trip_defaults(None);
        let result = orch
            .compute_travel_for_day(&three_stop_day(), &trip, false, &cancel)
            .await;

        assert_eq!(client.call_count(), 0);
        assert_eq!(result.failed_count, 2);
        assert!(result.segments_by_edge.is_empty());
    }

    #[tokio::test]
    async fn test_compute_segment_route_caches_then_serves() {
        let client = Arc::new(MockHttpClient::new());
        client.push_status(200, &routes_json(&[leg_json(900.0, "667s")]));

        let orch = orchestrator(Arc::clone(&client));
        let from = Waypoint::new("a", 48.8584, 2.2945);
        let to = Waypoint::new("b", 48.8606, 2.3376);
        let walk = EffectiveTravel {
            mode: TravelMode::Walk,
            traffic_aware: false,
        };
        let cancel = CancellationToken::new();

        let first = orch
            .compute_segment_route(&from, &to, walk, false, &cancel)
            .await
            .unwrap();
        let second = orch
            .compute_segment_route(&from, &to, walk, false, &cancel)
            .await
            .unwrap();

        assert!(matches!(first, SegmentOutcome::Computed(_)));
        assert!(matches!(second, SegmentOutcome::Cached(_)));
        assert_eq!(client.call_count(), 1);
        assert_eq!(second.segment().unwrap().duration_seconds, 667);
    }
}
