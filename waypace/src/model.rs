//! Core domain types shared across the engine.
//!
//! Waypoints are ephemeral, derived from itinerary items at call time; the
//! itinerary itself is owned by the caller. The only value this engine
//! persists is [`CachedSegment`], which is immutable once written - a later
//! fetch replaces it rather than mutating it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Travel mode for a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TravelMode {
    /// On foot.
    Walk,
    /// Driving, optionally traffic-aware.
    Drive,
    /// Public transit; results are schedule-sensitive.
    Transit,
}

impl TravelMode {
    /// Wire representation used in provider requests and cache keys.
    pub fn as_wire(&self) -> &'static str {
        match self {
            TravelMode::Walk => "WALK",
            TravelMode::Drive => "DRIVE",
            TravelMode::Transit => "TRANSIT",
        }
    }
}

/// A geographic point associated with one itinerary item.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    /// Opaque identifier of the itinerary item this point belongs to.
    pub item_id: String,
    /// Latitude in decimal degrees.
    pub lat: f64,
    /// Longitude in decimal degrees.
    pub lon: f64,
}

impl Waypoint {
    /// Create a new waypoint.
    pub fn new(item_id: impl Into<String>, lat: f64, lon: f64) -> Self {
        Self {
            item_id: item_id.into(),
            lat,
            lon,
        }
    }
}

/// A per-edge deviation from the day/trip default travel mode.
///
/// `traffic_aware` is only meaningful when `mode` is [`TravelMode::Drive`];
/// `None` means "inherit the day default's traffic flag".
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TravelOverride {
    /// Override travel mode for this edge.
    pub mode: TravelMode,
    /// Traffic-awareness preference, `None` to inherit.
    pub traffic_aware: Option<bool>,
}

/// Trip- or day-level travel preferences as expressed by the caller.
///
/// Both fields are optional; resolution falls back through the
/// trip -> day -> edge hierarchy (see [`crate::defaults`]).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TravelPrefs {
    /// Preferred travel mode, if any.
    pub mode: Option<TravelMode>,
    /// Traffic-awareness preference, meaningful for driving only.
    pub traffic_aware: Option<bool>,
}

/// One item in a day's ordered itinerary.
#[derive(Debug, Clone, PartialEq)]
pub struct DayItem {
    /// Opaque item identifier.
    pub id: String,
    /// Location, if the item has been geocoded by the caller.
    pub waypoint: Option<Waypoint>,
}

impl DayItem {
    /// Create an item with a location.
    pub fn located(id: impl Into<String>, lat: f64, lon: f64) -> Self {
        let id = id.into();
        let waypoint = Some(Waypoint::new(id.clone(), lat, lon));
        Self { id, waypoint }
    }

    /// Create an item without a location.
    pub fn unlocated(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            waypoint: None,
        }
    }
}

/// A day's ordered itinerary with its travel preferences and overrides.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DayPlan {
    /// Ordered itinerary items.
    pub items: Vec<DayItem>,
    /// Day-level travel preferences, overriding the trip's.
    pub travel: Option<TravelPrefs>,
    /// Per-edge overrides keyed by [`build_edge_key`].
    pub overrides: HashMap<String, TravelOverride>,
}

/// A computed (or provider-fetched) travel segment between two waypoints.
///
/// Immutable once written to the cache. Geometry points are ordered
/// `(lat, lon)` to match common mapping-library expectations, even though
/// raw provider coordinates travel as `(lon, lat)` pairs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedSegment {
    /// Item id of the origin waypoint, when known.
    pub from_id: Option<String>,
    /// Item id of the destination waypoint, when known.
    pub to_id: Option<String>,
    /// Travel mode this segment was computed for.
    pub mode: TravelMode,
    /// Whether traffic-aware routing was requested (driving only).
    pub traffic_aware: bool,
    /// Travel distance in meters.
    pub distance_meters: f64,
    /// Travel duration in whole seconds.
    pub duration_seconds: u64,
    /// Route geometry as `(lat, lon)` points, if the provider returned one.
    pub geometry: Option<Vec<(f64, f64)>>,
    /// Unix milliseconds at which the segment was fetched.
    pub fetched_at_ms: u64,
    /// Provider tag the segment came from.
    pub provider_tag: String,
}

/// Per-day orchestration outcome.
///
/// Built fresh per call and never persisted. Partial failure is expected:
/// the caller renders whatever succeeded and falls back to estimation for
/// edges listed in `errors_by_edge`.
#[derive(Debug, Clone, Default)]
pub struct DayTravelResult {
    /// Segments computed via the provider during this call.
    pub computed_count: usize,
    /// Segments served from the cache.
    pub cached_count: usize,
    /// Edges that failed to compute.
    pub failed_count: usize,
    /// Successful segments keyed by edge key.
    pub segments_by_edge: HashMap<String, CachedSegment>,
    /// Normalized human-readable errors keyed by edge key.
    pub errors_by_edge: HashMap<String, String>,
}

/// Build the deterministic key for a directed edge between two items.
///
/// Not symmetric: `build_edge_key(a, b) != build_edge_key(b, a)`.
pub fn build_edge_key(from_id: &str, to_id: &str) -> String {
    format!("{}->{}", from_id, to_id)
}
