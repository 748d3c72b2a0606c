//! Deterministic, versioned segment cache keys.
//!
//! Coordinates are rounded to 5 decimal places (~1.1 m resolution), enough
//! to absorb floating noise while staying geographically meaningful. Transit
//! keys additionally embed an hour-floor time bucket so transit entries
//! naturally age out hourly; walk/drive keys are time-independent.

use crate::model::{TravelMode, Waypoint};
use crate::time::hour_bucket_secs;

/// Cache schema version. Bump to invalidate all prior entries on a format
/// change.
pub const SCHEMA_VERSION: &str = "v1";

/// Derive the cache key for a directed segment.
///
/// The traffic flag is normalized to `false` for any mode other than
/// driving before it enters the key, so a stray flag can never split the
/// cache. `now_ms` only participates for transit.
pub fn segment_key(
    provider_tag: &str,
    mode: TravelMode,
    traffic_aware: bool,
    from: &Waypoint,
    to: &Waypoint,
    now_ms: u64,
) -> String {
    let traffic = mode == TravelMode::Drive && traffic_aware;

    let mut key = format!(
        "{}:{}:{}:{}:{:.5},{:.5}->{:.5},{:.5}",
        provider_tag,
        SCHEMA_VERSION,
        mode.as_wire(),
        u8::from(traffic),
        from.lat,
        from.lon,
        to.lat,
        to.lon,
    );

    if mode == TravelMode::Transit {
        key.push_str(&format!("@{}", hour_bucket_secs(now_ms)));
    }

    key
}
