//! Time-related utility functions.
//!
//! This module provides helpers for working with wall-clock time, which the
//! engine uses for cache expiry stamps and the transit hour bucket.

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as Unix milliseconds.
///
/// Saturates to zero if the system clock reports a time before the epoch.
pub fn unix_time_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Floor a Unix-millisecond timestamp to its containing hour, in seconds.
///
/// Transit cache keys embed this bucket so entries naturally age out hourly.
/// A request issued exactly at a bucket boundary lands in whichever bucket
/// the clock read falls into; this is an accepted approximation.
pub fn hour_bucket_secs(unix_ms: u64) -> u64 {
    (unix_ms / 3_600_000) * 3600
}
