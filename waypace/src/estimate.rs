//! Fallback distance/duration estimation.
//!
//! Pure helpers used whenever no provider segment exists (no credentials,
//! uncomputed, or failed). Estimates are always computed on demand and never
//! cached.

use crate::model::TravelMode;

/// Mean Earth radius in meters (IUGG).
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Assumed walking speed in meters per second.
const WALK_SPEED_MPS: f64 = 1.35;
/// Assumed driving speed in meters per second.
const DRIVE_SPEED_MPS: f64 = 11.11;
/// Assumed transit speed in meters per second.
const TRANSIT_SPEED_MPS: f64 = 6.94;

/// Great-circle distance in meters between two points, by the haversine
/// formula.
///
/// # Arguments
///
/// * `lat1`, `lon1` - First point in decimal degrees
/// * `lat2`, `lon2` - Second point in decimal degrees
pub fn haversine_distance(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let d_phi = (lat2 - lat1).to_radians();
    let d_lambda = (lon2 - lon1).to_radians();

    let a = (d_phi / 2.0).sin().powi(2) + phi1.cos() * phi2.cos() * (d_lambda / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Estimate travel duration in whole seconds for a distance and mode.
///
/// Uses a flat per-mode speed; rounds up so short hops never estimate to
/// zero seconds.
pub fn estimate_duration(distance_meters: f64, mode: TravelMode) -> u64 {
    let speed = match mode {
        TravelMode::Walk => WALK_SPEED_MPS,
        TravelMode::Drive => DRIVE_SPEED_MPS,
        TravelMode::Transit => TRANSIT_SPEED_MPS,
    };

    let seconds = (distance_meters / speed).ceil();
    if seconds <= 0.0 {
        0
    } else {
        seconds as u64
    }
}
