//! Wire DTOs for the routing provider contract.
//!
//! Raw coordinate pairs travel as `(longitude, latitude)` arrays; returned
//! geometry is surfaced to the rest of the engine as `(latitude, longitude)`
//! points to match common mapping-library expectations. The asymmetry is
//! intentional and must not be "fixed" to one consistent order.

use serde::{Deserialize, Serialize};

use crate::model::{TravelMode, Waypoint};
use crate::provider::types::RouteError;

/// A point on the wire: `coordinates` is `[lon, lat]`.
#[derive(Debug, Serialize)]
pub(crate) struct PointDto {
    pub coordinates: [f64; 2],
}

impl PointDto {
    pub fn from_waypoint(wp: &Waypoint) -> Self {
        Self {
            coordinates: [wp.lon, wp.lat],
        }
    }
}

/// Request body for a single-pair or multi-waypoint route computation.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RouteRequestDto {
    pub origin: PointDto,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub intermediates: Vec<PointDto>,
    pub destination: PointDto,
    pub travel_mode: &'static str,
    /// Only attached for traffic-aware driving.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_preference: Option<&'static str>,
    /// RFC 3339 departure time; only attached for transit.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<String>,
    /// Ask for a lightweight route geometry.
    pub polyline_quality: &'static str,
}

impl RouteRequestDto {
    /// Build a request for an ordered waypoint chain at one mode/traffic
    /// setting. `waypoints` must have at least two entries.
    pub fn for_chain(
        waypoints: &[Waypoint],
        mode: TravelMode,
        traffic_aware: bool,
        departure_time: Option<String>,
    ) -> Self {
        let origin = PointDto::from_waypoint(&waypoints[0]);
        let destination = PointDto::from_waypoint(&waypoints[waypoints.len() - 1]);
        let intermediates = waypoints[1..waypoints.len() - 1]
            .iter()
            .map(PointDto::from_waypoint)
            .collect();

        let routing_preference = if mode == TravelMode::Drive && traffic_aware {
            Some("TRAFFIC_AWARE")
        } else {
            None
        };

        Self {
            origin,
            intermediates,
            destination,
            travel_mode: mode.as_wire(),
            routing_preference,
            departure_time,
            polyline_quality: "OVERVIEW",
        }
    }
}

/// Top-level response body.
#[derive(Debug, Deserialize)]
pub(crate) struct RouteResponseDto {
    #[serde(default)]
    pub routes: Vec<RouteDto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RouteDto {
    #[serde(default)]
    pub legs: Vec<LegDto>,
}

/// One leg of a returned route.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct LegDto {
    pub distance_meters: Option<f64>,
    pub duration: Option<DurationDto>,
    pub geometry: Option<GeometryDto>,
}

/// Duration as the provider sends it: either a bare number of seconds or a
/// `"<secs>s"` suffixed string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum DurationDto {
    Seconds(f64),
    Text(String),
}

impl DurationDto {
    /// Parse to whole seconds, rounding to the nearest second.
    pub fn to_seconds(&self) -> Result<u64, RouteError> {
        let raw = match self {
            DurationDto::Seconds(s) => *s,
            DurationDto::Text(text) => text
                .strip_suffix('s')
                .unwrap_or(text)
                .trim()
                .parse::<f64>()
                .map_err(|_| {
                    RouteError::MalformedResponse(format!("unparsable duration {:?}", text))
                })?,
        };

        if raw.is_finite() && raw >= 0.0 {
            Ok(raw.round() as u64)
        } else {
            Err(RouteError::MalformedResponse(format!(
                "non-finite duration {}",
                raw
            )))
        }
    }
}

/// A line-string-like geometry: `coordinates` is `[[lon, lat], ...]`.
#[derive(Debug, Deserialize)]
pub(crate) struct GeometryDto {
    #[serde(default)]
    pub coordinates: Vec<[f64; 2]>,
}

impl GeometryDto {
    /// Convert wire `(lon, lat)` pairs to `(lat, lon)` points.
    pub fn to_lat_lon(&self) -> Vec<(f64, f64)> {
        self.coordinates.iter().map(|c| (c[1], c[0])).collect()
    }
}
