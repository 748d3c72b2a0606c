//! Routing provider adapter.
//!
//! Two call shapes: a single origin/destination pair, and an ordered
//! multi-waypoint chain computed in one request. Every call goes through the
//! target's paced queue with transient-failure retry, and accepts a
//! cancellation token.

use std::sync::Arc;

use chrono::{SecondsFormat, Utc};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::model::{TravelMode, Waypoint};
use crate::pacing::{send_with_retry, PacedQueue, RetryPolicy};
use crate::provider::dto::{LegDto, RouteRequestDto, RouteResponseDto};
use crate::provider::http::{AsyncHttpClient, HttpRequest};
use crate::provider::types::RouteError;

/// Default route computation endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://routing.waypace.dev/v1/computeRoutes";

/// One leg of a computed route: consecutive-pair distance, duration, and an
/// optional lightweight geometry in `(lat, lon)` order.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteLeg {
    /// Distance in meters.
    pub distance_meters: f64,
    /// Duration in whole seconds.
    pub duration_seconds: u64,
    /// Route geometry as `(lat, lon)` points, if returned.
    pub geometry: Option<Vec<(f64, f64)>>,
}

/// Adapter over the external routing HTTP service.
pub struct RoutesProvider<C: AsyncHttpClient> {
    client: C,
    api_key: String,
    endpoint: String,
    queue: Arc<PacedQueue>,
    retry: RetryPolicy,
}

impl<C: AsyncHttpClient> RoutesProvider<C> {
    /// Create a provider adapter.
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client (real or mock)
    /// * `api_key` - Provider credentials
    /// * `endpoint` - Route computation URL
    /// * `queue` - Paced queue for this provider's target name
    /// * `retry` - Transient-failure retry policy
    pub fn new(
        client: C,
        api_key: impl Into<String>,
        endpoint: impl Into<String>,
        queue: Arc<PacedQueue>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            endpoint: endpoint.into(),
            queue,
            retry,
        }
    }

    /// Compute the route for a single ordered pair.
    pub async fn compute_pair(
        &self,
        from: &Waypoint,
        to: &Waypoint,
        mode: TravelMode,
        traffic_aware: bool,
        cancel: &CancellationToken,
    ) -> Result<RouteLeg, RouteError> {
        let legs = self
            .compute_chain(
                &[from.clone(), to.clone()],
                mode,
                traffic_aware,
                cancel,
            )
            .await?;

        // compute_chain already enforced the leg count.
        legs.into_iter()
            .next()
            .ok_or(RouteError::LegCountMismatch {
                expected: 1,
                actual: 0,
            })
    }

    /// Compute an ordered multi-waypoint chain in one request.
    ///
    /// Returns one leg per consecutive pair. A response whose leg count does
    /// not equal `waypoints.len() - 1` is a hard error; a malformed batch is
    /// never partially accepted.
    pub async fn compute_chain(
        &self,
        waypoints: &[Waypoint],
        mode: TravelMode,
        traffic_aware: bool,
        cancel: &CancellationToken,
    ) -> Result<Vec<RouteLeg>, RouteError> {
        if waypoints.len() < 2 {
            return Err(RouteError::InvalidRequest(
                "route chain requires at least two waypoints",
            ));
        }

        // Transit results are schedule-sensitive; pin the departure to now.
        let departure_time = (mode == TravelMode::Transit)
            .then(|| Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true));

        let request_dto =
            RouteRequestDto::for_chain(waypoints, mode, traffic_aware, departure_time);
        let body = serde_json::to_string(&request_dto)
            .map_err(|_| RouteError::InvalidRequest("unserializable route request"))?;

        debug!(
            mode = mode.as_wire(),
            traffic_aware,
            waypoints = waypoints.len(),
            "Dispatching route computation"
        );

        let request = HttpRequest {
            url: self.endpoint.clone(),
            headers: vec![("X-Api-Key".to_string(), self.api_key.clone())],
            body,
        };

        let response =
            send_with_retry(&self.queue, &self.client, &request, &self.retry, cancel).await?;

        if !response.is_success() {
            return Err(RouteError::from_status(response.status, &response.body));
        }

        let parsed: RouteResponseDto = serde_json::from_slice(&response.body)
            .map_err(|e| RouteError::MalformedResponse(format!("undecodable body: {}", e)))?;

        let route = parsed.routes.into_iter().next().ok_or(RouteError::NoRoute)?;

        let expected = waypoints.len() - 1;
        if route.legs.len() != expected {
            return Err(RouteError::LegCountMismatch {
                expected,
                actual: route.legs.len(),
            });
        }

        route.legs.into_iter().map(leg_from_dto).collect()
    }
}

fn leg_from_dto(leg: LegDto) -> Result<RouteLeg, RouteError> {
    let distance_meters = leg
        .distance_meters
        .ok_or_else(|| RouteError::MalformedResponse("leg missing distanceMeters".to_string()))?;
    let duration_seconds = leg
        .duration
        .ok_or_else(|| RouteError::MalformedResponse("leg missing duration".to_string()))?
        .to_seconds()?;
    let geometry = leg
        .geometry
        .map(|g| g.to_lat_lon())
        .filter(|points| !points.is_empty());

    Ok(RouteLeg {
        distance_meters,
        duration_seconds,
        geometry,
    })
}
