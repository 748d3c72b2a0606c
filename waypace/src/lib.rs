//! Waypace - travel segment routing and cache engine
//!
//! This library estimates and caches travel time/distance between consecutive
//! stops in a day's itinerary, pacing calls to an external routing provider
//! and minimizing them through batching and a TTL-aware segment cache.
//!
//! # High-Level API
//!
//! For most use cases, the [`service`] module provides a simplified facade:
//!
//! ```ignore
//! use waypace::service::{ServiceConfig, TravelService};
//! use tokio_util::sync::CancellationToken;
//!
//! let config = ServiceConfig::default().with_api_key("YOUR_API_KEY");
//! let service = TravelService::new(config)?;
//!
//! let result = service
//!     .compute_travel_for_day(&day, None, false, &CancellationToken::new())
//!     .await;
//! ```

pub mod cache;
pub mod defaults;
pub mod estimate;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod pacing;
pub mod provider;
pub mod service;
pub mod time;

pub use defaults::{
    normalize_overrides, resolve_day_defaults, resolve_effective_for_edge, resolve_trip_defaults,
    set_override, EffectiveTravel,
};
pub use estimate::{estimate_duration, haversine_distance};
pub use model::{build_edge_key, TravelMode, Waypoint};

/// Version of the waypace library and CLI.
///
/// This is synchronized across all components in the workspace.
/// The version is defined in `Cargo.toml` and injected at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
