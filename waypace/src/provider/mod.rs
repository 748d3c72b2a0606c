//! Routing provider abstraction.
//!
//! This module provides the HTTP client abstraction, the wire DTOs, the
//! provider error taxonomy, and the [`RoutesProvider`] adapter that issues
//! single-pair and multi-waypoint route computations through a paced queue.

mod dto;
pub mod http;
mod routes;
mod types;

pub use http::{AsyncHttpClient, HttpRequest, HttpResponse, ReqwestClient, TransportError};
pub use routes::{RouteLeg, RoutesProvider, DEFAULT_ENDPOINT};
pub use types::RouteError;

#[cfg(test)]
pub use http::tests::MockHttpClient;
