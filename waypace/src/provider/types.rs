//! Provider error taxonomy and response-status mapping.

use serde::Deserialize;
use thiserror::Error;

use crate::pacing::PacingError;

/// Errors surfaced by the routing provider adapter.
///
/// Transient statuses (429, >= 500) have already been retried by the pacing
/// layer before they reach this taxonomy.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum RouteError {
    /// Bad or missing credentials (HTTP 401/403).
    #[error("provider rejected credentials")]
    Auth,
    /// Rate or quota exceeded (HTTP 429, post-retry).
    #[error("provider quota or rate limit exceeded")]
    Quota,
    /// The provider returned zero routes for the pair.
    #[error("no route found between waypoints")]
    NoRoute,
    /// Response decoded but lacked required fields.
    #[error("malformed provider response: {0}")]
    MalformedResponse(String),
    /// Batch response leg count did not match the waypoint chain.
    #[error("expected {expected} legs, provider returned {actual}")]
    LegCountMismatch { expected: usize, actual: usize },
    /// The request was rejected before dispatch.
    #[error("invalid request: {0}")]
    InvalidRequest(&'static str),
    /// Any other non-success HTTP status.
    #[error("provider returned HTTP {0}")]
    Status(u16),
    /// Transport failure after retries.
    #[error("transport error: {0}")]
    Transport(String),
    /// The caller cancelled the request.
    #[error("request cancelled")]
    Cancelled,
}

impl RouteError {
    /// Short, normalized message suitable for display next to an edge.
    pub fn human_message(&self) -> String {
        match self {
            RouteError::Auth => {
                "Routing request not authorized - check API key restrictions and billing."
                    .to_string()
            }
            RouteError::Quota => {
                "Routing quota or rate limit reached. Please retry shortly.".to_string()
            }
            RouteError::NoRoute => "No route found for this travel mode.".to_string(),
            RouteError::Cancelled => "Routing request was cancelled.".to_string(),
            RouteError::Transport(_) => {
                "Could not reach the routing service. Please retry shortly.".to_string()
            }
            RouteError::MalformedResponse(_)
            | RouteError::LegCountMismatch { .. }
            | RouteError::InvalidRequest(_)
            | RouteError::Status(_) => "Routing failed. Please retry.".to_string(),
        }
    }

    /// Map a non-success HTTP status (plus its error payload, if any) to a
    /// taxonomy variant.
    ///
    /// Unknown payload shapes degrade to the plain status variant rather
    /// than guessing at undocumented fields.
    pub(crate) fn from_status(status: u16, body: &[u8]) -> Self {
        match status {
            401 | 403 => RouteError::Auth,
            429 => RouteError::Quota,
            _ => match serde_json::from_slice::<ErrorEnvelope>(body) {
                Ok(envelope) if envelope.error.is_some() => {
                    let detail = envelope.error.unwrap_or_default();
                    RouteError::MalformedResponse(format!(
                        "HTTP {}: {} ({})",
                        status,
                        detail.message.unwrap_or_else(|| "unknown".to_string()),
                        detail.status.unwrap_or_else(|| "UNKNOWN".to_string()),
                    ))
                }
                _ => RouteError::Status(status),
            },
        }
    }
}

impl From<PacingError> for RouteError {
    fn from(err: PacingError) -> Self {
        match err {
            PacingError::Transport(msg) => RouteError::Transport(msg),
            PacingError::Cancelled => RouteError::Cancelled,
        }
    }
}

/// Machine-status-plus-message error payload some providers attach.
#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    error: Option<ErrorDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorDetail {
    status: Option<String>,
    message: Option<String>,
}
