//! Retry and backoff wrapper around paced HTTP dispatch.

use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use super::queue::PacedQueue;
use crate::provider::http::{AsyncHttpClient, HttpRequest, HttpResponse};

/// Ceiling on any single exponential backoff sleep.
const MAX_BACKOFF: Duration = Duration::from_millis(8000);

/// Retry budget and backoff base for one upstream target.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Base delay doubled per attempt, capped at 8 s.
    pub base_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Backoff delay for the given zero-based attempt number.
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_backoff.saturating_mul(factor).min(MAX_BACKOFF)
    }
}

/// Failures surfaced by the pacing layer itself.
///
/// Non-transient HTTP responses are not errors at this layer; they are
/// returned to the caller for provider-specific mapping.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PacingError {
    /// Transport-level failure after the retry budget was exhausted.
    #[error("transport error: {0}")]
    Transport(String),
    /// The caller cancelled mid-dispatch or mid-retry.
    #[error("request cancelled")]
    Cancelled,
}

/// Parse a `Retry-After` header value: delta-seconds or an HTTP-date.
///
/// Returns `None` for values in neither form, or dates in the past.
pub fn parse_retry_after(value: &str) -> Option<Duration> {
    let value = value.trim();

    if let Ok(secs) = value.parse::<u64>() {
        return Some(Duration::from_secs(secs));
    }

    let date: DateTime<Utc> = DateTime::parse_from_rfc2822(value).ok()?.to_utc();
    (date - Utc::now()).to_std().ok()
}

/// Whether an HTTP status should be retried.
fn is_transient(status: u16) -> bool {
    status == 429 || status >= 500
}

/// Execute one HTTP call through `queue`, retrying transient failures.
///
/// Transient outcomes are HTTP 429, HTTP >= 500, and transport errors. Each
/// retry sleeps per the response's `Retry-After` header when present, else
/// exponential backoff. Any other response returns immediately; the caller
/// maps its status to a domain error. Cancellation is checked before each
/// dispatch and before each retry sleep.
pub async fn send_with_retry<C: AsyncHttpClient>(
    queue: &PacedQueue,
    client: &C,
    request: &HttpRequest,
    policy: &RetryPolicy,
    cancel: &CancellationToken,
) -> Result<HttpResponse, PacingError> {
    let mut attempt = 0u32;

    loop {
        if cancel.is_cancelled() {
            return Err(PacingError::Cancelled);
        }

        let outcome = queue
            .enqueue(client.post_json(&request.url, &request.headers, &request.body))
            .await;

        let delay = match outcome {
            Ok(response) if is_transient(response.status) && attempt < policy.max_retries => {
                let delay = response
                    .retry_after
                    .as_deref()
                    .and_then(parse_retry_after)
                    .unwrap_or_else(|| policy.backoff_delay(attempt));
                debug!(
                    queue = queue.name(),
                    status = response.status,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Transient response, retrying"
                );
                delay
            }
            Ok(response) => return Ok(response),
            Err(err) if attempt < policy.max_retries => {
                let delay = policy.backoff_delay(attempt);
                debug!(
                    queue = queue.name(),
                    error = %err,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Transport error, retrying"
                );
                delay
            }
            Err(err) => {
                warn!(queue = queue.name(), error = %err, "Transport error, retry budget exhausted");
                return Err(PacingError::Transport(err.to_string()));
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => return Err(PacingError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }

        attempt += 1;
    }
}
