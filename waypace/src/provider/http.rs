//! HTTP client abstraction for testability.
//!
//! This abstraction allows for dependency injection and easier testing by
//! enabling mock HTTP clients in tests. The real implementation is
//! [`ReqwestClient`], using non-blocking I/O.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;

/// A request as the pacing layer dispatches it.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    /// Full request URL.
    pub url: String,
    /// Header name/value pairs.
    pub headers: Vec<(String, String)>,
    /// JSON body.
    pub body: String,
}

/// A provider response with enough envelope for retry decisions.
///
/// Non-2xx statuses are carried as data, not errors; the provider adapter
/// maps them to its error taxonomy after the pacing layer is done with them.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    /// HTTP status code.
    pub status: u16,
    /// Raw `Retry-After` header value, if the server sent one.
    pub retry_after: Option<String>,
    /// Response body bytes.
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// Whether the status is in the 2xx range.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Transport-level failure: the request never produced an HTTP response.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{0}")]
pub struct TransportError(pub String);

/// Trait for asynchronous HTTP client operations.
///
/// Implementors perform one POST with a JSON body and surface the response
/// envelope, or a [`TransportError`] when no response was obtained.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an async HTTP POST request with a JSON body.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    /// * `headers` - Header name/value pairs to attach
    /// * `body` - JSON body as a string
    fn post_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &str,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send;
}

impl<C: AsyncHttpClient> AsyncHttpClient for Arc<C> {
    fn post_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &str,
    ) -> impl Future<Output = Result<HttpResponse, TransportError>> + Send {
        self.as_ref().post_json(url, headers, body)
    }
}

/// Default User-Agent string for HTTP requests.
const DEFAULT_USER_AGENT: &str = concat!("waypace/", env!("CARGO_PKG_VERSION"));

/// Real HTTP client implementation using reqwest.
#[derive(Clone)]
pub struct ReqwestClient {
    client: reqwest::Client,
}

impl ReqwestClient {
    /// Creates a new ReqwestClient with default configuration.
    ///
    /// Keeps a small warm connection pool; routing calls are paced to at
    /// most one per second per target, so throughput tuning is pointless.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(30)
    }

    /// Creates a new ReqwestClient with a custom request timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .user_agent(DEFAULT_USER_AGENT)
            .pool_max_idle_per_host(4)
            .tcp_keepalive(std::time::Duration::from_secs(30))
            .build()
            .map_err(|e| TransportError(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for ReqwestClient {
    async fn post_json(
        &self,
        url: &str,
        headers: &[(String, String)],
        body: &str,
    ) -> Result<HttpResponse, TransportError> {
        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .body(body.to_string());

        for (name, value) in headers {
            request = request.header(name, value);
        }

        let response = request
            .send()
            .await
            .map_err(|e| TransportError(format!("Request failed: {}", e)))?;

        let status = response.status().as_u16();
        let retry_after = response
            .headers()
            .get("Retry-After")
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_string());

        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError(format!("Failed to read response: {}", e)))?
            .to_vec();

        Ok(HttpResponse {
            status,
            retry_after,
            body,
        })
    }
}
