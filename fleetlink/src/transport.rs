//! HTTP transport abstraction for testability.
//!
//! The hub speaks plain JSON-over-POST, so the transport surface is a
//! single verb. The trait allows dependency injection: production code
//! uses [`AsyncReqwestClient`], tests script a mock client and inspect
//! the requests it recorded.

use std::future::Future;

use thiserror::Error;
use tracing::{debug, trace, warn};

/// Errors that can occur at the HTTP layer.
///
/// These are network-level failures, distinct from the result codes the
/// hub embeds in response bodies.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The request could not be sent or timed out.
    #[error("request to {url} failed: {message}")]
    RequestFailed { url: String, message: String },

    /// The server answered with a non-success HTTP status.
    #[error("HTTP {status} from {url}")]
    HttpStatus { url: String, status: u16 },

    /// The response body could not be read.
    #[error("failed to read response body: {0}")]
    Body(String),

    /// The client itself could not be constructed.
    #[error("failed to create HTTP client: {0}")]
    ClientBuild(String),
}

/// Trait for asynchronous HTTP POST operations.
///
/// Implementors send a JSON body and return the raw response bytes.
/// Headers are passed as name/value pairs; the content type is always
/// `application/json`.
pub trait AsyncHttpClient: Send + Sync {
    /// Performs an async HTTP POST request with a JSON body.
    ///
    /// # Arguments
    ///
    /// * `url` - The URL to request
    /// * `json_body` - JSON body as a string
    /// * `headers` - Slice of (header_name, header_value) tuples
    ///
    /// # Returns
    ///
    /// The response body as bytes or an error.
    fn post_json(
        &self,
        url: &str,
        json_body: &str,
        headers: &[(&str, &str)],
    ) -> impl Future<Output = Result<Vec<u8>, TransportError>> + Send;
}

/// Real async HTTP client backed by reqwest.
#[derive(Clone)]
pub struct AsyncReqwestClient {
    client: reqwest::Client,
}

impl AsyncReqwestClient {
    /// Creates a new client with a 30 second request timeout.
    pub fn new() -> Result<Self, TransportError> {
        Self::with_timeout(30)
    }

    /// Creates a new client with a custom request timeout.
    pub fn with_timeout(timeout_secs: u64) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(timeout_secs))
            .tcp_nodelay(true)
            .build()
            .map_err(|e| TransportError::ClientBuild(e.to_string()))?;

        Ok(Self { client })
    }
}

impl AsyncHttpClient for AsyncReqwestClient {
    async fn post_json(
        &self,
        url: &str,
        json_body: &str,
        headers: &[(&str, &str)],
    ) -> Result<Vec<u8>, TransportError> {
        trace!(url = url, "HTTP POST request starting");

        let mut request = self
            .client
            .post(url)
            .header("Content-Type", "application/json")
            .body(json_body.to_string());

        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = match request.send().await {
            Ok(resp) => {
                debug!(
                    url = url,
                    status = resp.status().as_u16(),
                    "HTTP response received"
                );
                resp
            }
            Err(e) => {
                warn!(
                    url = url,
                    error = %e,
                    is_connect = e.is_connect(),
                    is_timeout = e.is_timeout(),
                    "HTTP request failed"
                );
                return Err(TransportError::RequestFailed {
                    url: url.to_string(),
                    message: e.to_string(),
                });
            }
        };

        if !response.status().is_success() {
            warn!(
                url = url,
                status = response.status().as_u16(),
                "HTTP error status"
            );
            return Err(TransportError::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        match response.bytes().await {
            Ok(bytes) => {
                trace!(url = url, bytes = bytes.len(), "HTTP response body read");
                Ok(bytes.to_vec())
            }
            Err(e) => {
                warn!(url = url, error = %e, "Failed to read response body");
                Err(TransportError::Body(e.to_string()))
            }
        }
    }
}
