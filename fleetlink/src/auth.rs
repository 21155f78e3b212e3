//! Session credential manager.
//!
//! Owns the cached hub session token and fronts every authenticated
//! call. The hub adjudicates token validity itself: when a response
//! body carries a stale-token result code the cache is cleared wholesale
//! and the call is retried with a fresh token exactly once. A second
//! stale-token answer surfaces as [`AuthError::PersistentAuth`] rather
//! than looping.

use std::sync::RwLock;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::protocol::{DeviceDescriptor, HubResponse, TokenRequest, TOKEN_HEADER};
use crate::transport::{AsyncHttpClient, TransportError};

/// Errors surfaced by credential acquisition and authenticated calls.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// The token-issuing endpoint rejected the request.
    #[error("token request rejected: {code} {message}")]
    Rejected { code: String, message: String },

    /// The hub kept rejecting the token after a refresh.
    #[error("authentication still rejected after token refresh")]
    PersistentAuth,

    /// The hub rejected the request for a non-authentication reason.
    /// Never retried.
    #[error("hub rejected request: {code} {message}")]
    Api { code: String, message: String },

    /// Network-level failure.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The response body could not be parsed.
    #[error("invalid hub response: {0}")]
    InvalidResponse(String),

    /// The request body could not be encoded.
    #[error("failed to encode request body: {0}")]
    Encode(String),
}

/// Caches the session token and attaches it to every hub call.
///
/// Holds at most one credential at a time; invalidation always clears
/// the whole cache.
pub struct CredentialManager<C: AsyncHttpClient> {
    http: C,
    token_url: String,
    device: DeviceDescriptor,
    firmware_version: String,
    token: RwLock<Option<String>>,
}

impl<C: AsyncHttpClient> CredentialManager<C> {
    /// Creates a manager with an empty token cache.
    pub fn new(
        http: C,
        token_url: String,
        device: DeviceDescriptor,
        firmware_version: String,
    ) -> Self {
        Self {
            http,
            token_url,
            device,
            firmware_version,
            token: RwLock::new(None),
        }
    }

    /// Returns the cached token, acquiring one from the hub if the
    /// cache is empty.
    pub async fn get_token(&self) -> Result<String, AuthError> {
        if let Some(token) = self.token.read().unwrap().clone() {
            return Ok(token);
        }

        debug!(url = %self.token_url, mdn = %self.device.mdn, "requesting session token");

        let request = TokenRequest {
            device: self.device.clone(),
            firmware_version: self.firmware_version.clone(),
        };
        let body =
            serde_json::to_string(&request).map_err(|e| AuthError::Encode(e.to_string()))?;

        let bytes = self.http.post_json(&self.token_url, &body, &[]).await?;
        let response: HubResponse = serde_json::from_slice(&bytes)
            .map_err(|e| AuthError::InvalidResponse(e.to_string()))?;

        if !response.is_success() {
            return Err(AuthError::Rejected {
                code: response.result_code,
                message: response.result_message,
            });
        }

        let token = response
            .token
            .ok_or_else(|| AuthError::InvalidResponse("missing token field".to_string()))?;

        *self.token.write().unwrap() = Some(token.clone());
        info!("session token acquired");
        Ok(token)
    }

    /// Clears the cached token. Idempotent.
    pub fn invalidate(&self) {
        self.token.write().unwrap().take();
    }

    /// Posts `body` to `url` with the session token attached, parsing
    /// the embedded result code.
    ///
    /// A stale-token result triggers one cache-clear-and-retry; any
    /// other non-success result surfaces as [`AuthError::Api`] without
    /// a retry.
    pub async fn authenticated_call<T: Serialize>(
        &self,
        url: &str,
        body: &T,
    ) -> Result<HubResponse, AuthError> {
        let payload =
            serde_json::to_string(body).map_err(|e| AuthError::Encode(e.to_string()))?;

        let first = self.call_once(url, &payload).await?;
        if first.is_success() {
            return Ok(first);
        }
        if !first.is_stale_token() {
            return Err(AuthError::Api {
                code: first.result_code,
                message: first.result_message,
            });
        }

        warn!(
            url = url,
            code = %first.result_code,
            "stale session token; refreshing and retrying once"
        );
        self.invalidate();

        let second = self.call_once(url, &payload).await?;
        if second.is_success() {
            return Ok(second);
        }
        if second.is_stale_token() {
            return Err(AuthError::PersistentAuth);
        }
        Err(AuthError::Api {
            code: second.result_code,
            message: second.result_message,
        })
    }

    async fn call_once(&self, url: &str, payload: &str) -> Result<HubResponse, AuthError> {
        let token = self.get_token().await?;
        let bytes = self
            .http
            .post_json(url, payload, &[(TOKEN_HEADER, token.as_str())])
            .await?;
        serde_json::from_slice(&bytes).map_err(|e| AuthError::InvalidResponse(e.to_string()))
    }
}
