//! HTTP transport for proxy calls.
//!
//! Every failure a caller is meant to see funnels into [`ErrorEnvelope`]:
//! local precondition checks, RPC-level `error` members, and failure-status
//! responses whose body carries the same shape. One envelope means one
//! error-rendering path for every caller regardless of where the failure
//! originated.
//!
//! Two failure classes deliberately stay un-normalized (see DESIGN.md): a
//! failure-status body that does not decode as the expected error shape
//! ([`RpcError::ErrorBodyDecode`]) and a network failure that produced no
//! body at all ([`RpcError::Http`]).

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::rpc::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, Method};

/// The one error shape surfaced to callers.
///
/// Mirrors the proxy's wire-level error payload: a human-readable
/// description plus an optional server-side stacktrace. Serializable so a
/// rendering collaborator can pass it along as stringified JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub description: String,
    pub stacktrace: Option<String>,
}

impl ErrorEnvelope {
    /// Precondition failure: an RPC was attempted with no endpoint
    /// configured.
    pub fn not_connected() -> Self {
        Self {
            description: "Must connect to server before executing queries".to_string(),
            stacktrace: Some(String::new()),
        }
    }

    /// Precondition failure: `connect` was called on a connected session.
    pub fn already_connected() -> Self {
        Self {
            description: "You must disconnect before connecting to a different server"
                .to_string(),
            stacktrace: None,
        }
    }
}

impl std::fmt::Display for ErrorEnvelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.description)?;
        if let Some(trace) = self.stacktrace.as_deref() {
            if !trace.is_empty() {
                write!(f, "\n{}", trace)?;
            }
        }
        Ok(())
    }
}

impl From<JsonRpcError> for ErrorEnvelope {
    fn from(error: JsonRpcError) -> Self {
        Self {
            description: error.message,
            stacktrace: error.data.stacktrace,
        }
    }
}

/// Errors produced by the RPC layer.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Normalized failure: precondition, RPC-level error, or a
    /// failure-status response carrying the standard error body.
    #[error("{0}")]
    Envelope(ErrorEnvelope),

    /// The endpoint string did not parse as a URL.
    #[error("Invalid endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),

    /// The HTTP request failed before a usable body arrived.
    #[error("Transport failure: {0}")]
    Http(#[from] reqwest::Error),

    /// A failure-status body that did not decode as the expected error
    /// shape. Propagated as-is rather than normalized.
    #[error("Undecodable error response: {0}")]
    ErrorBodyDecode(#[source] serde_json::Error),

    /// A successful result that did not match the caller's expected shape.
    #[error("Unexpected result shape: {0}")]
    Decode(#[source] serde_json::Error),
}

impl RpcError {
    /// The normalized envelope, when this failure carries one.
    pub fn envelope(&self) -> Option<&ErrorEnvelope> {
        match self {
            RpcError::Envelope(envelope) => Some(envelope),
            _ => None,
        }
    }
}

impl From<ErrorEnvelope> for RpcError {
    fn from(envelope: ErrorEnvelope) -> Self {
        RpcError::Envelope(envelope)
    }
}

/// A single-method RPC transport to the database proxy.
///
/// Abstracted as a trait so the session controller can be exercised against
/// scripted transports in tests.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue `method(params)` against `endpoint`.
    ///
    /// `endpoint == None` fails the not-connected precondition without
    /// touching the network. On success the raw `result` value is returned
    /// untransformed.
    async fn call(
        &self,
        endpoint: Option<&Url>,
        method: Method,
        params: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, RpcError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn call(
        &self,
        endpoint: Option<&Url>,
        method: Method,
        params: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, RpcError> {
        (**self).call(endpoint, method, params).await
    }
}

/// Production transport: JSON-RPC 2.0 over HTTP POST.
///
/// Holds a reused [`reqwest::Client`] so connections are pooled across
/// calls. No retries and no timeout beyond the client defaults; a pending
/// call settles whenever the request does.
#[derive(Debug, Clone, Default)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn call(
        &self,
        endpoint: Option<&Url>,
        method: Method,
        params: Vec<serde_json::Value>,
    ) -> Result<serde_json::Value, RpcError> {
        let endpoint = match endpoint {
            Some(url) => url,
            None => return Err(ErrorEnvelope::not_connected().into()),
        };

        let request = JsonRpcRequest::new(method, params);
        debug!(%method, %endpoint, "issuing rpc");

        let response = self
            .client
            .post(endpoint.as_str())
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            // Failure statuses are expected to carry the standard error body.
            let body = response.text().await?;
            debug!(%method, %status, "rpc returned failure status");
            return Err(decode_failure_body(&body)?.into());
        }

        let response: JsonRpcResponse = response.json().await?;
        if let Some(error) = response.error {
            return Err(ErrorEnvelope::from(error).into());
        }
        Ok(response.result.unwrap_or(serde_json::Value::Null))
    }
}

/// Failure-status bodies must carry the `error` member.
#[derive(Debug, Deserialize)]
struct FailureBody {
    error: JsonRpcError,
}

fn decode_failure_body(body: &str) -> Result<ErrorEnvelope, RpcError> {
    let failure: FailureBody = serde_json::from_str(body).map_err(RpcError::ErrorBodyDecode)?;
    Ok(failure.error.into())
}
