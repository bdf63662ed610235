//! HTTP transport seam for tool and generation calls.
//!
//! [`Transport`] is the only place the engine touches the network. The
//! production implementation, [`HttpTransport`], wraps a [`reqwest::Client`];
//! tests substitute an in-memory implementation.

use std::future::Future;
use std::time::Duration;

use reqwest::Url;
use serde_json::Value as JsonValue;

/// Errors from the HTTP transport layer.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The HTTP request itself failed (network, DNS, TLS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The collaborator returned a non-2xx status code.
    #[error("upstream returned {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// The response body was not valid JSON.
    #[error("response is not JSON: {0}")]
    InvalidJson(String),
}

impl From<TransportError> for genail_core::error::ScriptError {
    fn from(err: TransportError) -> Self {
        Self::Upstream(err.to_string())
    }
}

/// JSON-in, JSON-out HTTP operations used by the tool registry.
pub trait Transport: Send + Sync {
    /// `GET url?query` and decode the JSON body.
    fn get_json(
        &self,
        url: Url,
        query: Vec<(&'static str, String)>,
    ) -> impl Future<Output = Result<JsonValue, TransportError>> + Send;

    /// `POST url` with a JSON body and optional bearer credential.
    fn post_json(
        &self,
        url: Url,
        body: JsonValue,
        bearer: Option<String>,
    ) -> impl Future<Output = Result<JsonValue, TransportError>> + Send;
}

/// [`Transport`] backed by a shared [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
}

/// Upstream bodies longer than this are truncated in error messages.
const MAX_ERROR_BODY_CHARS: usize = 512;

impl HttpTransport {
    /// Build a client with a per-request timeout.
    ///
    /// Redirects are not followed: every hop must pass egress validation, and
    /// only the first hop is validated.
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self { client })
    }

    /// Ensure the response has a success status code, otherwise return a
    /// [`TransportError::Status`] with the (truncated) body text.
    async fn ensure_success(
        response: reqwest::Response,
    ) -> Result<reqwest::Response, TransportError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }
        Ok(response)
    }

    /// Decode a successful response body as JSON.
    async fn parse_response(response: reqwest::Response) -> Result<JsonValue, TransportError> {
        let response = Self::ensure_success(response).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| TransportError::InvalidJson(e.to_string()))
    }
}

impl Transport for HttpTransport {
    async fn get_json(
        &self,
        url: Url,
        query: Vec<(&'static str, String)>,
    ) -> Result<JsonValue, TransportError> {
        tracing::debug!(%url, "GET");
        let response = self.client.get(url).query(&query).send().await?;
        Self::parse_response(response).await
    }

    async fn post_json(
        &self,
        url: Url,
        body: JsonValue,
        bearer: Option<String>,
    ) -> Result<JsonValue, TransportError> {
        tracing::debug!(%url, "POST");
        let mut request = self.client.post(url).json(&body);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        let response = request.send().await?;
        Self::parse_response(response).await
    }
}
