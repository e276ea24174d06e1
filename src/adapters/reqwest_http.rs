//! Reqwest-based HTTP transport adapter.
//!
//! This module provides the production transport, implementing the
//! [`HttpClient`] trait from `crate::traits` on top of reqwest's streaming
//! response body.

use async_trait::async_trait;
use futures_util::StreamExt;
use tracing::debug;

use crate::traits::{ByteStream, Headers, HttpClient, HttpError};

/// HTTP client implementation using reqwest.
///
/// Timeouts, TLS and proxy settings belong on the wrapped
/// `reqwest::Client`; see [`ReqwestHttpClient::with_client`]. Avoid a total
/// request timeout there, since it would also cut the long-lived body.
///
/// # Example
///
/// ```ignore
/// use sse_session::adapters::ReqwestHttpClient;
/// use sse_session::session::StreamSession;
///
/// let session = StreamSession::new("https://example.com/events", ReqwestHttpClient::new()).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
}

impl ReqwestHttpClient {
    /// Create a new ReqwestHttpClient with default settings.
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Create a new ReqwestHttpClient with a custom reqwest::Client.
    ///
    /// This allows for advanced configuration like connect timeouts,
    /// connection pools, or TLS settings.
    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }

    /// Get a reference to the underlying reqwest::Client.
    pub fn inner(&self) -> &reqwest::Client {
        &self.client
    }

    /// Convert reqwest error to HttpError.
    fn convert_error(err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout(err.to_string())
        } else if err.is_connect() {
            HttpError::ConnectionFailed(err.to_string())
        } else if err.is_builder() {
            HttpError::InvalidUrl(err.to_string())
        } else {
            HttpError::Other(err.to_string())
        }
    }

    /// Convert an error raised while reading the body.
    fn convert_body_error(err: reqwest::Error) -> HttpError {
        if err.is_timeout() {
            HttpError::Timeout(err.to_string())
        } else {
            HttpError::Io(err.to_string())
        }
    }

    /// Apply headers to a request builder.
    fn apply_headers(
        builder: reqwest::RequestBuilder,
        headers: &Headers,
    ) -> reqwest::RequestBuilder {
        let mut builder = builder;
        for (key, value) in headers {
            builder = builder.header(key, value);
        }
        builder
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn get_stream(&self, url: &str, headers: &Headers) -> Result<ByteStream, HttpError> {
        let builder = Self::apply_headers(self.client.get(url), headers);

        let response = builder.send().await.map_err(Self::convert_error)?;

        if !response.status().is_success() {
            // The error body is never read: it may be a stream that never ends
            let status = response.status();
            let message = status
                .canonical_reason()
                .unwrap_or("Unknown status")
                .to_string();
            return Err(HttpError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        debug!(url, status = response.status().as_u16(), "Event stream opened");

        let stream = response
            .bytes_stream()
            .map(|result| result.map_err(Self::convert_body_error));

        Ok(Box::pin(stream))
    }
}
