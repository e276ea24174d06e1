//! HTTP transport trait abstraction.
//!
//! The session only needs one capability from its HTTP collaborator: open a
//! GET request with the given headers and hand back the response body as an
//! incrementally readable byte stream. TLS, redirects, pooling and auth are
//! configured on the implementation before it reaches the session.

use async_trait::async_trait;
use bytes::Bytes;
use futures::Stream;
use std::collections::HashMap;
use std::pin::Pin;

/// HTTP headers represented as a key-value map.
pub type Headers = HashMap<String, String>;

/// Response body delivered chunk by chunk.
///
/// The stream ending (`None`) is a graceful close by the server.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, HttpError>> + Send>>;

/// HTTP transport errors.
#[derive(Debug, Clone, PartialEq)]
pub enum HttpError {
    /// Connection failed
    ConnectionFailed(String),
    /// Request timeout
    Timeout(String),
    /// Server returned a non-success status
    ServerError { status: u16, message: String },
    /// IO error while reading the body
    Io(String),
    /// Invalid URL
    InvalidUrl(String),
    /// Other error
    Other(String),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            HttpError::Timeout(msg) => write!(f, "Request timeout: {}", msg),
            HttpError::ServerError { status, message } => {
                write!(f, "Server error ({}): {}", status, message)
            }
            HttpError::Io(msg) => write!(f, "IO error: {}", msg),
            HttpError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            HttpError::Other(msg) => write!(f, "HTTP error: {}", msg),
        }
    }
}

impl std::error::Error for HttpError {}

/// Trait for the HTTP transport used by a stream session.
///
/// Implementations include the production reqwest-based client and a
/// scripted mock for tests.
///
/// # Example
///
/// ```ignore
/// use sse_session::traits::{Headers, HttpClient};
///
/// async fn open<C: HttpClient>(client: &C) {
///     let mut headers = Headers::new();
///     headers.insert("Accept".to_string(), "text/event-stream".to_string());
///     let body = client.get_stream("https://example.com/events", &headers).await;
/// }
/// ```
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Perform a GET request and return the response body as a stream.
    ///
    /// Must not buffer the whole body. A non-success status is reported as
    /// [`HttpError::ServerError`].
    ///
    /// # Arguments
    /// * `url` - The URL to request
    /// * `headers` - Request headers
    async fn get_stream(&self, url: &str, headers: &Headers) -> Result<ByteStream, HttpError>;
}
