//! Connection errors raised while opening or reading an event stream.

use thiserror::Error;

use crate::traits::HttpError;

/// Transport-level failure while connecting to (or reading from) an SSE endpoint.
///
/// Raised by the initial connect, so no session exists when it fails, and by
/// reconnect attempts, where it ends the event sequence.
#[derive(Debug, Clone, Error)]
#[error("connection to {url} failed: {source}")]
pub struct ConnectionError {
    /// Endpoint that was being streamed
    pub url: String,
    /// Underlying transport error
    #[source]
    pub source: HttpError,
}

impl ConnectionError {
    /// Wrap a transport error for `url`.
    pub fn new(url: impl Into<String>, source: HttpError) -> Self {
        Self {
            url: url.into(),
            source,
        }
    }

    /// HTTP status, when the server answered with a non-success response.
    pub fn status(&self) -> Option<u16> {
        match &self.source {
            HttpError::ServerError { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Check if this error is likely transient.
    ///
    /// The session never retries on its own; a supervisor that rebuilds
    /// sessions can use this to decide whether doing so is worthwhile.
    pub fn is_retryable(&self) -> bool {
        match &self.source {
            HttpError::ConnectionFailed(_) | HttpError::Timeout(_) | HttpError::Io(_) => true,
            HttpError::ServerError { status, .. } => {
                *status >= 500 || *status == 429 || *status == 408
            }
            HttpError::InvalidUrl(_) | HttpError::Other(_) => false,
        }
    }
}
