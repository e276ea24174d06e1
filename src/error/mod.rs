//! Error types for the SSE session.
//!
//! - [`ParseError`]: a message block violated the wire format (malformed `retry`).
//! - [`ConnectionError`]: the transport failed to open or read the stream.
//! - [`SseError`]: what an [`EventStream`] yields when the sequence fails.
//!
//! Cancellation is not an error; a cancelled stream simply ends.
//!
//! [`EventStream`]: crate::session::EventStream

mod connection;
mod parse;

pub use connection::ConnectionError;
pub use parse::ParseError;

use thiserror::Error;

/// Failure that terminates an event sequence.
#[derive(Debug, Clone, Error)]
pub enum SseError {
    /// The server sent a block that could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Connecting, reconnecting or reading the body failed.
    #[error(transparent)]
    Connection(#[from] ConnectionError),
}

impl SseError {
    /// Check if rebuilding the session could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            SseError::Parse(_) => false,
            SseError::Connection(err) => err.is_retryable(),
        }
    }
}

/// Result alias used across the crate.
pub type SseResult<T> = Result<T, SseError>;
