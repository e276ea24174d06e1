//! Mock implementations for test fixtures.
//!
//! Re-exports the scripted transport from `sse_session::adapters::mock` and
//! adds shorthand for the connection outcomes tests use most.

pub use sse_session::adapters::mock::{MockHttpClient, MockResponse, RecordedRequest};
pub use sse_session::traits::HttpError;

/// A connection that sends nothing and never closes.
pub fn idle() -> MockResponse {
    MockResponse::body_then_hang("")
}

/// A connect refused by the network.
pub fn refused() -> MockResponse {
    MockResponse::Error(HttpError::ConnectionFailed("connection refused".to_string()))
}

/// A connect answered with a non-success status.
pub fn status(code: u16) -> MockResponse {
    MockResponse::Error(HttpError::ServerError {
        status: code,
        message: format!("HTTP {}", code),
    })
}
