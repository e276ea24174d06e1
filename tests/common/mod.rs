//! Common test utilities for integration tests.
//!
//! Provides fixtures for starting sessions against the scripted mock
//! transport and for awaiting events with a timeout.
//!
//! # Example
//!
//! ```ignore
//! use common::{start_session, next_event, MockResponse};
//!
//! let (client, mut events) = start_session([MockResponse::body("data: hi\n\n")]).await;
//! assert_eq!(next_event(&mut events).await.data, "hi");
//! ```

#![allow(dead_code)]

pub mod mocks;

pub use mocks::*;

use std::time::Duration;

use sse_session::{Event, EventStream, SessionConfig, SseError, StreamSession};

/// Endpoint used by mock-backed sessions.
pub const TEST_URL: &str = "http://localhost/events";

/// Upper bound for anything a test waits on.
pub const WAIT: Duration = Duration::from_secs(5);

/// Config with a short retry so reconnects happen quickly in real time.
pub fn fast_config() -> SessionConfig {
    SessionConfig::default().with_retry(Duration::from_millis(10))
}

/// Connect with `config` against a client scripted with `script`.
pub async fn start_session_with(
    script: impl IntoIterator<Item = MockResponse>,
    config: SessionConfig,
) -> (MockHttpClient, EventStream) {
    let client = MockHttpClient::with_script(script);
    let session = StreamSession::connect(TEST_URL, client.clone(), config)
        .await
        .expect("initial connect should succeed");
    (client, session.events())
}

/// Connect with [`fast_config`].
pub async fn start_session(
    script: impl IntoIterator<Item = MockResponse>,
) -> (MockHttpClient, EventStream) {
    start_session_with(script, fast_config()).await
}

/// Next item, failing the test if the sequence ends or stalls.
pub async fn next_item(events: &mut EventStream) -> Result<Event, SseError> {
    tokio::time::timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for an event")
        .expect("event sequence ended early")
}

/// Next item, which must be an event.
pub async fn next_event(events: &mut EventStream) -> Event {
    next_item(events).await.expect("expected an event, got an error")
}

/// Next item, which must be an error.
pub async fn next_error(events: &mut EventStream) -> SseError {
    match next_item(events).await {
        Ok(event) => panic!("expected an error, got {:?}", event),
        Err(e) => e,
    }
}

/// Assert the sequence has ended.
pub async fn assert_ended(events: &mut EventStream) {
    let item = tokio::time::timeout(WAIT, events.recv())
        .await
        .expect("timed out waiting for the end of the sequence");
    assert!(item.is_none(), "expected end of sequence, got {:?}", item);
}
