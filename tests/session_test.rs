//! End-to-end tests of the session read loop against the scripted mock
//! transport: parsing, resumption, retry handling, errors and cancellation.

mod common;

use std::time::Duration;

use common::*;
use futures_util::StreamExt;
use sse_session::{Event, ParseError, SessionConfig, SessionState, SseError, StreamSession};

async fn wait_for_state(events: &sse_session::EventStream, wanted: fn(&SessionState) -> bool) {
    let mut state_rx = events.state_receiver();
    tokio::time::timeout(WAIT, state_rx.wait_for(wanted))
        .await
        .expect("timed out waiting for session state")
        .expect("state sender dropped");
}

#[tokio::test]
async fn test_comment_skipped_and_id_resumed_after_close() {
    let (client, mut events) =
        start_session([MockResponse::body(":ok\n\nid: 1\ndata: hello\n\n"), idle()]).await;

    let event = next_event(&mut events).await;
    assert_eq!(
        event,
        Event {
            id: Some("1".to_string()),
            data: "hello".to_string(),
            ..Event::default()
        }
    );
    assert_eq!(event.event_type(), "message");

    let requests = client.wait_for_requests(2).await;
    assert_eq!(requests[0].header("Last-Event-ID"), None);
    assert_eq!(requests[1].header("Last-Event-ID"), Some("1"));
    assert_eq!(requests[1].url, TEST_URL);
}

#[tokio::test]
async fn test_all_terminators_split_messages() {
    let (_client, mut events) = start_session([MockResponse::body_then_hang(
        "data: a\r\n\r\ndata: b\n\ndata: c\r\r",
    )])
    .await;

    for expected in ["a", "b", "c"] {
        assert_eq!(next_event(&mut events).await.data, expected);
    }
}

#[tokio::test]
async fn test_message_split_across_chunks() {
    let (_client, mut events) = start_session([
        MockResponse::chunks(&["event: up", "date\ndata: x\r", "\n\r", "\n"]),
        idle(),
    ])
    .await;

    let event = next_event(&mut events).await;
    assert_eq!(event.event_type(), "update");
    assert_eq!(event.data, "x");
}

#[tokio::test]
async fn test_multiline_data_joined() {
    let (_client, mut events) =
        start_session([MockResponse::body_then_hang("data: first\ndata: second\n\n")]).await;

    assert_eq!(next_event(&mut events).await.data, "first\nsecond");
}

#[tokio::test]
async fn test_events_delivered_in_wire_order_across_reconnects() {
    let (_client, mut events) = start_session([
        MockResponse::body("data: 1\n\ndata: 2\n\n"),
        MockResponse::body("data: 3\n\n"),
        idle(),
    ])
    .await;

    for expected in ["1", "2", "3"] {
        assert_eq!(next_event(&mut events).await.data, expected);
    }
}

#[tokio::test]
async fn test_partial_block_discarded_on_reconnect() {
    let (_client, mut events) = start_session([
        MockResponse::body("data: complete\n\ndata: cut off\n"),
        MockResponse::body_then_hang("\ndata: fresh\n\n"),
    ])
    .await;

    assert_eq!(next_event(&mut events).await.data, "complete");
    // The dangling "\n" from the first connection must not end a block here
    let event = next_event(&mut events).await;
    assert_eq!(event.data, "fresh");
}

#[tokio::test]
async fn test_last_event_id_kept_when_later_events_have_none() {
    let (client, mut events) = start_session([
        MockResponse::body("id: 1\ndata: a\n\n"),
        MockResponse::body("data: b\n\n"),
        idle(),
    ])
    .await;

    assert_eq!(next_event(&mut events).await.data, "a");
    assert_eq!(next_event(&mut events).await.data, "b");

    let requests = client.wait_for_requests(3).await;
    assert_eq!(requests[1].header("Last-Event-ID"), Some("1"));
    assert_eq!(requests[2].header("Last-Event-ID"), Some("1"));
}

#[tokio::test]
async fn test_empty_id_does_not_reset_resumption() {
    let (client, mut events) = start_session([
        MockResponse::body("id: 4\ndata: a\n\nid:\ndata: b\n\n"),
        idle(),
    ])
    .await;

    next_event(&mut events).await;
    let event = next_event(&mut events).await;
    assert_eq!(event.id.as_deref(), Some(""));

    let requests = client.wait_for_requests(2).await;
    assert_eq!(requests[1].header("Last-Event-ID"), Some("4"));
}

#[tokio::test]
async fn test_id_only_block_is_delivered() {
    let (client, mut events) =
        start_session([MockResponse::body("id: 5\n\n"), idle()]).await;

    let event = next_event(&mut events).await;
    assert_eq!(event.id.as_deref(), Some("5"));
    assert!(event.data.is_empty());

    let requests = client.wait_for_requests(2).await;
    assert_eq!(requests[1].header("Last-Event-ID"), Some("5"));
}

#[tokio::test]
async fn test_blank_blocks_are_not_delivered() {
    let (_client, mut events) = start_session([MockResponse::body_then_hang(
        ": keep-alive\n\n\n\ndata: real\n\n",
    )])
    .await;

    assert_eq!(next_event(&mut events).await.data, "real");
}

#[tokio::test(start_paused = true)]
async fn test_default_retry_is_three_seconds() {
    let (client, mut events) = start_session_with(
        [MockResponse::body("data: a\n\n"), idle()],
        SessionConfig::default(),
    )
    .await;

    next_event(&mut events).await;
    let requests = client.wait_for_requests(2).await;

    let waited = requests[1].at - requests[0].at;
    assert!(waited >= Duration::from_millis(3000), "waited {:?}", waited);
    assert!(waited < Duration::from_millis(3001), "waited {:?}", waited);
}

#[tokio::test(start_paused = true)]
async fn test_retry_field_overrides_delay() {
    let (client, mut events) = start_session_with(
        [MockResponse::body("retry: 5000\ndata: slow down\n\n"), idle()],
        SessionConfig::default(),
    )
    .await;

    let event = next_event(&mut events).await;
    assert_eq!(event.retry, Some(5000));

    let requests = client.wait_for_requests(2).await;
    let waited = requests[1].at - requests[0].at;
    assert!(waited >= Duration::from_millis(5000), "waited {:?}", waited);
    assert!(waited < Duration::from_millis(5001), "waited {:?}", waited);
}

#[tokio::test(start_paused = true)]
async fn test_retry_zero_keeps_previous_delay() {
    let (client, mut events) = start_session_with(
        [
            MockResponse::body("retry: 0\ndata: x\n\n"),
            MockResponse::body(""),
            idle(),
        ],
        SessionConfig::default(),
    )
    .await;

    assert_eq!(next_event(&mut events).await.retry, Some(0));

    let requests = client.wait_for_requests(3).await;
    for pair in requests.windows(2) {
        let waited = pair[1].at - pair[0].at;
        assert!(waited >= Duration::from_millis(3000), "waited {:?}", waited);
        assert!(waited < Duration::from_millis(3001), "waited {:?}", waited);
    }
}

#[tokio::test(start_paused = true)]
async fn test_state_reports_retry_wait() {
    let (_client, mut events) = start_session_with(
        [MockResponse::body("retry: 750\n\n"), idle()],
        SessionConfig::default(),
    )
    .await;

    next_event(&mut events).await;
    wait_for_state(&events, |s| {
        *s == SessionState::WaitingRetry {
            delay: Duration::from_millis(750),
        }
    })
    .await;

    wait_for_state(&events, |s| *s == SessionState::Streaming).await;
}

#[tokio::test]
async fn test_malformed_retry_ends_sequence_with_parse_error() {
    let (client, mut events) = start_session([
        MockResponse::body("data: before\n\nretry: soon\n\ndata: after\n\n"),
        idle(),
    ])
    .await;

    assert_eq!(next_event(&mut events).await.data, "before");

    match next_error(&mut events).await {
        SseError::Parse(ParseError::InvalidRetry { value, .. }) => assert_eq!(value, "soon"),
        other => panic!("expected a parse error, got {:?}", other),
    }
    assert_ended(&mut events).await;

    wait_for_state(&events, |s| *s == SessionState::Failed).await;
    assert_eq!(client.get_requests().len(), 1);
}

#[tokio::test]
async fn test_failed_reconnect_ends_sequence_with_connection_error() {
    let (client, mut events) =
        start_session([MockResponse::body("id: 7\ndata: x\n\n"), refused()]).await;

    assert_eq!(next_event(&mut events).await.data, "x");

    match next_error(&mut events).await {
        SseError::Connection(e) => {
            assert_eq!(e.url, TEST_URL);
            assert!(matches!(e.source, HttpError::ConnectionFailed(_)));
            assert!(e.is_retryable());
        }
        other => panic!("expected a connection error, got {:?}", other),
    }
    assert_ended(&mut events).await;

    let requests = client.get_requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[1].header("Last-Event-ID"), Some("7"));
}

#[tokio::test]
async fn test_reconnect_rejected_with_status() {
    let (_client, mut events) = start_session([MockResponse::body(""), status(503)]).await;

    match next_error(&mut events).await {
        SseError::Connection(e) => assert_eq!(e.status(), Some(503)),
        other => panic!("expected a connection error, got {:?}", other),
    }
    assert_ended(&mut events).await;
}

#[tokio::test]
async fn test_read_error_ends_sequence() {
    let (client, mut events) = start_session([MockResponse::StreamThenError(
        vec![bytes::Bytes::from_static(b"data: a\n\n")],
        HttpError::Io("connection reset".to_string()),
    )])
    .await;

    assert_eq!(next_event(&mut events).await.data, "a");

    match next_error(&mut events).await {
        SseError::Connection(e) => {
            assert_eq!(e.source, HttpError::Io("connection reset".to_string()))
        }
        other => panic!("expected a connection error, got {:?}", other),
    }
    assert_ended(&mut events).await;
    assert_eq!(client.get_requests().len(), 1);
}

#[tokio::test]
async fn test_initial_connect_failure_returns_error() {
    let client = MockHttpClient::with_script([status(401)]);

    let err = match StreamSession::new(TEST_URL, client).await {
        Ok(_) => panic!("connect should fail"),
        Err(e) => e,
    };

    assert_eq!(err.status(), Some(401));
    assert!(!err.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_retry_wait() {
    let (client, mut events) =
        start_session_with([MockResponse::body("data: a\n\n")], SessionConfig::default()).await;

    next_event(&mut events).await;
    wait_for_state(&events, |s| matches!(s, SessionState::WaitingRetry { .. })).await;

    events.cancel();
    assert!(events.recv().await.is_none());

    wait_for_state(&events, |s| *s == SessionState::Closed).await;

    tokio::time::sleep(Duration::from_secs(10)).await;
    assert_eq!(client.get_requests().len(), 1);
}

#[tokio::test]
async fn test_cancel_while_reading() {
    let (_client, mut events) =
        start_session([MockResponse::body_then_hang("data: a\n\n")]).await;

    next_event(&mut events).await;
    events.cancel();

    assert!(events.recv().await.is_none());
    wait_for_state(&events, |s| *s == SessionState::Closed).await;
}

#[tokio::test]
async fn test_cancel_token_stops_session() {
    let (_client, mut events) = start_session([idle()]).await;
    let token = events.cancel_token();

    token.cancel();

    assert_ended(&mut events).await;
}

#[tokio::test]
async fn test_drop_stops_read_loop() {
    let (client, events) = start_session([MockResponse::body_then_hang("data: a\n\n")]).await;
    let mut state_rx = events.state_receiver();

    drop(events);

    tokio::time::timeout(WAIT, state_rx.wait_for(|s| *s == SessionState::Closed))
        .await
        .expect("timed out waiting for Closed")
        .expect("state sender dropped");
    assert_eq!(client.get_requests().len(), 1);
}

#[tokio::test]
async fn test_event_stream_as_futures_stream() {
    let (_client, events) = start_session([MockResponse::body_then_hang(
        "event: a\ndata: 1\n\nevent: b\ndata: 2\n\n",
    )])
    .await;

    let types: Vec<String> = events
        .take(2)
        .map(|item| item.unwrap().event_type().to_string())
        .collect()
        .await;

    assert_eq!(types, vec!["a", "b"]);
}

#[tokio::test]
async fn test_custom_headers_sent_on_every_connect() {
    let config = fast_config().with_header("Authorization", "Bearer secret");
    let (client, mut events) =
        start_session_with([MockResponse::body("data: a\n\n"), idle()], config).await;

    next_event(&mut events).await;
    let requests = client.wait_for_requests(2).await;

    for request in &requests {
        assert_eq!(request.header("Authorization"), Some("Bearer secret"));
        assert_eq!(request.header("Accept"), Some("text/event-stream"));
        assert_eq!(request.header("Cache-Control"), Some("no-cache"));
    }
}

#[tokio::test]
async fn test_caller_headers_do_not_duplicate_resume_header() {
    let config = fast_config()
        .with_header("accept", "application/json")
        .with_header("last-event-id", "stale");
    let (client, mut events) =
        start_session_with([MockResponse::body("id: 9\ndata: a\n\n"), idle()], config).await;

    next_event(&mut events).await;
    let requests = client.wait_for_requests(2).await;

    let reconnect = &requests[1];
    assert_eq!(reconnect.header("Last-Event-ID"), Some("9"));
    assert_eq!(reconnect.header("Accept"), Some("text/event-stream"));
    assert_eq!(reconnect.header("last-event-id"), None);
    assert_eq!(reconnect.header("accept"), None);
}

#[test]
fn test_blocking_iteration() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()
        .unwrap();

    let events = runtime.block_on(async {
        let client = MockHttpClient::with_script([MockResponse::body_then_hang(
            "data: 1\n\ndata: 2\n\n",
        )]);
        StreamSession::new(TEST_URL, client).await.unwrap().events()
    });

    let data: Vec<String> = events
        .into_blocking_iter()
        .take(2)
        .map(|item| item.unwrap().data)
        .collect();

    assert_eq!(data, vec!["1", "2"]);
}
