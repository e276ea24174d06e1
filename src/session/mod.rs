//! Resumable SSE stream session.
//!
//! A [`StreamSession`] is created by connecting to an endpoint; creation
//! fails with a [`ConnectionError`] when that first connect fails, so there
//! is never a session without a live connection behind it.
//!
//! [`StreamSession::events`] consumes the session, spawns its read loop on a
//! tokio task and returns an [`EventStream`]. The loop:
//! - splits the body into message blocks and parses each into an [`Event`]
//! - remembers the last non-empty `id` and sends it back as `Last-Event-ID`
//! - adopts every `retry:` value as the new reconnection delay
//! - on end-of-stream, waits for the delay and reconnects
//!
//! A failed reconnect, a body read error or a malformed block ends the
//! sequence with that error. Cancelling (or dropping) the [`EventStream`]
//! ends it without one.
//!
//! [`Event`]: crate::event::Event

mod stream;
mod worker;

pub use stream::{BlockingEvents, EventStream, SessionState};

use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::SessionConfig;
use crate::error::ConnectionError;
use crate::traits::{ByteStream, Headers, HttpClient};
use worker::Worker;

/// Header carrying the resumption ID on reconnect.
pub const LAST_EVENT_ID_HEADER: &str = "Last-Event-ID";

/// Headers the session always sets itself.
const MANAGED_HEADERS: [&str; 3] = ["Accept", "Cache-Control", LAST_EVENT_ID_HEADER];

/// A connected event-stream session, ready to produce events.
pub struct StreamSession<C> {
    url: String,
    client: C,
    config: SessionConfig,
    last_event_id: Option<String>,
    connection: ByteStream,
}

impl<C: HttpClient + 'static> StreamSession<C> {
    /// Connect to `url` with the default configuration.
    pub async fn new(url: impl Into<String>, client: C) -> Result<Self, ConnectionError> {
        Self::connect(url, client, SessionConfig::default()).await
    }

    /// Connect to `url`.
    ///
    /// Returns a ConnectionError if the initial connect fails, including a
    /// non-success HTTP status.
    pub async fn connect(
        url: impl Into<String>,
        client: C,
        config: SessionConfig,
    ) -> Result<Self, ConnectionError> {
        let url = url.into();
        let last_event_id = config.last_event_id.clone();

        let connection = open_stream(
            &client,
            &url,
            &config.headers,
            last_event_id.as_deref(),
        )
        .await?;

        info!("Connected to event stream at {}", url);

        Ok(Self {
            url,
            client,
            config,
            last_event_id,
            connection,
        })
    }

    /// Endpoint this session streams from.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Resumption ID the session currently holds.
    pub fn last_event_id(&self) -> Option<&str> {
        self.last_event_id.as_deref()
    }

    /// Start producing events.
    ///
    /// Consumes the session, so the sequence cannot be restarted; build a
    /// new session to start over. Must be called within a tokio runtime.
    pub fn events(self) -> EventStream {
        let (tx, rx) = mpsc::channel(self.config.channel_capacity);
        let (state_tx, state_rx) = watch::channel(SessionState::Streaming);
        let cancel = CancellationToken::new();

        let worker = Worker {
            url: self.url,
            client: self.client,
            headers: self.config.headers,
            last_event_id: self.last_event_id,
            retry: self.config.retry,
            connection: self.connection,
            tx,
            state_tx,
            cancel: cancel.clone(),
        };

        tokio::spawn(worker.run());

        EventStream::new(rx, state_rx, cancel)
    }
}

/// Build the headers for a connect attempt.
///
/// Caller headers that collide with the standard ones (compared without
/// case) are dropped, so each goes on the wire exactly once.
pub(crate) fn request_headers(extra: &Headers, last_event_id: Option<&str>) -> Headers {
    let mut headers: Headers = extra
        .iter()
        .filter(|(name, _)| {
            !MANAGED_HEADERS
                .iter()
                .any(|managed| name.eq_ignore_ascii_case(managed))
        })
        .map(|(name, value)| (name.clone(), value.clone()))
        .collect();
    headers.insert("Accept".to_string(), "text/event-stream".to_string());
    headers.insert("Cache-Control".to_string(), "no-cache".to_string());

    if let Some(id) = last_event_id.filter(|id| !id.is_empty()) {
        headers.insert(LAST_EVENT_ID_HEADER.to_string(), id.to_string());
    }

    headers
}

/// Open the stream once, wrapping transport failures.
pub(crate) async fn open_stream<C: HttpClient>(
    client: &C,
    url: &str,
    extra: &Headers,
    last_event_id: Option<&str>,
) -> Result<ByteStream, ConnectionError> {
    let headers = request_headers(extra, last_event_id);

    client
        .get_stream(url, &headers)
        .await
        .map_err(|source| ConnectionError::new(url, source))
}
