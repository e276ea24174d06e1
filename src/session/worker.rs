//! Read loop that drives one session.
//!
//! Runs on its own tokio task. Reading, parsing, delivering and the
//! reconnect sleep happen strictly one after another, so `last_event_id`
//! and `retry` always reflect exactly the events already delivered.

use std::time::Duration;

use futures_util::StreamExt;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use super::{open_stream, SessionState};
use crate::error::{ConnectionError, SseError, SseResult};
use crate::event::Event;
use crate::parser::parse;
use crate::scanner::{decode_block, BlockScanner};
use crate::traits::{ByteStream, Headers, HttpClient};

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Exit {
    /// Cancelled, or the consumer went away
    Cancelled,
    /// An error was delivered to the consumer
    Failed,
}

pub(super) struct Worker<C> {
    pub(super) url: String,
    pub(super) client: C,
    pub(super) headers: Headers,
    pub(super) last_event_id: Option<String>,
    pub(super) retry: Duration,
    pub(super) connection: ByteStream,
    pub(super) tx: mpsc::Sender<SseResult<Event>>,
    pub(super) state_tx: watch::Sender<SessionState>,
    pub(super) cancel: CancellationToken,
}

impl<C: HttpClient> Worker<C> {
    pub(super) async fn run(mut self) {
        let exit = self.read_loop().await;

        let state = match exit {
            Exit::Cancelled => SessionState::Closed,
            Exit::Failed => SessionState::Failed,
        };
        self.set_state(state);

        debug!(url = %self.url, ?state, "Session read loop ended");
    }

    async fn read_loop(&mut self) -> Exit {
        let mut scanner = BlockScanner::new();

        loop {
            while let Some(block) = scanner.next_block() {
                let event = match parse(&decode_block(&block)) {
                    Ok(event) => event,
                    Err(e) => {
                        warn!(url = %self.url, error = %e, "Malformed SSE block, closing session");
                        deliver(&self.tx, &self.cancel, Err(SseError::Parse(e))).await;
                        return Exit::Failed;
                    }
                };

                if let Some(id) = event.resume_id() {
                    self.last_event_id = Some(id.to_string());
                }
                // Zero would reconnect in a tight loop; keep the current delay
                if let Some(ms) = event.retry.filter(|ms| *ms > 0) {
                    self.retry = Duration::from_millis(ms);
                    debug!(retry_ms = ms, "Server updated reconnection delay");
                }

                if event.is_empty() {
                    trace!("Skipping block without fields");
                    continue;
                }

                if !deliver(&self.tx, &self.cancel, Ok(event)).await {
                    return Exit::Cancelled;
                }
            }

            let chunk = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Exit::Cancelled,
                chunk = self.connection.next() => chunk,
            };

            match chunk {
                Some(Ok(bytes)) => scanner.push(&bytes),
                Some(Err(e)) => {
                    error!(url = %self.url, error = %e, "Event stream read failed");
                    let err = ConnectionError::new(self.url.clone(), e);
                    deliver(&self.tx, &self.cancel, Err(SseError::Connection(err))).await;
                    return Exit::Failed;
                }
                None => {
                    scanner.clear();
                    if let Err(exit) = self.reconnect().await {
                        return exit;
                    }
                }
            }
        }
    }

    /// Wait out the retry delay and open a fresh connection.
    async fn reconnect(&mut self) -> Result<(), Exit> {
        // Release the finished connection before sleeping
        self.connection = Box::pin(futures::stream::empty());

        info!(
            url = %self.url,
            retry_ms = self.retry.as_millis() as u64,
            last_event_id = self.last_event_id.as_deref().unwrap_or(""),
            "Event stream ended, reconnecting"
        );
        self.set_state(SessionState::WaitingRetry { delay: self.retry });

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Exit::Cancelled),
            _ = tokio::time::sleep(self.retry) => {}
        }

        self.set_state(SessionState::Connecting);

        let opened = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Exit::Cancelled),
            opened = open_stream(
                &self.client,
                &self.url,
                &self.headers,
                self.last_event_id.as_deref(),
            ) => opened,
        };

        match opened {
            Ok(connection) => {
                self.connection = connection;
                self.set_state(SessionState::Streaming);
                info!("Reconnected to event stream at {}", self.url);
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "Reconnect failed, closing session");
                deliver(&self.tx, &self.cancel, Err(SseError::Connection(e))).await;
                Err(Exit::Failed)
            }
        }
    }

    fn set_state(&self, state: SessionState) {
        let _ = self.state_tx.send(state);
    }
}

/// Hand an item to the consumer.
///
/// Returns false when the session was cancelled or the consumer is gone.
async fn deliver(
    tx: &mpsc::Sender<SseResult<Event>>,
    cancel: &CancellationToken,
    item: SseResult<Event>,
) -> bool {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        sent = tx.send(item) => sent.is_ok(),
    }
}
