//! Consumer side of a running session.

use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Duration;

use futures::Stream;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::SseResult;
use crate::event::Event;

/// Lifecycle of a session's read loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Opening a new connection
    Connecting,
    /// Reading events from an open connection
    Streaming,
    /// The stream ended; waiting before reconnecting
    WaitingRetry { delay: Duration },
    /// An error ended the sequence
    Failed,
    /// Cancelled; the connection has been released
    Closed,
}

impl SessionState {
    /// True once the read loop has stopped.
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Failed | SessionState::Closed)
    }
}

/// Lazy, infinite sequence of events from one session.
///
/// Yields `Ok(event)` in wire order. The sequence ends after yielding a
/// single `Err`, or without an error once cancelled. Dropping the stream
/// cancels the session.
pub struct EventStream {
    rx: mpsc::Receiver<SseResult<Event>>,
    state_rx: watch::Receiver<SessionState>,
    cancel: CancellationToken,
}

impl EventStream {
    pub(super) fn new(
        rx: mpsc::Receiver<SseResult<Event>>,
        state_rx: watch::Receiver<SessionState>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            rx,
            state_rx,
            cancel,
        }
    }

    /// Receive the next event.
    ///
    /// Returns `None` once the sequence has ended.
    pub async fn recv(&mut self) -> Option<SseResult<Event>> {
        if self.cancel.is_cancelled() {
            return None;
        }

        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            item = self.rx.recv() => item,
        }
    }

    /// Stop the session.
    ///
    /// Any pending read or retry sleep is abandoned and the connection is
    /// released. Events still queued are discarded.
    pub fn cancel(&self) {
        if !self.cancel.is_cancelled() {
            debug!("Cancelling event stream");
        }
        self.cancel.cancel();
    }

    /// Token that cancels this session when triggered.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Get the current state of the read loop.
    pub fn state(&self) -> SessionState {
        *self.state_rx.borrow()
    }

    /// Subscribe to state changes.
    pub fn state_receiver(&self) -> watch::Receiver<SessionState> {
        self.state_rx.clone()
    }

    /// Iterate from synchronous code.
    ///
    /// Each `next` blocks the calling thread, so it must not be used from
    /// inside an async context. The session keeps running on its runtime.
    pub fn into_blocking_iter(self) -> BlockingEvents {
        BlockingEvents { inner: self }
    }
}

impl Stream for EventStream {
    type Item = SseResult<Event>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.cancel.is_cancelled() {
            return Poll::Ready(None);
        }
        self.rx.poll_recv(cx)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl std::fmt::Debug for EventStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventStream")
            .field("state", &self.state())
            .field("cancelled", &self.cancel.is_cancelled())
            .finish()
    }
}

/// Blocking iterator over a session's events.
#[derive(Debug)]
pub struct BlockingEvents {
    inner: EventStream,
}

impl BlockingEvents {
    /// Token that cancels the underlying session.
    pub fn cancel_token(&self) -> CancellationToken {
        self.inner.cancel_token()
    }
}

impl Iterator for BlockingEvents {
    type Item = SseResult<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.inner.cancel.is_cancelled() {
            return None;
        }
        self.inner.rx.blocking_recv()
    }
}
