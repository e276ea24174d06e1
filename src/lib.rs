//! Resumable Server-Sent Events client.
//!
//! Keeps a long-lived `text/event-stream` GET request open, parses the body
//! into [`Event`]s and reconnects when the server closes the stream,
//! honouring `retry:` and resuming with `Last-Event-ID`.
//!
//! ```ignore
//! use sse_session::adapters::ReqwestHttpClient;
//! use sse_session::session::StreamSession;
//!
//! let session = StreamSession::new("https://example.com/events", ReqwestHttpClient::new()).await?;
//! let mut events = session.events();
//! while let Some(event) = events.recv().await {
//!     let event = event?;
//!     println!("{}: {}", event.event_type(), event.data);
//! }
//! ```
//!
//! The crate is organized by layer:
//! - `parser` / `scanner`: wire format, no I/O.
//! - `session`: connection lifecycle and the read loop.
//! - `traits` / `adapters`: the HTTP transport seam and its implementations.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod error;
pub mod event;
pub mod parser;
pub mod scanner;
pub mod session;
pub mod traits;

pub use config::SessionConfig;
pub use error::{ConnectionError, ParseError, SseError, SseResult};
pub use event::Event;
pub use session::{EventStream, SessionState, StreamSession};
