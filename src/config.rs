//! Session configuration.
//!
//! Use the builder methods to customize a session:
//!
//! ```ignore
//! use sse_session::config::SessionConfig;
//! use std::time::Duration;
//!
//! let config = SessionConfig::default()
//!     .with_retry(Duration::from_millis(500))
//!     .with_header("Authorization", "Bearer token");
//! ```

use std::time::Duration;

use tracing::warn;

use crate::traits::Headers;

/// Reconnection delay used until the server sends a `retry:` field.
pub const DEFAULT_RETRY_MS: u64 = 3000;

/// Number of events buffered between the read loop and the consumer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Environment variable overriding the initial retry interval (milliseconds).
pub const RETRY_ENV: &str = "SSE_RETRY_MS";

/// Environment variable seeding the resumption ID of a new session.
pub const LAST_EVENT_ID_ENV: &str = "SSE_LAST_EVENT_ID";

/// Configuration for a [`StreamSession`](crate::session::StreamSession).
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Initial reconnection delay (default: 3000 ms)
    pub retry: Duration,
    /// Resumption ID sent on the very first connect, if any
    pub last_event_id: Option<String>,
    /// Extra request headers (e.g. `Authorization`)
    pub headers: Headers,
    /// Capacity of the event channel (default: 64)
    pub channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            retry: Duration::from_millis(DEFAULT_RETRY_MS),
            last_event_id: None,
            headers: Headers::new(),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl SessionConfig {
    /// Create a new SessionConfig with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the initial reconnection delay.
    pub fn with_retry(mut self, retry: Duration) -> Self {
        self.retry = retry;
        self
    }

    /// Resume from `id` on the first connect.
    pub fn with_last_event_id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        self.last_event_id = (!id.is_empty()).then_some(id);
        self
    }

    /// Add a request header sent on every connect.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Set the event channel capacity (at least 1).
    pub fn with_channel_capacity(mut self, capacity: usize) -> Self {
        self.channel_capacity = capacity.max(1);
        self
    }

    /// Create config from `SSE_RETRY_MS` and `SSE_LAST_EVENT_ID`.
    ///
    /// Unset variables keep their defaults; an unparsable retry value is
    /// logged and ignored.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup(RETRY_ENV) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => config.retry = Duration::from_millis(ms),
                Err(e) => warn!(value = %raw, error = %e, "Ignoring invalid {}", RETRY_ENV),
            }
        }

        if let Some(id) = lookup(LAST_EVENT_ID_ENV) {
            config = config.with_last_event_id(id);
        }

        config
    }
}
