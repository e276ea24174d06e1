//! Parsed Server-Sent Event value.
//!
//! An [`Event`] is built from exactly one raw message block of the
//! `text/event-stream` format. Fields that did not appear in the block stay
//! `None`, so a consumer can tell "no override" apart from "override to an
//! empty value".

use serde::Serialize;

/// Event type reported when a message carries no `event:` line.
pub const DEFAULT_EVENT_TYPE: &str = "message";

/// A single parsed SSE message.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Event {
    /// Event ID (from the last `id:` line)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Event type (from the last `event:` line)
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub event: Option<String>,
    /// Payload from `data:` lines, joined with `\n`
    pub data: String,
    /// Reconnection time in milliseconds (from the last `retry:` line)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry: Option<u64>,
}

impl Event {
    /// Create an event that only carries a payload.
    pub fn with_data(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            ..Self::default()
        }
    }

    /// Event type, falling back to [`DEFAULT_EVENT_TYPE`].
    pub fn event_type(&self) -> &str {
        self.event.as_deref().unwrap_or(DEFAULT_EVENT_TYPE)
    }

    /// The ID to resume from, if this event carries a non-empty one.
    pub fn resume_id(&self) -> Option<&str> {
        self.id.as_deref().filter(|id| !id.is_empty())
    }

    /// True when the block set no field at all (blank or comment-only block).
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.event.is_none() && self.retry.is_none() && self.data.is_empty()
    }

    /// Render the canonical wire form of the present fields.
    ///
    /// The returned block has no trailing terminator. Multi-line data is
    /// emitted as one `data:` line per line.
    pub fn to_block(&self) -> String {
        let mut lines = Vec::new();

        if let Some(id) = &self.id {
            lines.push(format!("id: {}", id));
        }
        if let Some(event) = &self.event {
            lines.push(format!("event: {}", event));
        }
        if let Some(retry) = self.retry {
            lines.push(format!("retry: {}", retry));
        }
        if !self.data.is_empty() {
            lines.extend(self.data.split('\n').map(|line| format!("data: {}", line)));
        }

        lines.join("\n")
    }
}
