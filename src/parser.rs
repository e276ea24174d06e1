//! SSE message block parser
//!
//! Turns the raw text of one message block (the bytes between two
//! terminators, terminator stripped) into an [`Event`]:
//! - Lines end in CR, LF or CRLF, all treated the same
//! - `field: value` splits on the first colon; one leading space of the
//!   value is dropped
//! - `id:`, `event:` and `retry:` overwrite, the last occurrence wins
//! - `data:` lines accumulate, joined with `\n`
//! - Lines starting with `:` are comments (used for keepalive)
//! - Any other field name is ignored

use tracing::trace;

use crate::error::ParseError;
use crate::event::Event;

/// Parse one raw message block into an [`Event`].
///
/// Fields that do not appear in the block are left as `None`. Only a
/// malformed `retry:` value is an error; everything else is tolerated.
pub fn parse(raw: &str) -> Result<Event, ParseError> {
    let mut event = Event::default();
    let mut has_data = false;

    for line in Lines::new(raw) {
        let (field, value) = split_field(line);

        match field {
            // Comment line (or a blank line inside the block)
            "" => {}
            "id" => event.id = Some(value.to_string()),
            "event" => event.event = Some(value.to_string()),
            "retry" => {
                let retry = value
                    .parse::<u64>()
                    .map_err(|source| ParseError::InvalidRetry {
                        value: value.to_string(),
                        source,
                    })?;
                event.retry = Some(retry);
            }
            "data" => {
                if has_data {
                    event.data.push('\n');
                }
                event.data.push_str(value);
                has_data = true;
            }
            other => trace!(field = other, "ignoring unknown SSE field"),
        }
    }

    Ok(event)
}

/// Split a line into field name and value.
///
/// A line without a colon is a field name with an empty value.
fn split_field(line: &str) -> (&str, &str) {
    match line.split_once(':') {
        Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
        None => (line, ""),
    }
}

/// Iterator over the lines of a block, splitting on CRLF, LF or a lone CR.
struct Lines<'a> {
    rest: Option<&'a str>,
}

impl<'a> Lines<'a> {
    fn new(raw: &'a str) -> Self {
        Self { rest: Some(raw) }
    }
}

impl<'a> Iterator for Lines<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        let rest = self.rest?;

        match rest.find(|c: char| c == '\r' || c == '\n') {
            Some(pos) => {
                let ending = if rest[pos..].starts_with("\r\n") { 2 } else { 1 };
                self.rest = Some(&rest[pos + ending..]);
                Some(&rest[..pos])
            }
            None => {
                self.rest = None;
                Some(rest)
            }
        }
    }
}
