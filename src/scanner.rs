//! Incremental message block scanner.
//!
//! Accumulates body bytes and splits them into raw message blocks at the
//! blank-line terminators `\r\n\r\n`, `\n\n` and `\r\r`. The block returned
//! is always the one whose terminator ends first, which is what a scan after
//! every single appended byte would find, so chunk boundaries never change
//! how a body is split.
//!
//! Each end position is examined once: the cursor remembers how far the
//! buffer has already been searched.

use std::borrow::Cow;

use bytes::{Buf, Bytes, BytesMut};
use tracing::warn;

/// Size past which an unterminated block is reported once.
pub const LARGE_BLOCK_BYTES: usize = 1024 * 1024;

/// Splits a byte stream into SSE message blocks.
#[derive(Debug, Default)]
pub struct BlockScanner {
    /// Bytes received since the last emitted block
    buffer: BytesMut,
    /// Next terminator end position to examine
    cursor: usize,
    /// Set once the pending block has been reported as large
    warned_large: bool,
}

impl BlockScanner {
    /// Create an empty scanner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append bytes read from the stream.
    pub fn push(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);

        if !self.warned_large && self.buffer.len() > LARGE_BLOCK_BYTES {
            warn!(
                buffered = self.buffer.len(),
                "SSE stream sent more than {} bytes without a message terminator", LARGE_BLOCK_BYTES
            );
            self.warned_large = true;
        }
    }

    /// Take the next complete block, terminator stripped.
    ///
    /// Returns `None` when the buffer holds no terminator yet; the partial
    /// block stays buffered for the next [`push`](Self::push).
    pub fn next_block(&mut self) -> Option<Bytes> {
        let start = self.cursor.max(2);

        for end in start..=self.buffer.len() {
            if let Some(len) = terminator_ending_at(&self.buffer[..end]) {
                let block = self.buffer.split_to(end - len).freeze();
                self.buffer.advance(len);
                self.cursor = 0;
                self.warned_large = false;
                return Some(block);
            }
        }

        self.cursor = self.buffer.len() + 1;
        None
    }

    /// Drop everything buffered (used when the connection is replaced).
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
        self.warned_large = false;
    }

    /// Number of buffered bytes not yet emitted as a block.
    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    /// True when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }
}

/// Length of the terminator that `bytes` ends with, if any.
fn terminator_ending_at(bytes: &[u8]) -> Option<usize> {
    if bytes.ends_with(b"\n\n") || bytes.ends_with(b"\r\r") {
        Some(2)
    } else if bytes.ends_with(b"\r\n\r\n") {
        Some(4)
    } else {
        None
    }
}

/// Decode a block as UTF-8, replacing invalid sequences.
pub fn decode_block(block: &[u8]) -> Cow<'_, str> {
    let text = String::from_utf8_lossy(block);
    if let Cow::Owned(_) = text {
        warn!(len = block.len(), "Received invalid UTF-8 in SSE stream");
    }
    text
}
