//! Wire-format parse errors.

use std::num::ParseIntError;

use thiserror::Error;

/// Error raised while turning a raw message block into an [`Event`].
///
/// [`Event`]: crate::event::Event
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A `retry:` field whose value is not a non-negative integer.
    #[error("invalid retry value {value:?}: {source}")]
    InvalidRetry {
        value: String,
        #[source]
        source: ParseIntError,
    },
}
