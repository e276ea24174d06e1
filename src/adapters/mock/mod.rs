//! Mock implementations for testing.
//!
//! - [`MockHttpClient`] - HTTP transport with a scripted sequence of connections

pub mod http;

pub use http::{MockHttpClient, MockResponse, RecordedRequest};
