//! Concrete implementations of trait abstractions.
//!
//! # Adapters
//!
//! - [`ReqwestHttpClient`] - HTTP transport using reqwest
//!
//! # Mock Implementations
//!
//! The [`mock`] submodule provides a scripted transport for tests:
//! - [`mock::MockHttpClient`] - Connect outcomes handed out in order

pub mod mock;
pub mod reqwest_http;

pub use mock::{MockHttpClient, MockResponse};
pub use reqwest_http::ReqwestHttpClient;
