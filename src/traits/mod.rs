//! Trait abstractions for dependency injection and testability.
//!
//! # Traits
//!
//! - [`HttpClient`] - open a GET request as a streaming response body

pub mod http;

pub use http::{ByteStream, Headers, HttpClient, HttpError};
