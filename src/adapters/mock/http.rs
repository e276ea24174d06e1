//! Mock HTTP transport for testing.
//!
//! Each call to `get_stream` consumes the next scripted connection, so a
//! test can describe a whole reconnect sequence up front: first body, then
//! what the second connect returns, and so on. Every request is recorded
//! with its headers and the (tokio) time it was made.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::traits::{ByteStream, Headers, HttpClient, HttpError};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request URL
    pub url: String,
    /// Request headers
    pub headers: Headers,
    /// When the request was made
    pub at: Instant,
}

impl RecordedRequest {
    /// Look up a header by exact name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).map(String::as_str)
    }
}

/// Scripted outcome of one connect.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Body chunks followed by a graceful close
    Stream(Vec<Bytes>),
    /// Body chunks, then the connection stays open and silent
    StreamThenHang(Vec<Bytes>),
    /// Body chunks, then a read error
    StreamThenError(Vec<Bytes>, HttpError),
    /// The connect itself fails
    Error(HttpError),
}

impl MockResponse {
    /// A body made of one chunk that then closes.
    pub fn body(text: &str) -> Self {
        MockResponse::Stream(vec![Bytes::from(text.to_string())])
    }

    /// A body split into the given chunks that then closes.
    pub fn chunks(chunks: &[&str]) -> Self {
        MockResponse::Stream(
            chunks
                .iter()
                .map(|chunk| Bytes::from(chunk.to_string()))
                .collect(),
        )
    }

    /// A body made of one chunk that then stays open.
    pub fn body_then_hang(text: &str) -> Self {
        MockResponse::StreamThenHang(vec![Bytes::from(text.to_string())])
    }
}

/// Mock HTTP client for testing.
///
/// # Example
///
/// ```ignore
/// use sse_session::adapters::mock::{MockHttpClient, MockResponse};
///
/// let client = MockHttpClient::new();
/// client.push_response(MockResponse::body("id: 1\ndata: hello\n\n"));
/// client.push_response(MockResponse::body_then_hang(""));
///
/// // ... run a session against `client.clone()` ...
///
/// let requests = client.wait_for_requests(2).await;
/// assert_eq!(requests[1].header("Last-Event-ID"), Some("1"));
/// ```
#[derive(Debug, Clone)]
pub struct MockHttpClient {
    /// Outcomes handed out in connect order
    script: Arc<Mutex<VecDeque<MockResponse>>>,
    /// Outcome used once the script is exhausted
    default_response: Arc<Mutex<Option<MockResponse>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    /// Woken whenever a request is recorded
    recorded: Arc<Notify>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client with an empty script.
    pub fn new() -> Self {
        Self {
            script: Arc::new(Mutex::new(VecDeque::new())),
            default_response: Arc::new(Mutex::new(None)),
            requests: Arc::new(Mutex::new(Vec::new())),
            recorded: Arc::new(Notify::new()),
        }
    }

    /// Create a client whose connects return `responses` in order.
    pub fn with_script(responses: impl IntoIterator<Item = MockResponse>) -> Self {
        let client = Self::new();
        for response in responses {
            client.push_response(response);
        }
        client
    }

    /// Queue the outcome of the next unscripted connect.
    pub fn push_response(&self, response: MockResponse) {
        self.script.lock().unwrap().push_back(response);
    }

    /// Set the outcome used once the script runs out.
    pub fn set_default_response(&self, response: MockResponse) {
        *self.default_response.lock().unwrap() = Some(response);
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Wait until at least `count` requests were made, then return them all.
    pub async fn wait_for_requests(&self, count: usize) -> Vec<RecordedRequest> {
        loop {
            let notified = self.recorded.notified();
            {
                let requests = self.requests.lock().unwrap();
                if requests.len() >= count {
                    return requests.clone();
                }
            }
            notified.await;
        }
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn record_request(&self, url: &str, headers: &Headers) {
        self.requests.lock().unwrap().push(RecordedRequest {
            url: url.to_string(),
            headers: headers.clone(),
            at: Instant::now(),
        });
        self.recorded.notify_waiters();
    }

    fn next_response(&self) -> Option<MockResponse> {
        if let Some(response) = self.script.lock().unwrap().pop_front() {
            return Some(response);
        }
        self.default_response.lock().unwrap().clone()
    }
}

impl Default for MockHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for MockHttpClient {
    async fn get_stream(&self, url: &str, headers: &Headers) -> Result<ByteStream, HttpError> {
        self.record_request(url, headers);

        match self.next_response() {
            Some(MockResponse::Stream(chunks)) => {
                let stream = futures::stream::iter(chunks.into_iter().map(Ok::<Bytes, HttpError>));
                Ok(Box::pin(stream))
            }
            Some(MockResponse::StreamThenHang(chunks)) => {
                use futures::StreamExt;

                let stream = futures::stream::iter(chunks.into_iter().map(Ok::<Bytes, HttpError>))
                    .chain(futures::stream::pending());
                Ok(Box::pin(stream))
            }
            Some(MockResponse::StreamThenError(chunks, err)) => {
                let items = chunks
                    .into_iter()
                    .map(Ok::<Bytes, HttpError>)
                    .chain(std::iter::once(Err(err)));
                Ok(Box::pin(futures::stream::iter(items)))
            }
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(HttpError::Other(format!("No mock response for URL: {}", url))),
        }
    }
}
