//! Mock HTTP client for testing.
//!
//! Provides a configurable mock HTTP client that returns scripted responses
//! or errors, records every request, and can simulate a slow backend.

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::traits::{Headers, HttpClient, HttpError, Method, Request, Response};

/// A recorded HTTP request for verification in tests.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub url: String,
    pub headers: Headers,
    pub body: Option<String>,
    pub timeout: Option<Duration>,
}

impl RecordedRequest {
    /// Value of the `Authorization` header, matched case-insensitively.
    pub fn authorization(&self) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case("authorization"))
            .map(|(_, value)| value.as_str())
    }
}

/// Configuration for a mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a response (any status)
    Success(Response),
    /// Return a transport error
    Error(HttpError),
}

impl MockResponse {
    /// A response with the given status and JSON body.
    pub fn json(status: u16, body: serde_json::Value) -> Self {
        MockResponse::Success(Response::json_body(status, &body))
    }

    /// A response with the given status and an empty body.
    pub fn status(status: u16) -> Self {
        MockResponse::Success(Response::new(status, Bytes::new()))
    }
}

/// Mock HTTP client for testing.
///
/// Responses are looked up per URL in this order: queued one-shot
/// responses (exact URL), the fixed response for the exact URL, the first
/// fixed response whose URL is a prefix, then the default.
///
/// # Example
///
/// ```ignore
/// use aimeals::adapters::mock::{MockHttpClient, MockResponse};
///
/// let client = MockHttpClient::new();
/// client.push_response("http://api/items", MockResponse::status(401));
/// client.push_response("http://api/items", MockResponse::status(200));
///
/// // first call sees 401, second sees 200
/// ```
#[derive(Debug, Clone)]
pub struct MockHttpClient {
    /// Fixed responses by URL
    responses: Arc<Mutex<HashMap<String, MockResponse>>>,
    /// One-shot responses consumed in order, by exact URL
    queued: Arc<Mutex<HashMap<String, VecDeque<MockResponse>>>>,
    /// Default response when no specific match
    default_response: Arc<Mutex<Option<MockResponse>>>,
    /// Simulated latency applied before answering
    delay: Arc<Mutex<Option<Duration>>>,
    /// Recorded requests for verification
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockHttpClient {
    /// Create a new mock HTTP client.
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            queued: Arc::new(Mutex::new(HashMap::new())),
            default_response: Arc::new(Mutex::new(None)),
            delay: Arc::new(Mutex::new(None)),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Set a fixed response for a URL.
    pub fn set_response(&self, url: &str, response: MockResponse) {
        let mut responses = self.responses.lock().unwrap();
        responses.insert(url.to_string(), response);
    }

    /// Queue a one-shot response for a URL. Queued responses take priority
    /// over fixed ones and are consumed in FIFO order.
    pub fn push_response(&self, url: &str, response: MockResponse) {
        let mut queued = self.queued.lock().unwrap();
        queued.entry(url.to_string()).or_default().push_back(response);
    }

    /// Set a default response for URLs without specific matches.
    pub fn set_default_response(&self, response: MockResponse) {
        *self.default_response.lock().unwrap() = Some(response);
    }

    /// Delay every answer by `delay`. A request whose own timeout is
    /// shorter fails with [`HttpError::Timeout`] once it elapses.
    pub fn set_delay(&self, delay: Option<Duration>) {
        *self.delay.lock().unwrap() = delay;
    }

    /// Get all recorded requests.
    pub fn get_requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Recorded requests whose URL matches exactly.
    pub fn requests_to(&self, url: &str) -> Vec<RecordedRequest> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url == url)
            .cloned()
            .collect()
    }

    /// Clear all recorded requests.
    pub fn clear_requests(&self) {
        self.requests.lock().unwrap().clear();
    }

    fn record_request(&self, request: &Request) {
        let mut requests = self.requests.lock().unwrap();
        requests.push(RecordedRequest {
            method: request.method,
            url: request.url.clone(),
            headers: request.headers.clone(),
            body: request.body.clone(),
            timeout: request.timeout,
        });
    }

    fn get_response(&self, url: &str) -> Option<MockResponse> {
        if let Some(queue) = self.queued.lock().unwrap().get_mut(url) {
            if let Some(response) = queue.pop_front() {
                return Some(response);
            }
        }

        let responses = self.responses.lock().unwrap();

        if let Some(response) = responses.get(url) {
            return Some(response.clone());
        }

        for (pattern, response) in responses.iter() {
            if url.starts_with(pattern) {
                return Some(response.clone());
            }
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
    async fn send(&self, request: Request) -> Result<Response, HttpError> {
        self.record_request(&request);

        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            match request.timeout {
                Some(timeout) if timeout < delay => {
                    tokio::time::sleep(timeout).await;
                    return Err(HttpError::Timeout(format!(
                        "{} {} exceeded {:?}",
                        request.method, request.url, timeout
                    )));
                }
                _ => tokio::time::sleep(delay).await,
            }
        }

        match self.get_response(&request.url) {
            Some(MockResponse::Success(response)) => Ok(response),
            Some(MockResponse::Error(err)) => Err(err),
            None => Err(HttpError::Other(format!(
                "No mock response for URL: {}",
                request.url
            ))),
        }
    }
}
