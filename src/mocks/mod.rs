//! Mock implementations for testing.
//!
//! Provides a mock transport and a recording sleeper for unit testing
//! without a running bridge or real waiting.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use crate::resilience::Sleeper;
use crate::transport::{
    Header, HttpRequest, HttpResponse, HttpTransport, ResponseBody, TransportError,
};

/// A recorded request.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Full request URI.
    pub url: String,
    /// Request headers, in send order.
    pub headers: Vec<Header>,
    /// Request body.
    pub body: Vec<u8>,
}

impl RecordedRequest {
    /// Looks up a header value by name, ignoring case.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|h| h.is_named(name))
            .map(|h| h.value.as_str())
    }

    /// Parses the body as JSON.
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// A mock response.
#[derive(Debug, Clone)]
pub struct MockResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: HashMap<String, String>,
    /// Response body.
    pub body: Vec<u8>,
}

impl MockResponse {
    /// Creates a response with a raw body.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HashMap::new(),
            body: body.into(),
        }
    }

    /// Creates a successful JSON response.
    pub fn json<T: serde::Serialize>(value: &T) -> Self {
        let body = serde_json::to_vec(value).unwrap_or_default();
        Self::new(200, body).with_header("content-type", "application/json")
    }

    /// Creates an error response carrying `message` in its `errors` field.
    pub fn error(status: u16, message: &str) -> Self {
        Self::json(&serde_json::json!({ "errors": message })).with_status(status)
    }

    /// Creates a response with custom status.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = status;
        self
    }

    /// Adds a header.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.insert(name.to_string(), value.to_string());
        self
    }

    fn status_line(&self) -> String {
        let reason = reqwest::StatusCode::from_u16(self.status)
            .ok()
            .and_then(|code| code.canonical_reason())
            .unwrap_or("Unknown");
        format!("HTTP/1.1 {} {reason}", self.status)
    }

    fn into_response(self) -> HttpResponse {
        HttpResponse {
            status: self.status,
            status_line: self.status_line(),
            headers: self.headers,
            body: ResponseBody::from_bytes(self.body),
        }
    }
}

/// Mock HTTP transport for testing.
///
/// Queued outcomes are served in order. Once the queue is empty the default
/// failure, if set, is returned; otherwise an empty JSON object with status
/// 200.
#[derive(Debug, Default)]
pub struct MockTransport {
    outcomes: Mutex<VecDeque<Result<MockResponse, TransportError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
    default_failure: Mutex<Option<TransportError>>,
    shutdowns: AtomicUsize,
}

impl MockTransport {
    /// Creates a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a response.
    pub fn queue(&self, response: MockResponse) {
        lock(&self.outcomes).push_back(Ok(response));
    }

    /// Queues a transport failure.
    pub fn queue_failure(&self, error: TransportError) {
        lock(&self.outcomes).push_back(Err(error));
    }

    /// Fails every request once the queue is empty.
    pub fn set_default_failure(&self, error: TransportError) {
        *lock(&self.default_failure) = Some(error);
    }

    /// Gets all recorded requests.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.requests).clone()
    }

    /// Gets the last recorded request.
    pub fn last_request(&self) -> Option<RecordedRequest> {
        lock(&self.requests).last().cloned()
    }

    /// Returns the number of requests made.
    pub fn request_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Returns how many times [`HttpTransport::shutdown`] was called.
    pub fn shutdown_count(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

impl HttpTransport for MockTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        lock(&self.requests).push(RecordedRequest {
            url: request.url.to_string(),
            headers: request.headers,
            body: request.body,
        });

        let queued = lock(&self.outcomes).pop_front();
        match queued {
            Some(outcome) => outcome.map(MockResponse::into_response),
            None => match lock(&self.default_failure).clone() {
                Some(error) => Err(error),
                None => Ok(MockResponse::json(&serde_json::json!({})).into_response()),
            },
        }
    }

    fn shutdown(&self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
    }
}

type SleepHook = Box<dyn Fn() + Send + Sync>;

/// Sleeper that records requested delays instead of waiting.
#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: Mutex<Vec<Duration>>,
    hook: Mutex<Option<SleepHook>>,
}

impl RecordingSleeper {
    /// Creates a new recording sleeper.
    pub fn new() -> Self {
        Self::default()
    }

    /// Gets every delay requested so far.
    pub fn sleeps(&self) -> Vec<Duration> {
        lock(&self.sleeps).clone()
    }

    /// Runs `hook` on every sleep, after recording it.
    pub fn on_sleep(&self, hook: impl Fn() + Send + Sync + 'static) {
        *lock(&self.hook) = Some(Box::new(hook));
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        lock(&self.sleeps).push(duration);
        if let Some(hook) = lock(&self.hook).as_ref() {
            hook();
        }
    }
}

impl std::fmt::Debug for RecordingSleeper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordingSleeper")
            .field("sleeps", &self.sleeps())
            .finish_non_exhaustive()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Test fixtures.
pub mod fixtures {
    use serde_json::{json, Value};

    /// A search response with two records and a brand navigation.
    pub fn search_response() -> Value {
        json!({
            "id": "6b0d4d1c",
            "area": "Production",
            "query": "boots",
            "originalQuery": "boots",
            "totalRecordCount": 2,
            "pageInfo": {"recordStart": 1, "recordEnd": 2},
            "records": [
                {"_id": "r1", "_u": "http://shop/r1", "_t": "Hiking boot", "allMeta": {"price": 120}},
                {"_id": "r2", "_u": "http://shop/r2", "_t": "Rain boot", "allMeta": {"price": 45}}
            ],
            "availableNavigation": [{
                "name": "brand",
                "displayName": "Brand",
                "type": "String",
                "refinements": [
                    {"type": "Value", "value": "Acme", "count": 1},
                    {"type": "Value", "value": "Globex", "count": 1}
                ]
            }],
            "didYouMean": [],
            "warnings": []
        })
    }

    /// A refinements response for the brand navigation.
    pub fn refinements_response() -> Value {
        json!({
            "id": "91f2aa0e",
            "navigation": {
                "name": "brand",
                "displayName": "Brand",
                "refinements": [
                    {"type": "Value", "value": "Acme", "count": 1},
                    {"type": "Value", "value": "Globex", "count": 1},
                    {"type": "Value", "value": "Initech", "count": 0}
                ]
            }
        })
    }
}
