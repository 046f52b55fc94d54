// src/github/testing.rs
// =============================================================================
// Test doubles for the GitHub client (compiled only for `cargo test`).
//
// - ScriptedTransport: replays canned responses keyed by "path?query" and
//   records every request it receives. Anything not scripted answers 404,
//   which is exactly what GitHub does for a disabled feature.
// - RecordingBackoff: a frozen clock that records requested waits instead of
//   sleeping.
// =============================================================================

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use super::client::{Backoff, GitHubClient, HttpRequest, HttpResponse, RetryPolicy, Transport};
use crate::error::ApiError;

pub const TEST_BASE_URL: &str = "https://api.github.com";

/// Build a JSON response with the given status.
pub fn response(status: u16, body: Value) -> HttpResponse {
    HttpResponse {
        status,
        headers: HashMap::new(),
        body: body.to_string(),
    }
}

impl HttpResponse {
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }
}

impl HttpRequest {
    /// Look up a sent header by (case-insensitive) name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

type Scripted = Result<HttpResponse, ApiError>;

#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<HashMap<String, VecDeque<Scripted>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `key` ("/path" or "/path?a=1&b=2").
    /// Queued responses are returned in order; the last one repeats.
    pub fn on(&self, key: &str, response: HttpResponse) {
        self.push(key, Ok(response));
    }

    /// Queue a transport-level failure for `key`.
    pub fn fail(&self, key: &str, error: ApiError) {
        self.push(key, Err(error));
    }

    /// Drop everything queued for `key`, so it answers 404 again.
    pub fn clear(&self, key: &str) {
        self.routes.lock().unwrap().remove(key);
    }

    fn push(&self, key: &str, scripted: Scripted) {
        self.routes
            .lock()
            .unwrap()
            .entry(key.to_string())
            .or_default()
            .push_back(scripted);
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Request keys in the order they were sent.
    pub fn request_keys(&self) -> Vec<String> {
        self.requests().iter().map(|r| key_for(&r.url)).collect()
    }

    pub fn count(&self, key: &str) -> usize {
        self.request_keys().iter().filter(|k| k.as_str() == key).count()
    }
}

fn key_for(url: &url::Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        self.requests.lock().unwrap().push(request.clone());

        let key = key_for(&request.url);
        let mut routes = self.routes.lock().unwrap();
        match routes.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Ok(response(404, json!({"message": "Not Found"}))),
        }
    }
}

pub struct RecordingBackoff {
    now: DateTime<Utc>,
    waits: Mutex<Vec<Duration>>,
}

impl RecordingBackoff {
    pub fn at_epoch(epoch: i64) -> Self {
        Self {
            now: DateTime::from_timestamp(epoch, 0).unwrap(),
            waits: Mutex::new(Vec::new()),
        }
    }

    pub fn waits(&self) -> Vec<Duration> {
        self.waits.lock().unwrap().clone()
    }
}

#[async_trait]
impl Backoff for RecordingBackoff {
    fn now(&self) -> DateTime<Utc> {
        self.now
    }

    async fn wait(&self, duration: Duration) {
        self.waits.lock().unwrap().push(duration);
    }
}

/// A client wired to `transport`, a frozen clock and two retries.
pub fn test_client(transport: Arc<ScriptedTransport>) -> GitHubClient {
    GitHubClient::new(
        TEST_BASE_URL,
        "test-token",
        transport,
        RetryPolicy::new(2, Arc::new(RecordingBackoff::at_epoch(1_700_000_000))),
    )
}
