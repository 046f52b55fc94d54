// src/github/client.rs
// =============================================================================
// The authenticated GitHub API client.
//
// Every request in the exporter goes through GitHubClient::get_page(), which:
// - Builds the full URL from the base URL, a path and query parameters
// - Attaches the bearer token and the GitHub JSON media type
// - Classifies the response (success, rate limited, not found, unauthorized)
// - Waits for the rate-limit reset and retries, up to RetryPolicy::max_retries
//
// The network itself sits behind the Transport trait, and waiting sits behind
// the Backoff trait. Production code uses reqwest and tokio's timer; tests
// plug in scripted responses and a clock that never really sleeps.
//
// Rust concepts:
// - Traits as seams: Arc<dyn Transport> lets us swap the HTTP layer
// - async-trait: async fn in traits that can be used as trait objects
// - HashMap: response headers, keyed by lowercase name
// =============================================================================

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use url::Url;

use crate::error::ApiError;

/// Extra time added after the reset timestamp to absorb clock skew.
pub const RESET_SLACK: Duration = Duration::from_secs(1);

/// Wait used when GitHub says "slow down" without saying for how long.
pub const FALLBACK_RATE_LIMIT_WAIT: Duration = Duration::from_secs(60);

// An outbound GET request, fully resolved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: Url,
    pub headers: Vec<(String, String)>,
}

// A raw response as seen by the client, before classification
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    pub status: u16,
    /// Header names are stored lowercase
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }
}

// Sends one HTTP GET. Implementations must not retry on their own.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;
}

// The real transport, backed by a reqwest::Client
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let mut builder = self.client.get(request.url.clone());
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|v| (name.as_str().to_ascii_lowercase(), v.to_string()))
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;

        Ok(HttpResponse {
            status,
            headers,
            body,
        })
    }
}

// Where "now" comes from, and how we wait. Injected so tests stay instant.
#[async_trait]
pub trait Backoff: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
    async fn wait(&self, duration: Duration);
}

/// Wall clock plus tokio's timer.
pub struct TokioBackoff;

#[async_trait]
impl Backoff for TokioBackoff {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    async fn wait(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

// Bounded retry for rate-limited responses
#[derive(Clone)]
pub struct RetryPolicy {
    /// Retries after the first attempt; total requests = max_retries + 1
    pub max_retries: u32,
    pub backoff: Arc<dyn Backoff>,
}

impl RetryPolicy {
    pub fn new(max_retries: u32, backoff: Arc<dyn Backoff>) -> Self {
        Self {
            max_retries,
            backoff,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(2, Arc::new(TokioBackoff))
    }
}

impl std::fmt::Debug for RetryPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetryPolicy")
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

// A successful response: decoded JSON plus the raw Link header
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// The URL actually requested, query included
    pub url: String,
    pub body: Value,
    pub link: Option<String>,
}

// What a response means for the retry loop
#[derive(Debug, PartialEq, Eq)]
enum Verdict {
    Success,
    RateLimited {
        reset_at: DateTime<Utc>,
        wait: Duration,
    },
    Failed(ApiError),
}

// The GitHub client. Read-only after construction, so one instance serves
// every fetcher.
pub struct GitHubClient {
    base_url: String,
    token: String,
    transport: Arc<dyn Transport>,
    retry: RetryPolicy,
}

impl GitHubClient {
    pub fn new(
        base_url: &str,
        token: &str,
        transport: Arc<dyn Transport>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            transport,
            retry,
        }
    }

    /// GET a path and return its decoded JSON body.
    pub async fn get(&self, path: &str, query: &[(&str, String)]) -> Result<Value, ApiError> {
        Ok(self.get_page(path, query).await?.body)
    }

    /// GET a path (or an absolute URL taken from a Link header) and return the
    /// body together with the Link header.
    pub async fn get_page(
        &self,
        target: &str,
        query: &[(&str, String)],
    ) -> Result<ApiResponse, ApiError> {
        let request = self.build_request(target, query)?;
        let url = request.url.to_string();

        let mut attempt = 0u32;
        loop {
            attempt += 1;
            tracing::debug!(%url, attempt, "GET");

            let response = self.transport.send(&request).await?;

            match classify(&response, &url, self.retry.backoff.now()) {
                Verdict::Success => {
                    let body = serde_json::from_str(&response.body).map_err(|e| {
                        ApiError::Decode {
                            url: url.clone(),
                            message: e.to_string(),
                        }
                    })?;
                    return Ok(ApiResponse {
                        url,
                        body,
                        link: response.header("link").map(str::to_string),
                    });
                }
                Verdict::RateLimited { reset_at, wait } => {
                    if attempt > self.retry.max_retries {
                        return Err(ApiError::RateLimited {
                            reset_at,
                            attempts: attempt,
                        });
                    }
                    tracing::warn!(
                        %url,
                        attempt,
                        wait_secs = wait.as_secs(),
                        "Rate limited, waiting for reset"
                    );
                    self.retry.backoff.wait(wait).await;
                }
                Verdict::Failed(error) => return Err(error),
            }
        }
    }

    fn build_request(
        &self,
        target: &str,
        query: &[(&str, String)],
    ) -> Result<HttpRequest, ApiError> {
        let absolute = target.starts_with("https://") || target.starts_with("http://");
        let raw = if absolute {
            target.to_string()
        } else {
            format!("{}{}", self.base_url, target)
        };

        let mut url = parse_url(&raw)?;

        // Absolute URLs come from Link headers. The token only ever goes to
        // the API's own scheme, host and port.
        if absolute && url.origin() != parse_url(&self.base_url)?.origin() {
            return Err(ApiError::ForeignUrl {
                url: raw,
                base_url: self.base_url.clone(),
            });
        }

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(HttpRequest {
            url,
            headers: vec![
                ("Authorization".to_string(), format!("Bearer {}", self.token)),
                (
                    "Accept".to_string(),
                    "application/vnd.github+json".to_string(),
                ),
                ("X-GitHub-Api-Version".to_string(), "2022-11-28".to_string()),
            ],
        })
    }
}

fn parse_url(raw: &str) -> Result<Url, ApiError> {
    Url::parse(raw).map_err(|e| ApiError::Decode {
        url: raw.to_string(),
        message: format!("invalid URL: {}", e),
    })
}

// Decides what a response means, without side effects
fn classify(response: &HttpResponse, url: &str, now: DateTime<Utc>) -> Verdict {
    let status = response.status;

    if (200..300).contains(&status) {
        return Verdict::Success;
    }

    if status == 403 || status == 429 {
        if let Some((reset_at, wait)) = rate_limit_wait(response, now) {
            return Verdict::RateLimited { reset_at, wait };
        }
        if status == 429 {
            return Verdict::RateLimited {
                reset_at: now + chrono_duration(FALLBACK_RATE_LIMIT_WAIT),
                wait: FALLBACK_RATE_LIMIT_WAIT,
            };
        }
    }

    let url = url.to_string();
    let error = match status {
        401 | 403 => ApiError::Unauthorized { status, url },
        404 | 410 => ApiError::NotFound { url },
        _ => ApiError::UnexpectedStatus {
            status,
            url,
            message: error_message(&response.body),
        },
    };
    Verdict::Failed(error)
}

// Reads retry-after (secondary limits) or the x-ratelimit-* pair.
// Returns None when the response carries no rate-limit signal.
fn rate_limit_wait(response: &HttpResponse, now: DateTime<Utc>) -> Option<(DateTime<Utc>, Duration)> {
    if let Some(secs) = response
        .header("retry-after")
        .and_then(|v| v.trim().parse::<u64>().ok())
    {
        let wait = Duration::from_secs(secs);
        return Some((now + chrono_duration(wait), wait));
    }

    if response.header("x-ratelimit-remaining").map(str::trim) != Some("0") {
        return None;
    }

    let reset_at = response
        .header("x-ratelimit-reset")
        .and_then(|v| v.trim().parse::<i64>().ok())
        .and_then(|epoch| DateTime::from_timestamp(epoch, 0));

    match reset_at {
        Some(reset_at) => {
            let until_reset = (reset_at - now).to_std().unwrap_or(Duration::ZERO);
            Some((reset_at, until_reset + RESET_SLACK))
        }
        None => Some((
            now + chrono_duration(FALLBACK_RATE_LIMIT_WAIT),
            FALLBACK_RATE_LIMIT_WAIT,
        )),
    }
}

fn chrono_duration(duration: Duration) -> chrono::Duration {
    chrono::Duration::from_std(duration).unwrap_or_else(|_| chrono::Duration::zero())
}

// GitHub error bodies look like {"message": "...", "documentation_url": "..."}
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| body.chars().take(200).collect())
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. Why is classify() a free function?
//    - It only looks at a response and a timestamp. Without the client or
//      the network it can be tested with plain values
//
// 2. What is Arc<dyn Transport>?
//    - A shared pointer to "some type that implements Transport". The
//      client does not know or care whether that is reqwest or a test double
//
// 3. Why compare url.origin() for Link URLs?
//    - Origin is scheme + host + port. A next link on another origin would
//      receive our Authorization header, so we refuse to follow it
// -----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::github::testing::{response, RecordingBackoff, ScriptedTransport};
    use serde_json::json;

    fn client(transport: Arc<ScriptedTransport>, backoff: Arc<RecordingBackoff>) -> GitHubClient {
        GitHubClient::new(
            "https://api.github.com",
            "secret-token",
            transport,
            RetryPolicy::new(2, backoff),
        )
    }

    fn rate_limited(reset_epoch: i64) -> HttpResponse {
        response(403, json!({"message": "API rate limit exceeded"}))
            .with_header("x-ratelimit-remaining", "0")
            .with_header("x-ratelimit-reset", &reset_epoch.to_string())
    }

    #[tokio::test]
    async fn test_attaches_bearer_token() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on("/repos/o/r", response(200, json!({"name": "r"})));
        let backoff = Arc::new(RecordingBackoff::at_epoch(1_700_000_000));

        let body = client(transport.clone(), backoff).get("/repos/o/r", &[]).await.unwrap();

        assert_eq!(body["name"], "r");
        let requests = transport.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].header("authorization"), Some("Bearer secret-token"));
    }

    #[tokio::test]
    async fn test_appends_query_parameters_in_order() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on("/repos/o/r/issues?state=all&page=1", response(200, json!([])));
        let backoff = Arc::new(RecordingBackoff::at_epoch(0));

        client(transport.clone(), backoff)
            .get("/repos/o/r/issues", &[("state", "all".to_string()), ("page", "1".to_string())])
            .await
            .unwrap();

        assert_eq!(
            transport.requests()[0].url.as_str(),
            "https://api.github.com/repos/o/r/issues?state=all&page=1"
        );
    }

    #[tokio::test]
    async fn test_rate_limited_twice_then_success() {
        let now = 1_700_000_000;
        let transport = Arc::new(ScriptedTransport::new());
        transport.on("/repos/o/r", rate_limited(now + 30));
        transport.on("/repos/o/r", rate_limited(now + 90));
        transport.on("/repos/o/r", response(200, json!({"ok": true})));
        let backoff = Arc::new(RecordingBackoff::at_epoch(now));

        let body = client(transport.clone(), backoff.clone())
            .get("/repos/o/r", &[])
            .await
            .unwrap();

        assert_eq!(body, json!({"ok": true}));
        assert_eq!(transport.requests().len(), 3);
        assert_eq!(
            backoff.waits(),
            vec![
                Duration::from_secs(30) + RESET_SLACK,
                Duration::from_secs(90) + RESET_SLACK
            ]
        );
    }

    #[tokio::test]
    async fn test_rate_limit_retries_are_bounded() {
        let now = 1_700_000_000;
        let transport = Arc::new(ScriptedTransport::new());
        for _ in 0..5 {
            transport.on("/repos/o/r", rate_limited(now + 10));
        }
        let backoff = Arc::new(RecordingBackoff::at_epoch(now));

        let err = client(transport.clone(), backoff.clone())
            .get("/repos/o/r", &[])
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::RateLimited { attempts: 3, .. }));
        assert_eq!(transport.requests().len(), 3);
        assert_eq!(backoff.waits().len(), 2);
    }

    #[tokio::test]
    async fn test_secondary_rate_limit_uses_retry_after() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(
            "/repos/o/r",
            response(429, json!({"message": "slow down"})).with_header("retry-after", "7"),
        );
        transport.on("/repos/o/r", response(200, json!({})));
        let backoff = Arc::new(RecordingBackoff::at_epoch(0));

        client(transport, backoff.clone()).get("/repos/o/r", &[]).await.unwrap();

        assert_eq!(backoff.waits(), vec![Duration::from_secs(7)]);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on("/repos/o/missing", response(404, json!({"message": "Not Found"})));
        let backoff = Arc::new(RecordingBackoff::at_epoch(0));

        let err = client(transport.clone(), backoff)
            .get("/repos/o/missing", &[])
            .await
            .unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_forbidden_without_rate_limit_headers_is_unauthorized() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on(
            "/repos/o/r",
            response(403, json!({"message": "Resource not accessible"}))
                .with_header("x-ratelimit-remaining", "4999"),
        );
        let backoff = Arc::new(RecordingBackoff::at_epoch(0));

        let err = client(transport.clone(), backoff.clone())
            .get("/repos/o/r", &[])
            .await
            .unwrap_err();

        assert_eq!(
            err,
            ApiError::Unauthorized {
                status: 403,
                url: "https://api.github.com/repos/o/r".to_string()
            }
        );
        assert!(backoff.waits().is_empty());
    }

    #[tokio::test]
    async fn test_network_error_is_propagated() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.fail("/repos/o/r", ApiError::Network("connection reset".to_string()));
        let backoff = Arc::new(RecordingBackoff::at_epoch(0));

        let err = client(transport, backoff).get("/repos/o/r", &[]).await.unwrap_err();
        assert_eq!(err, ApiError::Network("connection reset".to_string()));
    }

    #[tokio::test]
    async fn test_bare_429_waits_the_fallback() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on("/repos/o/r", response(429, json!({"message": "Too Many Requests"})));
        transport.on("/repos/o/r", response(200, json!({"ok": true})));
        let backoff = Arc::new(RecordingBackoff::at_epoch(1_700_000_000));

        let body = client(transport.clone(), backoff.clone())
            .get("/repos/o/r", &[])
            .await
            .unwrap();

        assert_eq!(body, json!({"ok": true}));
        assert_eq!(backoff.waits(), vec![FALLBACK_RATE_LIMIT_WAIT]);
        assert_eq!(transport.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_link_to_another_host_is_not_followed() {
        let transport = Arc::new(ScriptedTransport::new());
        let backoff = Arc::new(RecordingBackoff::at_epoch(0));

        let err = client(transport.clone(), backoff)
            .get_page("https://evil.example.com/repos/o/r/issues?page=2", &[])
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::ForeignUrl { .. }));
        // The token never left the process
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_link_on_api_host_is_followed() {
        let transport = Arc::new(ScriptedTransport::new());
        transport.on("/repos/o/r/issues?page=2", response(200, json!([])));
        let backoff = Arc::new(RecordingBackoff::at_epoch(0));

        let page = client(transport.clone(), backoff)
            .get_page("https://api.github.com/repos/o/r/issues?page=2", &[])
            .await
            .unwrap();

        assert_eq!(page.url, "https://api.github.com/repos/o/r/issues?page=2");
        assert_eq!(transport.requests().len(), 1);
    }

    #[test]
    fn test_classify_unexpected_status_keeps_message() {
        let resp = response(500, json!({"message": "Server Error"}));
        let verdict = classify(&resp, "https://x/y", Utc::now());
        assert_eq!(
            verdict,
            Verdict::Failed(ApiError::UnexpectedStatus {
                status: 500,
                url: "https://x/y".to_string(),
                message: "Server Error".to_string()
            })
        );
    }

    #[test]
    fn test_reset_in_the_past_waits_only_the_slack() {
        let now = DateTime::from_timestamp(1_000, 0).unwrap();
        let resp = rate_limited(900);
        let (_, wait) = rate_limit_wait(&resp, now).unwrap();
        assert_eq!(wait, RESET_SLACK);
    }
}
