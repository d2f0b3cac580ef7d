//! Authenticated HTTP fetch collaborator.
//!
//! Every REST call in this crate goes through [`ApiClient::fetch_api_response`],
//! which normalizes the outcome into an [`ApiResponse`]: either the parsed
//! JSON body, or a human-readable error message, never both. Authentication
//! is a bearer token supplied by the caller; acquiring and refreshing
//! credentials is outside this library.

use std::time::Duration;

use rand::Rng;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;
use tracing::{debug, info};

use crate::constants::{INITIAL_BACKOFF, MAX_ATTEMPTS, MAX_BACKOFF};
use crate::error::MigrationError;

use super::endpoints::Endpoints;

/// The uniform outcome of every HTTP call in this layer.
///
/// Exactly one of `json` / `error_msg` is set on success vs failure; both
/// may be empty for "no data, no error" responses.
#[derive(Debug, Clone, Default)]
pub struct ApiResponse {
    /// Parsed response body, when the call succeeded.
    pub json: Option<Value>,
    /// Human-readable failure description, when it did not.
    pub error_msg: Option<String>,
}

impl ApiResponse {
    /// True when the call failed.
    pub fn is_error(&self) -> bool {
        self.error_msg.is_some()
    }

    /// Reads a string field off the response body, if present.
    pub fn json_str(&self, field: &str) -> Option<&str> {
        self.json.as_ref()?.get(field)?.as_str()
    }

    fn success(json: Value) -> Self {
        Self {
            json: Some(json),
            error_msg: None,
        }
    }

    fn failure(json: Option<Value>, error_msg: impl Into<String>) -> Self {
        Self {
            json,
            error_msg: Some(error_msg.into()),
        }
    }
}

/// Retry bounds for transient failures (HTTP 429/5xx and transport errors).
///
/// The defaults mirror the production values; tests override them with
/// millisecond delays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: MAX_ATTEMPTS,
            initial_backoff: INITIAL_BACKOFF,
            max_backoff: MAX_BACKOFF,
        }
    }
}

impl RetrySettings {
    /// Settings with near-zero delays, for tests.
    pub fn immediate() -> Self {
        Self {
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
            ..Self::default()
        }
    }
}

/// Authenticated client for the Google Cloud REST APIs.
///
/// Cheap to clone; the underlying `reqwest::Client` is reference-counted.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    token: String,
    user_project: String,
    endpoints: Endpoints,
    retry: RetrySettings,
}

impl ApiClient {
    /// Creates a client billing quota to `user_project` and authenticating
    /// with the given bearer token.
    pub fn new(
        token: impl Into<String>,
        user_project: impl Into<String>,
    ) -> Result<Self, MigrationError> {
        let http = Client::builder().build()?;
        Ok(Self {
            http,
            token: token.into(),
            user_project: user_project.into(),
            endpoints: Endpoints::default(),
            retry: RetrySettings::default(),
        })
    }

    /// Overrides the service base URLs (mock servers in tests).
    #[must_use]
    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Overrides the retry bounds.
    #[must_use]
    pub fn with_retry(mut self, retry: RetrySettings) -> Self {
        self.retry = retry;
        self
    }

    /// The service base URLs this client targets.
    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// The project billed for quota.
    pub fn user_project(&self) -> &str {
        &self.user_project
    }

    pub(crate) fn http(&self) -> &Client {
        &self.http
    }

    pub(crate) fn bearer_token(&self) -> &str {
        &self.token
    }

    /// Performs one REST call, retrying transient failures, and normalizes
    /// the outcome.
    ///
    /// ## Retry strategy
    ///
    /// HTTP 429 and 5xx responses and transport-level errors are retried
    /// with exponential backoff plus jitter, up to
    /// [`RetrySettings::max_attempts`]; the last failure is then reported
    /// through `error_msg`. Client errors (4xx other than 429) are returned
    /// immediately with the message from the error body.
    pub async fn fetch_api_response(
        &self,
        method: Method,
        url: &str,
        request_body: Option<Value>,
    ) -> ApiResponse {
        let context = format!("[{method} {url}]");
        debug!("{context} Starting API call with user_project={}", self.user_project);

        let mut backoff = self.retry.initial_backoff;
        let mut last_error = String::new();

        for attempt in 1..=self.retry.max_attempts {
            let mut request = self
                .http
                .request(method.clone(), url)
                .header("Content-Type", "application/json")
                .header("Authorization", format!("Bearer {}", self.token))
                .header("X-Goog-User-Project", &self.user_project);
            if let Some(body) = &request_body {
                request = request.json(body);
            }

            let response = match request.send().await {
                Ok(response) => response,
                Err(err) => {
                    last_error = format!("{method} call to {url} returned: {err}");
                    debug!("{context} Transport error: {err}. Retrying in {backoff:?}...");
                    backoff = sleep_with_backoff(backoff, self.retry.max_backoff).await;
                    continue;
                }
            };

            let status = response.status();
            let text = match response.text().await {
                Ok(text) => text,
                Err(err) => {
                    last_error = format!("{method} call to {url} returned: {err}");
                    backoff = sleep_with_backoff(backoff, self.retry.max_backoff).await;
                    continue;
                }
            };
            debug!("{context} Response status: {status}");

            let data: Value = match serde_json::from_str(&text) {
                Ok(data) => data,
                Err(_) => {
                    if status.is_success() || !is_transient(status) {
                        return ApiResponse::failure(None, "Call returned non-valid JSON.");
                    }
                    last_error = "Call returned non-valid JSON.".to_string();
                    backoff = sleep_with_backoff(backoff, self.retry.max_backoff).await;
                    continue;
                }
            };

            if status.is_success() {
                return ApiResponse::success(data);
            }

            let error_msg = extract_error_message(&data)
                .unwrap_or_else(|| format!("Call returned HTTP {}.", status.as_u16()));

            if is_transient(status) && attempt < self.retry.max_attempts {
                info!("{context} Retrying in {backoff:?} due to transient error...");
                last_error = error_msg;
                backoff = sleep_with_backoff(backoff, self.retry.max_backoff).await;
                continue;
            }

            debug!("{context} Bad response: {error_msg}");
            return ApiResponse::failure(Some(data), error_msg);
        }

        ApiResponse::failure(None, last_error)
    }
}

/// Whether an HTTP status warrants a retry.
fn is_transient(status: StatusCode) -> bool {
    status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS
}

/// Pulls the `error.message` field out of a Google API error body.
fn extract_error_message(data: &Value) -> Option<String> {
    let message = data.get("error")?.get("message")?.as_str()?;
    Some(message.to_string())
}

/// Sleeps for `backoff` plus jitter and returns the next (doubled) delay.
async fn sleep_with_backoff(backoff: Duration, max_backoff: Duration) -> Duration {
    let jitter = Duration::from_millis(rand::thread_rng().gen_range(0..500));
    tokio::time::sleep(backoff + jitter.min(backoff)).await;
    (backoff * 2).min(max_backoff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(server: &MockServer) -> ApiClient {
        ApiClient::new("test-token", "billing-project")
            .expect("client should build")
            .with_endpoints(Endpoints::with_mock_base(&server.uri()))
            .with_retry(RetrySettings::immediate())
    }

    #[tokio::test]
    async fn success_returns_json_without_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/thing"))
            .and(header("X-Goog-User-Project", "billing-project"))
            .and(header("Authorization", "Bearer test-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "projects/p/thing"
            })))
            .mount(&server)
            .await;

        let api = test_client(&server);
        let response = api
            .fetch_api_response(Method::GET, &format!("{}/thing", server.uri()), None)
            .await;

        assert!(!response.is_error());
        assert_eq!(response.json_str("name"), Some("projects/p/thing"));
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": {"code": 404, "message": "Entry not found.", "status": "NOT_FOUND"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let api = test_client(&server);
        let response = api
            .fetch_api_response(Method::GET, &format!("{}/missing", server.uri()), None)
            .await;

        assert_eq!(response.error_msg.as_deref(), Some("Entry not found."));
        assert!(response.json.is_some());
    }

    #[tokio::test]
    async fn server_error_is_retried_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": {"code": 500, "message": "backend error", "status": "INTERNAL"}
            })))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/flaky"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"ok": true})))
            .mount(&server)
            .await;

        let api = test_client(&server);
        let response = api
            .fetch_api_response(Method::GET, &format!("{}/flaky", server.uri()), None)
            .await;

        assert!(!response.is_error());
        assert_eq!(
            response.json.and_then(|j| j.get("ok").cloned()),
            Some(Value::Bool(true))
        );
    }

    #[tokio::test]
    async fn non_json_body_reports_fixed_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let api = test_client(&server);
        let response = api
            .fetch_api_response(Method::GET, &format!("{}/html", server.uri()), None)
            .await;

        assert_eq!(
            response.error_msg.as_deref(),
            Some("Call returned non-valid JSON.")
        );
        assert!(response.json.is_none());
    }

    #[tokio::test]
    async fn retries_are_bounded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/always-busy"))
            .respond_with(ResponseTemplate::new(429).set_body_json(serde_json::json!({
                "error": {"code": 429, "message": "Quota exceeded.", "status": "RESOURCE_EXHAUSTED"}
            })))
            .mount(&server)
            .await;

        let api = test_client(&server);
        let response = api
            .fetch_api_response(Method::GET, &format!("{}/always-busy", server.uri()), None)
            .await;

        assert_eq!(response.error_msg.as_deref(), Some("Quota exceeded."));
    }

    #[tokio::test]
    async fn post_sends_request_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/create"))
            .and(wiremock::matchers::body_partial_json(
                serde_json::json!({"displayName": "Finance"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
            .mount(&server)
            .await;

        let api = test_client(&server);
        let response = api
            .fetch_api_response(
                Method::POST,
                &format!("{}/create", server.uri()),
                Some(serde_json::json!({"displayName": "Finance"})),
            )
            .await;

        assert!(!response.is_error());
    }
}
