//! Retrieval of documentation pages.
//!
//! A [`Retriever`] never fails: every outcome, including transport failure,
//! is reported in the [`FetchResponse`] so the query pipeline can tell a
//! missing page (404) from an unreachable origin (status 0).

use std::thread;
use std::time::Duration;

use reqwest::StatusCode;
use reqwest::blocking::Client;
use reqwest::header::CONTENT_TYPE;
use tracing::{debug, info, warn};

use crate::charset::decode_markup;
use crate::{Error, Result};

/// Status reported when no HTTP response was received.
pub const TRANSPORT_FAILURE: u16 = 0;

/// Outcome of one [`Retriever::fetch`] call, retries included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    /// HTTP status of the last attempt, or [`TRANSPORT_FAILURE`].
    pub status: u16,
    /// Body of a successful response.
    pub markup: Option<String>,
    /// Attempts made, at least one.
    pub attempts: u32,
    /// Cause of the last failed attempt.
    pub error: Option<String>,
}

impl FetchResponse {
    /// A successful response carrying `markup`.
    #[must_use]
    pub fn ok(markup: impl Into<String>) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            markup: Some(markup.into()),
            attempts: 1,
            error: None,
        }
    }

    /// A response with `status` and no body.
    #[must_use]
    pub const fn status(status: u16) -> Self {
        Self {
            status,
            markup: None,
            attempts: 1,
            error: None,
        }
    }

    /// Whether the origin reported the page as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        self.status == 404
    }

    /// Whether the response is usable markup.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status) && self.markup.is_some()
    }

    /// Short description of why the fetch failed.
    #[must_use]
    pub fn failure_reason(&self) -> String {
        match (&self.error, self.status) {
            (Some(error), TRANSPORT_FAILURE) => error.clone(),
            (None, TRANSPORT_FAILURE) => "no response".to_string(),
            (_, status) => format!("HTTP status {status}"),
        }
    }
}

/// Source of raw page markup.
pub trait Retriever {
    /// Retrieve `locator`.
    fn fetch(&self, locator: &str) -> FetchResponse;
}

impl<T: Retriever + ?Sized> Retriever for &T {
    fn fetch(&self, locator: &str) -> FetchResponse {
        (**self).fetch(locator)
    }
}

/// Retry budget and backoff for transient failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    /// Delay after the first failed attempt.
    pub backoff_base: Duration,
    /// Upper bound for any single delay.
    pub backoff_max: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            backoff_base: Duration::from_secs(1),
            backoff_max: Duration::from_secs(8),
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `retry` (zero-based): `base * 2^retry`,
    /// capped at `backoff_max`.
    #[must_use]
    pub fn backoff_delay(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry).unwrap_or(u32::MAX);
        self.backoff_base
            .checked_mul(factor)
            .map_or(self.backoff_max, |delay| delay.min(self.backoff_max))
    }
}

/// Whether a status is worth retrying.
#[must_use]
pub fn is_retryable_status(status: u16) -> bool {
    status == 429 || (500..=599).contains(&status)
}

/// Blocking HTTP retriever with bounded retries.
#[derive(Debug, Clone)]
pub struct HttpRetriever {
    client: Client,
    policy: RetryPolicy,
}

impl HttpRetriever {
    /// Create a retriever with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Network`] if the HTTP client cannot be built.
    pub fn new(timeout: Duration, policy: RetryPolicy) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dtsdoc/", env!("CARGO_PKG_VERSION")))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(Error::Network)?;
        Ok(Self { client, policy })
    }

    fn attempt(&self, locator: &str) -> std::result::Result<(u16, Option<String>), String> {
        let response = self.client.get(locator).send().map_err(|e| e.to_string())?;
        let status = response.status();
        if status.is_success() {
            let content_type = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_owned);
            let body = response.bytes().map_err(|e| e.to_string())?;
            Ok((status.as_u16(), Some(decode_markup(&body, content_type.as_deref()))))
        } else {
            Ok((status.as_u16(), None))
        }
    }
}

impl Retriever for HttpRetriever {
    fn fetch(&self, locator: &str) -> FetchResponse {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut last = FetchResponse::status(TRANSPORT_FAILURE);

        for attempt in 1..=max_attempts {
            debug!("GET {locator} (attempt {attempt}/{max_attempts})");
            last = match self.attempt(locator) {
                Ok((status, markup)) => FetchResponse {
                    status,
                    markup,
                    attempts: attempt,
                    error: None,
                },
                Err(error) => FetchResponse {
                    status: TRANSPORT_FAILURE,
                    markup: None,
                    attempts: attempt,
                    error: Some(error),
                },
            };

            let transient =
                last.status == TRANSPORT_FAILURE || is_retryable_status(last.status);
            if !transient {
                if last.is_success() {
                    info!(
                        "fetched {} bytes from {locator}",
                        last.markup.as_ref().map_or(0, String::len)
                    );
                }
                return last;
            }

            if attempt < max_attempts {
                let delay = self.policy.backoff_delay(attempt - 1);
                warn!(
                    "transient failure fetching {locator} ({}), retrying in {}ms",
                    last.failure_reason(),
                    delay.as_millis()
                );
                thread::sleep(delay);
            }
        }

        warn!(
            "giving up on {locator} after {} attempts: {}",
            last.attempts,
            last.failure_reason()
        );
        last
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fast_policy(max_attempts: u32) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff_base: Duration::from_millis(1),
            backoff_max: Duration::from_millis(5),
        }
    }

    async fn fetch_blocking(url: String, policy: RetryPolicy) -> FetchResponse {
        tokio::task::spawn_blocking(move || {
            let retriever = HttpRetriever::new(Duration::from_secs(5), policy).unwrap();
            retriever.fetch(&url)
        })
        .await
        .unwrap()
    }

    #[test]
    fn test_backoff_delay_doubles_and_caps() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff_delay(0), Duration::from_secs(1));
        assert_eq!(policy.backoff_delay(1), Duration::from_secs(2));
        assert_eq!(policy.backoff_delay(2), Duration::from_secs(4));
        assert_eq!(policy.backoff_delay(3), Duration::from_secs(8));
        assert_eq!(policy.backoff_delay(10), Duration::from_secs(8));
        assert_eq!(policy.backoff_delay(40), Duration::from_secs(8));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(429));
        assert!(is_retryable_status(500));
        assert!(is_retryable_status(503));
        assert!(!is_retryable_status(404));
        assert!(!is_retryable_status(403));
        assert!(!is_retryable_status(200));
    }

    #[test]
    fn test_failure_reason() {
        assert_eq!(FetchResponse::status(503).failure_reason(), "HTTP status 503");
        assert_eq!(FetchResponse::status(TRANSPORT_FAILURE).failure_reason(), "no response");
        assert!(FetchResponse::ok("x").is_success());
        assert!(FetchResponse::status(404).is_not_found());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_fetch_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Marker.html"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<h1>Marker</h1>"))
            .expect(1)
            .mount(&server)
            .await;

        let response = fetch_blocking(format!("{}/Marker.html", server.uri()), fast_policy(3)).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.markup.as_deref(), Some("<h1>Marker</h1>"));
        assert_eq!(response.attempts, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let response = fetch_blocking(format!("{}/Nope.html", server.uri()), fast_policy(4)).await;
        assert!(response.is_not_found());
        assert!(response.markup.is_none());
        assert_eq!(response.attempts, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_server_errors_are_retried_until_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_string("ok"))
            .mount(&server)
            .await;

        let response = fetch_blocking(format!("{}/Marker.html", server.uri()), fast_policy(4)).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.attempts, 3);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_retry_budget_is_bounded() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let response = fetch_blocking(format!("{}/Marker.html", server.uri()), fast_policy(3)).await;
        assert_eq!(response.status, 500);
        assert_eq!(response.attempts, 3);
        assert!(!response.is_success());
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_declared_gbk_page_is_decoded() {
        let server = MockServer::start().await;
        let mut body = b"<h1>".to_vec();
        body.extend_from_slice(&[0xB1, 0xEA, 0xBC, 0xC7]);
        body.extend_from_slice(b"</h1>");
        Mock::given(method("GET"))
            .and(path("/Marker.html"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html; charset=gbk"))
            .mount(&server)
            .await;

        let response = fetch_blocking(format!("{}/Marker.html", server.uri()), fast_policy(1)).await;
        assert_eq!(response.markup.as_deref(), Some("<h1>标记</h1>"));
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_undeclared_gbk_page_is_sniffed() {
        let text = "<h1 class=\"page-title\">Class: Marker</h1>\
            <div class=\"class-description\">标记图层用于在三维场景中添加点标注，\
            每个标注可以包含文字和图片。通过添加方法可以一次添加一个或多个标注，\
            通过删除方法可以按编号移除标注，清空方法会移除图层中的全部标注。</div>";
        let (body, _, _) = encoding_rs::GBK.encode(text);
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/Marker.html"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.into_owned()))
            .mount(&server)
            .await;

        let response = fetch_blocking(format!("{}/Marker.html", server.uri()), fast_policy(1)).await;
        assert_eq!(response.markup.as_deref(), Some(text));
    }

    #[test]
    fn test_unreachable_origin_is_transport_failure() {
        let retriever = HttpRetriever::new(Duration::from_secs(2), fast_policy(2)).unwrap();
        let response = retriever.fetch("http://127.0.0.1:1/Marker.html");
        assert_eq!(response.status, TRANSPORT_FAILURE);
        assert!(response.markup.is_none());
        assert_eq!(response.attempts, 2);
        assert!(response.error.is_some());
    }
}
