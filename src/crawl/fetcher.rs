//! Single-request HTTP access with fixed-delay retry

use super::rate_limiter::QuotaSnapshot;
use chrono::DateTime;
use core::fmt::{Display, Formatter};
use core::time::Duration;
use layered::{Execute, Service, Stack};
use regex::Regex;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, LINK};
use seatbelt::retry::{Backoff, Retry};
use seatbelt::{RecoveryInfo, ResilienceContext};
use serde_json::Value;
use std::sync::LazyLock;
use tick::Clock;
use url::Url;

const LOG_TARGET: &str = "   fetcher";

/// Upper bound for a single request, independent of the retry policy.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Media type that makes the API include repository topics.
const API_MEDIA_TYPE: &str = "application/vnd.github.mercy-preview+json";

pub(super) const TOKEN_HINT: &str =
    "Note: set a GitHub access token with --github-token or the GITHUB_TOKEN environment variable to raise the API request allowance.";

static LAST_PAGE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]page=(\d+)").expect("invalid regex pattern"));

/// How failed requests are repeated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// HTTP statuses treated as transient.
    pub statuses: Vec<u16>,

    /// Fixed pause before each retry.
    pub delay: Duration,

    /// Retries on top of the first attempt.
    pub max_retries: u32,
}

impl RetryPolicy {
    fn is_retryable(&self, status: StatusCode) -> bool {
        self.statuses.contains(&status.as_u16())
    }
}

/// Why a fetch produced no usable body.
#[derive(Debug)]
pub enum FetchError {
    /// The resource does not exist (HTTP 404 or 410).
    Missing { url: Url, status: StatusCode },

    /// The server refused the request with another non-retryable status, such as 401 for a bad token.
    Rejected { url: Url, status: StatusCode },

    /// The body could not be decoded or lacked an expected element.
    Malformed { url: Url, source: serde_json::Error },

    /// Transient failures persisted past the retry budget.
    Exhausted { url: Url, attempts: u32 },
}

impl FetchError {
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing { .. })
    }

    #[must_use]
    pub const fn url(&self) -> &Url {
        match self {
            Self::Missing { url, .. } | Self::Rejected { url, .. } | Self::Malformed { url, .. } | Self::Exhausted { url, .. } => url,
        }
    }

    fn from_status(url: Url, status: StatusCode) -> Self {
        if matches!(status, StatusCode::NOT_FOUND | StatusCode::GONE) {
            Self::Missing { url, status }
        } else {
            Self::Rejected { url, status }
        }
    }
}

impl Display for FetchError {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Missing { url, status } => write!(f, "'{url}' is not available (HTTP {status})"),
            Self::Rejected { url, status } => write!(f, "request for '{url}' was refused (HTTP {status})"),
            Self::Malformed { url, source } => write!(f, "unexpected response body from '{url}': {source}"),
            Self::Exhausted { url, attempts } => write!(f, "giving up on '{url}' after {attempts} attempts"),
        }
    }
}

impl core::error::Error for FetchError {
    fn source(&self) -> Option<&(dyn core::error::Error + 'static)> {
        match self {
            Self::Malformed { source, .. } => Some(source),
            Self::Missing { .. } | Self::Rejected { .. } | Self::Exhausted { .. } => None,
        }
    }
}

/// A decoded response.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub url: Url,

    /// `Value::Null` when the body was blank.
    pub body: Value,

    /// A `rel="next"` link was present.
    pub has_more_pages: bool,

    /// Page number of the `rel="last"` link; 1 without one, 0 for an empty body.
    pub total_page_count: u64,

    pub quota: Option<QuotaSnapshot>,
}

#[derive(Debug)]
struct RawResponse {
    headers: HeaderMap,
    text: String,
}

/// Why a single attempt failed.
#[derive(Debug)]
enum AttemptError {
    /// Worth another try, with a description for the retry notice.
    Transient(String),

    /// Final answer from the server.
    Status(StatusCode),
}

type AttemptResult = Result<RawResponse, AttemptError>;

fn classify_attempt(result: &AttemptResult) -> RecoveryInfo {
    match result {
        Err(AttemptError::Transient(_)) => RecoveryInfo::retry(),
        Ok(_) | Err(AttemptError::Status(_)) => RecoveryInfo::never(),
    }
}

/// Issues GET requests with the configured retry policy.
///
/// API headers, including the access token, go only to URLs under the API base so raw file downloads
/// never see the credential.
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: reqwest::Client,
    api_base: Url,
    token: Option<HeaderValue>,
    retry: RetryPolicy,
}

impl Fetcher {
    pub fn new(token: Option<&str>, api_base: Url, retry: RetryPolicy) -> crate::Result<Self> {
        let token = match token {
            Some(t) => {
                let mut auth_val = HeaderValue::from_str(&format!("token {t}"))?;
                auth_val.set_sensitive(true);
                Some(auth_val)
            }
            None => None,
        };

        let client = reqwest::Client::builder()
            .user_agent("inoliblist")
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            api_base,
            token,
            retry,
        })
    }

    /// Fetch `url` and decode its body as JSON.
    pub async fn fetch(&self, url: &Url) -> Result<FetchResult, FetchError> {
        let url = normalize_url(url);
        let response = self.send_with_retry(&url).await?;

        let body = if response.text.trim().is_empty() {
            Value::Null
        } else {
            serde_json::from_str(&response.text).map_err(|source| FetchError::Malformed {
                url: url.clone(),
                source,
            })?
        };

        let (has_more_pages, total_page_count) = if is_empty_value(&body) {
            (false, 0)
        } else {
            page_info(&response.headers)
        };

        Ok(FetchResult {
            quota: quota_from_headers(&response.headers),
            url,
            body,
            has_more_pages,
            total_page_count,
        })
    }

    /// Fetch `url` and return the body as text.
    pub async fn fetch_text(&self, url: &Url) -> Result<String, FetchError> {
        let url = normalize_url(url);
        Ok(self.send_with_retry(&url).await?.text)
    }

    fn targets_api(&self, url: &Url) -> bool {
        url.as_str().starts_with(self.api_base.as_str())
    }

    async fn send_with_retry(&self, url: &Url) -> Result<RawResponse, FetchError> {
        let clock = Clock::new_tokio();
        let context = ResilienceContext::new(&clock).name("github_get");
        let attempts = self.retry.max_retries.saturating_add(1);

        let fetcher = self.clone();
        let service = (
            Retry::layer("retry", &context)
                .clone_input()
                .recovery_with(|result: &AttemptResult, _| classify_attempt(result))
                .max_retry_attempts(self.retry.max_retries)
                .base_delay(self.retry.delay)
                .backoff(Backoff::Constant)
                .on_retry(move |output, args| {
                    if let Err(AttemptError::Transient(problem)) = output {
                        eprintln!(
                            "Temporary error ({problem}), retrying after {} seconds (attempt {} of {attempts})",
                            args.retry_delay().as_secs(),
                            args.attempt().index() + 1,
                        );
                    }
                }),
            Execute::new(move |url: Url| {
                let fetcher = fetcher.clone();
                async move { fetcher.attempt(&url).await }
            }),
        )
            .into_service();

        match service.execute(url.clone()).await {
            Ok(response) => Ok(response),
            Err(AttemptError::Status(status)) => Err(FetchError::from_status(url.clone(), status)),
            Err(AttemptError::Transient(problem)) => {
                log::warn!(target: LOG_TARGET, "Giving up on '{url}': {problem}");
                Err(FetchError::Exhausted {
                    url: url.clone(),
                    attempts,
                })
            }
        }
    }

    async fn attempt(&self, url: &Url) -> AttemptResult {
        log::debug!(target: LOG_TARGET, "Opening '{url}'");

        let mut request = self.client.get(url.clone());
        if self.targets_api(url) {
            request = request.header(ACCEPT, API_MEDIA_TYPE);
            if let Some(token) = &self.token {
                request = request.header(AUTHORIZATION, token.clone());
            }
        }

        let resp = request
            .send()
            .await
            .map_err(|e| AttemptError::Transient(format!("request for '{url}' failed: {e}")))?;

        let status = resp.status();
        if status.is_success() {
            let headers = resp.headers().clone();
            let bytes = resp
                .bytes()
                .await
                .map_err(|e| AttemptError::Transient(format!("failed to read the response body of '{url}': {e}")))?;

            return Ok(RawResponse {
                headers,
                text: String::from_utf8_lossy(&bytes).into_owned(),
            });
        }

        if self.retry.is_retryable(status) {
            if status == StatusCode::FORBIDDEN && self.token.is_none() {
                eprintln!("{TOKEN_HINT}");
            }
            return Err(AttemptError::Transient(format!("HTTP {status} from '{url}'")));
        }

        Err(AttemptError::Status(status))
    }
}

/// Collapse repeated slashes in the path of `url`.
#[must_use]
pub fn normalize_url(url: &Url) -> Url {
    if !url.path().contains("//") {
        return url.clone();
    }

    let mut path = String::with_capacity(url.path().len());
    let mut previous_slash = false;
    for c in url.path().chars() {
        if c == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        path.push(c);
    }

    let mut normalized = url.clone();
    normalized.set_path(&path);
    normalized
}

fn is_empty_value(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        Value::String(s) => s.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Extract `has_more_pages` and `total_page_count` from the `Link` header.
fn page_info(headers: &HeaderMap) -> (bool, u64) {
    let Some(link) = headers.get(LINK).and_then(|h| h.to_str().ok()) else {
        return (false, 1);
    };

    let mut has_next = false;
    let mut last_page = 1;

    for part in link.split(',') {
        if part.contains(r#"rel="next""#) {
            has_next = true;
        } else if part.contains(r#"rel="last""#)
            && let Some(page) = LAST_PAGE_REGEX
                .captures(part)
                .and_then(|caps| caps.get(1))
                .and_then(|m| m.as_str().parse::<u64>().ok())
        {
            last_page = page;
        }
    }

    (has_next, last_page)
}

fn quota_from_headers(headers: &HeaderMap) -> Option<QuotaSnapshot> {
    let header_u64 = |name: &str| headers.get(name)?.to_str().ok()?.parse::<u64>().ok();

    let remaining = header_u64("x-ratelimit-remaining")?;
    let reset_timestamp = headers.get("x-ratelimit-reset")?.to_str().ok()?.parse::<i64>().ok()?;
    let reset_at = DateTime::from_timestamp(reset_timestamp, 0)?;

    Some(QuotaSnapshot {
        limit: header_u64("x-ratelimit-limit"),
        remaining,
        reset_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn headers_with_link(link: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let _ = headers.insert(LINK, HeaderValue::from_str(link).unwrap());
        headers
    }

    #[test]
    fn test_normalize_url_collapses_slashes() {
        let url = Url::parse("https://api.github.com/repos//owner///repo/contents/").unwrap();
        assert_eq!(
            normalize_url(&url).as_str(),
            "https://api.github.com/repos/owner/repo/contents/"
        );
    }

    #[test]
    fn test_normalize_url_keeps_query() {
        let url = Url::parse("https://api.github.com//search/repositories?q=a%20b&page=2").unwrap();
        let normalized = normalize_url(&url);
        assert_eq!(normalized.path(), "/search/repositories");
        assert_eq!(normalized.query(), Some("q=a%20b&page=2"));
    }

    #[test]
    fn test_normalize_url_leaves_clean_url_alone() {
        let url = Url::parse("https://raw.githubusercontent.com/o/r/main/My%20Lib/library.json").unwrap();
        assert_eq!(normalize_url(&url), url);
    }

    #[test]
    fn test_page_info_next_and_last() {
        let headers = headers_with_link(
            r#"<https://api.github.com/repositories/1/contributors?per_page=1&page=2>; rel="next", <https://api.github.com/repositories/1/contributors?per_page=1&page=42>; rel="last""#,
        );
        assert_eq!(page_info(&headers), (true, 42));
    }

    #[test]
    fn test_page_info_last_page_reached() {
        let headers = headers_with_link(
            r#"<https://api.github.com/search/repositories?q=x&page=1>; rel="first", <https://api.github.com/search/repositories?q=x&page=2>; rel="prev""#,
        );
        assert_eq!(page_info(&headers), (false, 1));
    }

    #[test]
    fn test_page_info_without_link() {
        assert_eq!(page_info(&HeaderMap::new()), (false, 1));
    }

    #[test]
    fn test_last_page_does_not_match_per_page() {
        let headers = headers_with_link(r#"<https://api.github.com/x?per_page=100&page=3>; rel="last""#);
        assert_eq!(page_info(&headers), (false, 3));
    }

    #[test]
    fn test_empty_values() {
        assert!(is_empty_value(&Value::Null));
        assert!(is_empty_value(&json!([])));
        assert!(is_empty_value(&json!({})));
        assert!(is_empty_value(&json!("")));
        assert!(!is_empty_value(&json!([1])));
        assert!(!is_empty_value(&json!(0)));
        assert!(!is_empty_value(&json!(false)));
    }

    #[test]
    fn test_quota_from_headers() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert("x-ratelimit-remaining", HeaderValue::from_static("29"));
        let _ = headers.insert("x-ratelimit-reset", HeaderValue::from_static("1700000000"));
        let _ = headers.insert("x-ratelimit-limit", HeaderValue::from_static("30"));

        let quota = quota_from_headers(&headers).unwrap();
        assert_eq!(quota.remaining, 29);
        assert_eq!(quota.limit, Some(30));
        assert_eq!(quota.reset_at.timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_quota_requires_remaining_and_reset() {
        let mut headers = HeaderMap::new();
        let _ = headers.insert("x-ratelimit-remaining", HeaderValue::from_static("29"));
        assert!(quota_from_headers(&headers).is_none());
    }

    #[test]
    fn test_retry_policy_statuses() {
        let policy = RetryPolicy {
            statuses: vec![403, 502, 503],
            delay: Duration::ZERO,
            max_retries: 5,
        };
        assert!(policy.is_retryable(StatusCode::FORBIDDEN));
        assert!(policy.is_retryable(StatusCode::SERVICE_UNAVAILABLE));
        assert!(!policy.is_retryable(StatusCode::NOT_FOUND));
        assert!(!policy.is_retryable(StatusCode::INTERNAL_SERVER_ERROR));
    }

    #[test]
    fn test_not_found_statuses_are_missing() {
        let url = Url::parse("https://api.github.com/repos/octo/gone").unwrap();
        assert!(FetchError::from_status(url.clone(), StatusCode::NOT_FOUND).is_missing());
        assert!(FetchError::from_status(url, StatusCode::GONE).is_missing());
    }

    #[test]
    fn test_other_statuses_are_rejected() {
        let url = Url::parse("https://api.github.com/repos/octo/blink").unwrap();
        for status in [StatusCode::UNAUTHORIZED, StatusCode::UNPROCESSABLE_ENTITY, StatusCode::INTERNAL_SERVER_ERROR] {
            let err = FetchError::from_status(url.clone(), status);
            assert!(matches!(err, FetchError::Rejected { status: s, .. } if s == status), "{err}");
            assert!(!err.is_missing());
        }
    }
}
