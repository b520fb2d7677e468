//! Rate-limited, retrying HTTP fetcher shared by every source adapter
//!
//! Each adapter instance owns exactly one [`FetchClient`]. The client keeps a
//! single `reqwest` connection pool and cookie jar for the lifetime of the
//! adapter, so pages of one crawl reuse the same session, and everything is
//! released when the adapter is dropped.
//!
//! Features:
//! - Minimum spacing between consecutive requests with governor
//! - Randomized browser headers per request
//! - Classified retry (429 / 5xx / transport) with linear backoff
//! - Charset-aware body decoding (UTF-8, EUC-KR)

use encoding_rs::{Encoding, EUC_KR, UTF_8};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::time::Duration;
use url::Url;

use crate::config::Config;
use crate::crawler::headers::{randomized_headers, HeaderProfile};
use crate::models::JobSource;
use crate::utils::error::FetchError;
use crate::utils::retry::{AttemptFailure, RetryDecision, RetryPolicy};

/// Successful response body
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// Final request URL (query string included)
    pub url: String,

    /// HTTP status code
    pub status: u16,

    /// Decoded body text
    pub body: String,
}

/// Per-adapter HTTP session with pacing and retry
pub struct FetchClient {
    /// HTTP client with configured timeout, compression and cookie store
    client: Client,

    /// Enforces the minimum spacing between requests
    rate_limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,

    /// Minimum spacing the limiter was built with
    min_interval: Duration,

    /// Retry classification and backoff units
    retry: RetryPolicy,

    /// Base URL that relative paths are resolved against
    base_url: Option<Url>,

    /// Header set imitated on every request
    profile: HeaderProfile,
}

impl FetchClient {
    /// Create a new fetch client
    ///
    /// # Arguments
    ///
    /// * `min_interval` - Minimum spacing between two requests
    /// * `retry` - Retry policy
    /// * `timeout` - Per-request timeout
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Http` if the HTTP client cannot be created
    pub fn new(
        min_interval: Duration,
        retry: RetryPolicy,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .gzip(true)
            .cookie_store(true)
            .build()?;

        let period = min_interval.max(Duration::from_millis(1));
        let quota =
            Quota::with_period(period).unwrap_or_else(|| Quota::per_second(NonZeroU32::MIN));
        let rate_limiter = RateLimiter::direct(quota);

        Ok(Self {
            client,
            rate_limiter,
            min_interval: period,
            retry,
            base_url: None,
            profile: HeaderProfile::Document,
        })
    }

    /// Create the client for one source from the loaded configuration
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` if the configured base URL is invalid
    pub fn for_source(config: &Config, source: JobSource) -> Result<Self, FetchError> {
        let settings = config.sources.get(source);
        Self::new(
            settings.min_interval(),
            RetryPolicy::from_config(config, settings),
            config.request_timeout(),
        )?
        .with_base_url(&settings.base_url)
    }

    /// Resolve relative paths against `base_url`
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` if `base_url` cannot be parsed
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self, FetchError> {
        let parsed =
            Url::parse(base_url).map_err(|e| FetchError::InvalidUrl(format!("{base_url}: {e}")))?;
        self.base_url = Some(parsed);
        Ok(self)
    }

    /// Imitate a different kind of browser request
    #[must_use]
    pub fn with_profile(mut self, profile: HeaderProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Minimum spacing between requests
    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Retry policy in effect
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Base URL, if one was configured
    pub fn base_url(&self) -> Option<&Url> {
        self.base_url.as_ref()
    }

    /// Build an absolute URL from a path (or absolute URL) and query pairs
    ///
    /// # Errors
    ///
    /// Returns `FetchError::InvalidUrl` when the target cannot be parsed
    pub fn build_url(&self, target: &str, query: &[(&str, String)]) -> Result<Url, FetchError> {
        let mut url = match (&self.base_url, Url::parse(target)) {
            (_, Ok(absolute)) => absolute,
            (Some(base), Err(_)) => base
                .join(target)
                .map_err(|e| FetchError::InvalidUrl(format!("{target}: {e}")))?,
            (None, Err(e)) => return Err(FetchError::InvalidUrl(format!("{target}: {e}"))),
        };

        if !query.is_empty() {
            url.query_pairs_mut()
                .extend_pairs(query.iter().map(|(k, v)| (*k, v.as_str())));
        }

        Ok(url)
    }

    /// Fetch a URL with pacing and retry
    ///
    /// # Returns
    ///
    /// * `Ok(Some(page))` on a 2xx response
    /// * `Ok(None)` once every attempt failed with a retriable error
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Status` for non-retriable statuses (4xx except
    /// 429) and `FetchError::InvalidUrl` for unbuildable targets
    pub async fn fetch(
        &self,
        target: &str,
        query: &[(&str, String)],
    ) -> Result<Option<FetchedPage>, FetchError> {
        let url = self.build_url(target, query)?;

        // Wait for rate limiter
        self.rate_limiter.until_ready().await;

        let max_attempts = self.retry.max_attempts.max(1);

        for attempt in 1..=max_attempts {
            tracing::debug!(url = %url, attempt, "Fetching URL");

            let failure = match self
                .client
                .get(url.clone())
                .headers(randomized_headers(self.profile))
                .send()
                .await
            {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        match self.read_page(response).await {
                            Ok(page) => return Ok(Some(page)),
                            Err(FetchError::Http(e)) => {
                                tracing::warn!(url = %url, attempt, error = %e, "Failed to read response body");
                                AttemptFailure::Transport
                            }
                            Err(e) => return Err(e),
                        }
                    } else {
                        tracing::warn!(url = %url, attempt, status = status.as_u16(), "HTTP error");
                        AttemptFailure::Status(status.as_u16())
                    }
                }
                Err(e) => {
                    tracing::warn!(
                        url = %url,
                        attempt,
                        timeout = e.is_timeout(),
                        error = %e,
                        "Request error"
                    );
                    AttemptFailure::Transport
                }
            };

            match self.retry.decide(failure, attempt) {
                RetryDecision::Fail => {
                    if let AttemptFailure::Status(code) = failure {
                        return Err(FetchError::Status(code));
                    }
                }
                RetryDecision::Retry(delay) if attempt < max_attempts => {
                    tracing::debug!(
                        url = %url,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        "Retrying after backoff"
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::Retry(_) => {}
            }
        }

        tracing::warn!(url = %url, attempts = max_attempts, "Giving up after retries");
        Ok(None)
    }

    /// Fetch and return only the decoded body
    pub async fn fetch_text(
        &self,
        target: &str,
        query: &[(&str, String)],
    ) -> Result<Option<String>, FetchError> {
        Ok(self.fetch(target, query).await?.map(|page| page.body))
    }

    /// Fetch and deserialize a JSON body
    ///
    /// # Errors
    ///
    /// Returns `FetchError::Decode` if the body is not valid JSON for `T`
    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        target: &str,
        query: &[(&str, String)],
    ) -> Result<Option<T>, FetchError> {
        match self.fetch(target, query).await? {
            Some(page) => serde_json::from_str(&page.body)
                .map(Some)
                .map_err(|e| FetchError::Decode(format!("{}: {e}", page.url))),
            None => Ok(None),
        }
    }

    /// Read the body of a successful response
    async fn read_page(&self, response: Response) -> Result<FetchedPage, FetchError> {
        let url = response.url().to_string();
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_default();

        let bytes = response.bytes().await?;
        let body = decode_bytes(&bytes, &content_type)?;

        Ok(FetchedPage { url, status, body })
    }
}

impl Drop for FetchClient {
    fn drop(&mut self) {
        tracing::trace!(base_url = ?self.base_url.as_ref().map(Url::as_str), "Releasing fetch session");
    }
}

/// Decode bytes to a UTF-8 string
///
/// The charset named in `Content-Type` wins; otherwise UTF-8 is tried first
/// and EUC-KR is the fallback for legacy Korean pages.
///
/// # Errors
///
/// Returns `FetchError::Decode` if neither encoding decodes cleanly
pub fn decode_bytes(bytes: &[u8], content_type: &str) -> Result<String, FetchError> {
    let declared = content_type
        .to_lowercase()
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("charset=").map(|c| c.trim_matches('"').to_string()))
        .and_then(|label| Encoding::for_label(label.as_bytes()));

    if let Some(encoding) = declared {
        let (cow, _encoding, had_errors) = encoding.decode(bytes);
        if !had_errors {
            return Ok(cow.into_owned());
        }
    }

    let (cow, _encoding, had_errors) = UTF_8.decode(bytes);
    if !had_errors {
        return Ok(cow.into_owned());
    }

    let (cow, _encoding, had_errors) = EUC_KR.decode(bytes);
    if !had_errors {
        return Ok(cow.into_owned());
    }

    Err(FetchError::Decode(
        "Failed to decode content with UTF-8 or EUC-KR".to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> FetchClient {
        FetchClient::new(
            Duration::from_millis(10),
            RetryPolicy::new(3),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_decode_utf8() {
        let text = "Hello, World! 안녕하세요";
        let decoded = decode_bytes(text.as_bytes(), "text/html; charset=utf-8").unwrap();
        assert_eq!(decoded, text);
    }

    #[test]
    fn test_decode_euc_kr_declared() {
        // "안녕하세요" in EUC-KR
        let bytes: &[u8] = &[0xbe, 0xc8, 0xb3, 0xe7, 0xc7, 0xcf, 0xbc, 0xbc, 0xbf, 0xe4];
        let decoded = decode_bytes(bytes, "text/html; charset=EUC-KR").unwrap();
        assert_eq!(decoded, "안녕하세요");
    }

    #[test]
    fn test_decode_euc_kr_fallback() {
        let bytes: &[u8] = &[0xbe, 0xc8, 0xb3, 0xe7, 0xc7, 0xcf, 0xbc, 0xbc, 0xbf, 0xe4];
        let decoded = decode_bytes(bytes, "text/html").unwrap();
        assert_eq!(decoded, "안녕하세요");
    }

    #[test]
    fn test_build_url_relative_with_query() {
        let fetcher = client().with_base_url("https://www.jobkorea.co.kr").unwrap();
        let url = fetcher
            .build_url("/Search", &[("stext", "백엔드".to_string()), ("Page_No", "2".to_string())])
            .unwrap();

        assert_eq!(url.host_str(), Some("www.jobkorea.co.kr"));
        assert_eq!(url.path(), "/Search");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("stext".to_string(), "백엔드".to_string()));
        assert_eq!(pairs[1], ("Page_No".to_string(), "2".to_string()));
    }

    #[test]
    fn test_build_url_absolute_ignores_base() {
        let fetcher = client().with_base_url("https://www.jobkorea.co.kr").unwrap();
        let url = fetcher.build_url("https://example.com/x", &[]).unwrap();
        assert_eq!(url.as_str(), "https://example.com/x");
    }

    #[test]
    fn test_build_url_relative_without_base_fails() {
        let result = client().build_url("/Search", &[]);
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }

    #[test]
    fn test_for_source_uses_config() {
        let config = Config::default();
        let fetcher = FetchClient::for_source(&config, JobSource::LinkedIn).unwrap();
        assert_eq!(fetcher.min_interval(), Duration::from_secs(3));
        assert_eq!(fetcher.retry_policy().max_attempts, 2);
        assert_eq!(
            fetcher.base_url().map(Url::as_str),
            Some("https://www.linkedin.com/")
        );
    }

    #[test]
    fn test_invalid_base_url() {
        let result = client().with_base_url("::not a url");
        assert!(matches!(result, Err(FetchError::InvalidUrl(_))));
    }
}
