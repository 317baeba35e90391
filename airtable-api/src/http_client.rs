//! HttpClient middleware used by AirtableClient
//!
//! Responsible for
//!  - handling all HTTP api requests
//!  - logging/tracing
//!  - request pacing (minimum inter-request delay)
//!  - mandatory wait-and-retry on 429 rate limit responses
//!
//! The 429 retry is deliberately unbounded: Airtable documents a fixed
//! 30 second penalty window after which requests succeed again, so
//! retrying until the window clears is always the right behavior for a
//! long-running import.

use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use std::time::Duration;

use reqwest::{StatusCode, header::HeaderMap};
use serde::de::DeserializeOwned;
use snafu::prelude::*;
use tracing::{debug, error, trace, warn};

use crate::{Result, error::AirtableError, error::HttpSnafu, limiter::RateLimiter};

/// HTTP metrics tracked using atomic counters for thread-safe access.
/// Counters are cumulative and never reset during the client's lifetime.
#[derive(Debug, Default)]
pub struct HttpMetrics {
    /// Total number of HTTP requests sent to the server
    total_requests: AtomicU64,
    /// Total number of successful responses (2xx status codes)
    successful_responses: AtomicU64,
    /// Total number of error responses (non-2xx, excluding rate limit)
    errors: AtomicU64,
    /// Total number of 429 responses received
    rate_limit_errors: AtomicU64,
    /// Total seconds spent waiting for rate limit backoff
    rate_limit_delay_secs: AtomicU64,
}

impl HttpMetrics {
    /// Returns a snapshot of current metrics as plain u64 values
    pub fn snapshot(&self) -> HttpMetricsSnapshot {
        HttpMetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_responses: self.successful_responses.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            rate_limit_errors: self.rate_limit_errors.load(Ordering::Relaxed),
            rate_limit_delay_secs: self.rate_limit_delay_secs.load(Ordering::Relaxed),
        }
    }

    fn increment_requests(&self) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_success(&self) {
        self.successful_responses.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_errors(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    fn increment_rate_limit_errors(&self) {
        self.rate_limit_errors.fetch_add(1, Ordering::Relaxed);
    }

    fn add_rate_limit_delay(&self, secs: u64) {
        self.rate_limit_delay_secs
            .fetch_add(secs, Ordering::Relaxed);
    }
}

/// A point-in-time snapshot of HTTP metrics with plain u64 values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HttpMetricsSnapshot {
    pub total_requests: u64,
    pub successful_responses: u64,
    pub errors: u64,
    pub rate_limit_errors: u64,
    pub rate_limit_delay_secs: u64,
}

impl std::fmt::Display for HttpMetricsSnapshot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "requests={} success={} errors={} rate_limit={}/{}s",
            self.total_requests,
            self.successful_responses,
            self.errors,
            self.rate_limit_errors,
            self.rate_limit_delay_secs,
        )
    }
}

/// Parse the standard `Retry-After` header from a 429 response.
/// Airtable sends plain seconds; absence falls back to the limiter's
/// configured penalty window.
fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
    let header = headers.get("retry-after")?;
    let header = header.to_str().ok()?;
    match header.parse::<u64>() {
        Ok(secs) => Some(Duration::from_secs(secs)),
        Err(_) => {
            warn!("Could not parse 429 response header 'retry-after: {header}'");
            None
        }
    }
}

#[derive(Debug)]
pub(crate) struct HttpClient {
    client: reqwest::Client,

    /// Base URL for API requests (e.g., "https://api.airtable.com")
    pub base_url: String,

    /// Personal access token, sent as a bearer token
    token: String,

    limiter: RateLimiter,

    /// HTTP request/response metrics
    pub metrics: Arc<HttpMetrics>,
}

impl HttpClient {
    pub fn new(
        builder: reqwest::ClientBuilder,
        base_url: String,
        token: String,
        limiter: RateLimiter,
    ) -> Result<Self> {
        let client = builder.build().context(HttpSnafu {
            method: "client-init",
            url: "",
        })?;
        Ok(HttpClient {
            client,
            base_url,
            token,
            limiter,
            metrics: Arc::new(HttpMetrics::default()),
        })
    }

    /// Returns a snapshot of current HTTP metrics
    pub fn metrics_snapshot(&self) -> HttpMetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Makes an authenticated GET request, handling pacing and 429 recovery.
    /// - enforces the minimum inter-request delay before sending
    /// - on 429, waits (Retry-After or default penalty window) and retries
    ///   the same request; the retry is unbounded
    /// - maps other http error codes into AirtableErrors
    /// - deserializes the json response body into return type T
    pub(crate) async fn get_request<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T> {
        let full_url = format!("{}{}", self.base_url, path);
        loop {
            self.limiter.acquire().await;
            debug!("GET {full_url}");
            self.metrics.increment_requests();
            let response = self
                .client
                .get(&full_url)
                .query(query)
                .bearer_auth(&self.token)
                .send()
                .await
                .context(HttpSnafu {
                    method: "get",
                    url: &full_url,
                })?;
            let code = response.status();
            match code {
                ok if ok.is_success() => {
                    let body = response.bytes().await.context(HttpSnafu {
                        method: "get",
                        url: &full_url,
                    })?;
                    self.metrics.increment_success();
                    log_response(path, &body);
                    // deserialization failure should not be retried
                    return deserialize_json(&body);
                }
                StatusCode::TOO_MANY_REQUESTS => {
                    self.metrics.increment_rate_limit_errors();
                    let retry_after = parse_retry_after(response.headers());
                    if let Some(wait) = retry_after {
                        self.metrics.add_rate_limit_delay(wait.as_secs());
                    }
                    self.limiter.backoff(retry_after).await;
                    continue;
                }
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                    self.metrics.increment_errors();
                    let message = response.text().await.unwrap_or("Unauthorized".into());
                    error!(?code, ?message, path, "http");
                    return Err(AirtableError::Auth { message });
                }
                StatusCode::NOT_FOUND => {
                    self.metrics.increment_errors();
                    let message = response.text().await.unwrap_or("NotFound".into());
                    error!(?code, ?message, path, "http");
                    return Err(AirtableError::NotFound {
                        // too generic here - the caller knows which
                        // base/table/view the request was for
                        obj_type: "Resource".into(),
                        key: path.to_string(),
                    });
                }
                _ => {
                    self.metrics.increment_errors();
                    let message = response.text().await.unwrap_or_default();
                    error!(?code, ?message, path, "http");
                    return Err(AirtableError::ApiError {
                        code: code.as_u16(),
                        method: "get".to_string(),
                        url: path.to_string(),
                        message,
                    });
                }
            }
        }
    }
}

// dump json response, for debugging
// requires RUST_LOG=airtable_api::http_json=trace
fn log_response(path: &str, body: &[u8]) {
    if tracing::enabled!(target: "airtable_api::http_json", tracing::Level::TRACE) {
        trace!(target: "airtable_api::http_json", "Response path={path} body={}",
            String::from_utf8_lossy(body)
        );
    }
}

// deserialize, reporting errors with 'serde_path_to_error', which provides
// a detailed json path to the error
fn deserialize_json<T: DeserializeOwned>(body: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(body);
    match serde_path_to_error::deserialize(&mut deserializer) {
        Ok(value) => Ok(value),
        Err(err) => {
            error!("Deserialization failed at {}: {}", err.path(), err);
            Err(AirtableError::Deserialization {
                source: err.into_inner(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse_retry_after;
    use reqwest::header::{HeaderMap, HeaderValue};
    use std::time::Duration;

    #[test]
    fn test_parse_retry_after_seconds() {
        let mut headers = HeaderMap::new();
        headers.insert("retry-after", HeaderValue::from_static("30"));
        assert_eq!(parse_retry_after(&headers), Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_parse_retry_after_missing() {
        let headers = HeaderMap::new();
        assert_eq!(parse_retry_after(&headers), None);
    }

    #[test]
    fn test_parse_retry_after_unparseable() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "retry-after",
            HeaderValue::from_static("Wed, 21 Oct 2026 07:28:00 GMT"),
        );
        assert_eq!(parse_retry_after(&headers), None);
    }
}
