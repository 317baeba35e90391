//! Airtable Rust API Client
//!
//! # Creating a new api client
//!
//! - [new](AirtableClient::new) - create new client from a personal access token
//! - [with_config](AirtableClient::with_config) - create client with custom configuration
//! - [with_client](AirtableClient::with_client) - create client with configuration and custom reqwest client
//!

use std::{sync::Arc, time::Duration};

use tracing::debug;

use crate::{
    AIRTABLE_API_URL, Result,
    config::{AIRTABLE_URL_ENV, MIN_REQUEST_DELAY_MS, RATE_LIMIT_BACKOFF_SECS},
    error::AirtableError,
    http_client::{HttpClient, HttpMetricsSnapshot},
    limiter::RateLimiter,
};

/// Configuration for the Airtable client: endpoint url and pacing settings.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base url for all Airtable Web API requests.
    /// If not provided in config, url is determined by:
    /// * The environment variable AIRTABLE_URL, if defined, or
    /// * "https://api.airtable.com"
    pub base_url: String,

    /// Minimum delay between consecutive requests.
    pub min_request_delay: Duration,

    /// Wait after a 429 response when the server doesn't send `Retry-After`.
    pub rate_limit_backoff: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            base_url: std::env::var(AIRTABLE_URL_ENV).unwrap_or(AIRTABLE_API_URL.to_string()),
            min_request_delay: Duration::from_millis(MIN_REQUEST_DELAY_MS),
            rate_limit_backoff: Duration::from_secs(RATE_LIMIT_BACKOFF_SECS),
        }
    }
}

impl ClientConfig {
    /// Sets the base url.
    pub fn base_url(self, base_url: impl Into<String>) -> Self {
        ClientConfig {
            base_url: base_url.into(),
            ..self
        }
    }

    /// Sets the minimum inter-request delay.
    pub fn min_request_delay(self, delay: Duration) -> Self {
        ClientConfig {
            min_request_delay: delay,
            ..self
        }
    }

    /// Sets the default 429 backoff.
    pub fn rate_limit_backoff(self, backoff: Duration) -> Self {
        ClientConfig {
            rate_limit_backoff: backoff,
            ..self
        }
    }
}

/// An ergonomic Airtable Web API client in Rust.
pub struct AirtableClient {
    client: Arc<HttpClient>,
    config: ClientConfig,
}

impl std::fmt::Debug for AirtableClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // token is intentionally not printed
        f.debug_struct("AirtableClient")
            .field("config", &self.config)
            .finish()
    }
}

impl AirtableClient {
    /// Creates a new client from a personal access token, with default
    /// configuration.
    ///
    /// # Example
    /// ```rust,no_run
    /// use airtable_api::prelude::*;
    /// # fn create_client() -> Result<AirtableClient, AirtableError> {
    /// let client = AirtableClient::new("pat_xxx")?;
    /// # Ok(client)
    /// # }
    /// ```
    pub fn new(token: impl Into<String>) -> Result<Self> {
        Self::with_config(token, ClientConfig::default())
    }

    /// Creates a new client with the provided configuration.
    pub fn with_config(token: impl Into<String>, config: ClientConfig) -> Result<Self> {
        let builder = reqwest::Client::builder();
        Self::with_client(builder, token, config)
    }

    /// Creates a client from a `reqwest::ClientBuilder`, token, and
    /// configuration. The builder can be customized with timeouts, proxies,
    /// dns servers, user_agent, etc.
    pub fn with_client(
        builder: reqwest::ClientBuilder,
        token: impl Into<String>,
        config: ClientConfig,
    ) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(AirtableError::Auth {
                message: "personal access token is empty".to_string(),
            });
        }
        debug!(url=?config.base_url, "new client");
        let limiter = RateLimiter::new(config.min_request_delay, config.rate_limit_backoff);
        let client = HttpClient::new(builder, config.base_url.clone(), token, limiter)?;
        Ok(Self {
            client: Arc::new(client),
            config,
        })
    }

    /// Returns the configuration.
    pub fn get_config(&self) -> &ClientConfig {
        &self.config
    }

    /// Returns a snapshot of current HTTP metrics.
    pub fn http_metrics(&self) -> HttpMetricsSnapshot {
        self.client.metrics_snapshot()
    }

    pub(crate) fn http(&self) -> &HttpClient {
        &self.client
    }

    // ids appear in url paths; reject anything that could change the route
    pub(crate) fn validate_id(&self, id: &str, what: &str) -> Result<()> {
        if id.is_empty()
            || !id
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-')
        {
            return Err(AirtableError::Validation {
                message: format!("{what} {id:?} is not a valid Airtable id"),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_token_is_rejected_before_any_io() {
        let result = AirtableClient::new("  ");
        assert!(matches!(result, Err(AirtableError::Auth { .. })));
    }

    #[test]
    fn validate_id_rejects_path_meta_characters() {
        let client = AirtableClient::new("pat_test").unwrap();
        assert!(client.validate_id("app0123", "base_id").is_ok());
        assert!(client.validate_id("", "base_id").is_err());
        assert!(client.validate_id("app/../x", "base_id").is_err());
        assert!(client.validate_id("app?view=1", "base_id").is_err());
    }

    #[test]
    fn config_builders_apply() {
        let config = ClientConfig::default()
            .base_url("http://127.0.0.1:4012")
            .min_request_delay(Duration::from_millis(5))
            .rate_limit_backoff(Duration::from_secs(2));
        assert_eq!(config.base_url, "http://127.0.0.1:4012");
        assert_eq!(config.min_request_delay, Duration::from_millis(5));
        assert_eq!(config.rate_limit_backoff, Duration::from_secs(2));
    }
}
