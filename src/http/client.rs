//! HTTP client with retry and rate limiting
//!
//! Every Reddit request goes through [`HttpClient`]. It never turns a status
//! code into an error: once the retry policy gives up, the last response is
//! handed back and callers decide what a non-200 means. Only transport
//! failures (refused connections, timeouts, broken bodies) surface as `Err`.

use super::rate_limit::{RateLimiter, RateLimiterConfig};
use crate::error::{Error, Result};
use crate::types::{BackoffType, StringMap};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use std::time::Duration;
use tracing::{debug, warn};

// ============================================================================
// Retry policy
// ============================================================================

/// When and how long to wait before repeating a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    pub max_retries: u32,
    /// Delay before the first retry
    pub initial_backoff: Duration,
    /// Upper bound for any single delay, `retry-after` included
    pub max_backoff: Duration,
    /// How the delay grows between attempts
    pub backoff_type: BackoffType,
    /// Whether timeouts and refused connections are retried
    pub retry_transport: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(60),
            backoff_type: BackoffType::Exponential,
            retry_transport: true,
        }
    }
}

impl RetryPolicy {
    /// Delay before retry number `attempt + 1`
    pub fn delay(&self, attempt: u32) -> Duration {
        let delay = match self.backoff_type {
            BackoffType::Constant => self.initial_backoff,
            BackoffType::Linear => self.initial_backoff.saturating_mul(attempt.saturating_add(1)),
            BackoffType::Exponential => self
                .initial_backoff
                .saturating_mul(2u32.saturating_pow(attempt)),
        };
        delay.min(self.max_backoff)
    }

    /// Delay for a response worth repeating, `None` when it should be returned
    fn delay_for_status(&self, response: &Response, attempt: u32) -> Option<Duration> {
        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            let wait = retry_after(response).unwrap_or_else(|| self.delay(attempt));
            return Some(wait.min(self.max_backoff));
        }
        is_server_error(status).then(|| self.delay(attempt))
    }
}

// ============================================================================
// Client configuration
// ============================================================================

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Prefix for relative request paths
    pub base_url: Option<String>,
    /// Per-attempt timeout
    pub timeout: Duration,
    /// Default retry policy
    pub retry: RetryPolicy,
    /// Request budget, `None` disables limiting
    pub rate_limit: Option<RateLimiterConfig>,
    /// Headers sent with every request
    pub default_headers: StringMap,
    /// User agent string, Reddit throttles generic ones hard
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(30),
            retry: RetryPolicy::default(),
            rate_limit: Some(RateLimiterConfig::default()),
            default_headers: StringMap::new(),
            user_agent: format!("reddit-gallery/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Start from the defaults
    pub fn builder() -> HttpClientConfigBuilder {
        HttpClientConfigBuilder::default()
    }
}

/// Builder for [`HttpClientConfig`]
#[derive(Default)]
pub struct HttpClientConfigBuilder {
    config: HttpClientConfig,
}

impl HttpClientConfigBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.config.base_url = Some(url.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.retry.max_retries = retries;
        self
    }

    pub fn backoff(mut self, backoff_type: BackoffType, initial: Duration, max: Duration) -> Self {
        self.config.retry.backoff_type = backoff_type;
        self.config.retry.initial_backoff = initial;
        self.config.retry.max_backoff = max;
        self
    }

    pub fn rate_limit(mut self, config: RateLimiterConfig) -> Self {
        self.config.rate_limit = Some(config);
        self
    }

    pub fn no_rate_limit(mut self) -> Self {
        self.config.rate_limit = None;
        self
    }

    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.default_headers.insert(key.into(), value.into());
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.config.user_agent = agent.into();
        self
    }

    pub fn build(self) -> HttpClientConfig {
        self.config
    }
}

// ============================================================================
// Per-request configuration
// ============================================================================

/// Query parameters and retry override for one request
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    pub query: StringMap,
    /// Overrides whether transport failures are retried
    pub retry_transport: Option<bool>,
}

impl RequestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Surface timeouts and refused connections on the first attempt.
    /// 429 and 5xx responses are still retried.
    #[must_use]
    pub fn fail_fast(mut self) -> Self {
        self.retry_transport = Some(false);
        self
    }
}

// ============================================================================
// Client
// ============================================================================

/// HTTP client with retry and rate limiting
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    rate_limiter: Option<RateLimiter>,
}

impl HttpClient {
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(&config.user_agent)
            .build()?;
        let rate_limiter = config.rate_limit.as_ref().map(RateLimiter::new);

        Ok(Self {
            client,
            config,
            rate_limiter,
        })
    }

    /// GET `url` with the given query and retry override
    pub async fn get_with_config(&self, url: &str, config: RequestConfig) -> Result<Response> {
        self.request(Method::GET, url, config).await
    }

    /// Send a request, retrying under the effective policy.
    ///
    /// Returns `Err` only for transport failures. Any status code, including
    /// a 429 or 5xx that outlived every retry, comes back as a response.
    pub async fn request(
        &self,
        method: Method,
        url: &str,
        config: RequestConfig,
    ) -> Result<Response> {
        let full_url = self.build_url(url);
        let policy = RetryPolicy {
            retry_transport: config
                .retry_transport
                .unwrap_or(self.config.retry.retry_transport),
            ..self.config.retry.clone()
        };

        let mut attempt = 0;
        loop {
            if let Some(limiter) = &self.rate_limiter {
                limiter.wait().await;
            }
            let can_retry = attempt < policy.max_retries;

            let delay = match self.prepare(&method, &full_url, &config).send().await {
                Ok(response) => match policy.delay_for_status(&response, attempt) {
                    Some(delay) if can_retry => {
                        warn!(
                            status = response.status().as_u16(),
                            attempt = attempt + 1,
                            of = policy.max_retries + 1,
                            ?delay,
                            "Retrying after status"
                        );
                        delay
                    }
                    _ => {
                        debug!(%method, url = %full_url, status = response.status().as_u16(), "Request completed");
                        return Ok(response);
                    }
                },
                Err(e) => {
                    let transient = e.is_timeout() || e.is_connect();
                    if !(transient && policy.retry_transport && can_retry) {
                        return Err(self.transport_error(e));
                    }
                    let delay = policy.delay(attempt);
                    warn!(
                        error = %e,
                        attempt = attempt + 1,
                        of = policy.max_retries + 1,
                        ?delay,
                        "Retrying after transport failure"
                    );
                    delay
                }
            };

            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }

    fn prepare(&self, method: &Method, url: &str, config: &RequestConfig) -> RequestBuilder {
        let req = self
            .config
            .default_headers
            .iter()
            .fold(self.client.request(method.clone(), url), |req, (key, value)| {
                req.header(key.as_str(), value.as_str())
            });
        if config.query.is_empty() {
            req
        } else {
            req.query(&config.query)
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                timeout_ms: self.config.timeout.as_millis() as u64,
            }
        } else {
            Error::Http(e)
        }
    }

    /// Resolve `path` against the base URL; absolute URLs pass through
    pub fn build_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        match &self.config.base_url {
            Some(base) => format!(
                "{}/{}",
                base.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
            None => path.to_string(),
        }
    }
}

impl std::fmt::Debug for HttpClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpClient")
            .field("config", &self.config)
            .field("has_rate_limiter", &self.rate_limiter.is_some())
            .finish_non_exhaustive()
    }
}

/// 5xx codes worth another attempt, Cloudflare's 52x included
fn is_server_error(status: StatusCode) -> bool {
    matches!(
        status.as_u16(),
        500 | 502 | 503 | 504 | 520 | 521 | 522 | 523 | 524
    )
}

/// `retry-after` in whole seconds
fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
        .map(Duration::from_secs)
}
