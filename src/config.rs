//! Mirror configuration
//!
//! This module contains the configuration structures for the gallery mirror,
//! loaded from YAML. Every section has defaults, so a file naming only the
//! subreddit is a complete config.

use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RateLimiterConfig, RequestConfig};
use crate::pagination::{HttpListingSource, PageParams, ReducerLimits};
use crate::types::{BackoffType, OptionStringExt, SearchSort, StringMap};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Top-Level Mirror Config
// ============================================================================

/// Complete mirror configuration loaded from YAML
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MirrorConfig {
    /// Subreddit to mirror, without the `r/` prefix
    #[serde(default)]
    pub subreddit: String,

    /// Search query; without one the subreddit's `new` listing is walked
    #[serde(default)]
    pub query: Option<String>,

    /// Search sort order
    #[serde(default)]
    pub sort: SearchSort,

    /// Page size requested from Reddit (1-100)
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Reddit host
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// User agent sent with every request
    #[serde(default)]
    pub user_agent: Option<String>,

    /// Extra query parameters added to every listing request
    #[serde(default)]
    pub extra_params: HashMap<String, String>,

    /// Names of the cursor and count parameters
    #[serde(default)]
    pub page_params: PageParams,

    /// HTTP client configuration
    #[serde(default)]
    pub http: HttpConfig,

    /// Poller configuration
    #[serde(default)]
    pub poll: PollConfig,

    /// Gallery store configuration
    #[serde(default)]
    pub store: StoreConfig,
}

fn default_limit() -> u32 {
    100
}

fn default_base_url() -> String {
    "https://www.reddit.com".to_string()
}

impl Default for MirrorConfig {
    fn default() -> Self {
        Self {
            subreddit: String::new(),
            query: None,
            sort: SearchSort::default(),
            limit: default_limit(),
            base_url: default_base_url(),
            user_agent: None,
            extra_params: HashMap::new(),
            page_params: PageParams::default(),
            http: HttpConfig::default(),
            poll: PollConfig::default(),
            store: StoreConfig::default(),
        }
    }
}

// ============================================================================
// HTTP Config
// ============================================================================

/// HTTP client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum number of retries
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Retry backoff configuration
    #[serde(default)]
    pub backoff: BackoffConfig,

    /// Requests per minute; 0 disables rate limiting
    #[serde(default = "default_requests_per_minute")]
    pub requests_per_minute: u32,

    /// Requests allowed back to back before the limit kicks in
    #[serde(default = "default_burst_size")]
    pub burst_size: u32,

    /// Extra headers for every request
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout(),
            max_retries: default_max_retries(),
            backoff: BackoffConfig::default(),
            requests_per_minute: default_requests_per_minute(),
            burst_size: default_burst_size(),
            headers: HashMap::new(),
        }
    }
}

fn default_timeout() -> u64 {
    30
}

fn default_max_retries() -> u32 {
    3
}

fn default_requests_per_minute() -> u32 {
    RateLimiterConfig::unauthenticated().requests_per_minute
}

fn default_burst_size() -> u32 {
    RateLimiterConfig::unauthenticated().burst_size
}

/// Backoff configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackoffConfig {
    /// Type of backoff
    #[serde(rename = "type", default)]
    pub backoff_type: BackoffType,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_ms")]
    pub initial_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_ms")]
    pub max_ms: u64,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            backoff_type: BackoffType::Exponential,
            initial_ms: default_initial_ms(),
            max_ms: default_max_ms(),
        }
    }
}

fn default_initial_ms() -> u64 {
    500
}

fn default_max_ms() -> u64 {
    60_000
}

// ============================================================================
// Poll Config
// ============================================================================

/// Poller configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollConfig {
    /// Seconds between polls in watch mode
    #[serde(default = "default_interval")]
    pub interval_secs: u64,

    /// Cap on listing requests per poll
    #[serde(default)]
    pub max_requests: Option<u32>,

    /// Stop when Reddit repeats a cursor
    #[serde(default = "default_true")]
    pub detect_repeated_cursor: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            max_requests: None,
            detect_repeated_cursor: true,
        }
    }
}

fn default_interval() -> u64 {
    300
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Store Config
// ============================================================================

/// Gallery store configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Path of the gallery JSON file
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

fn default_store_path() -> PathBuf {
    PathBuf::from("gallery.json")
}

// ============================================================================
// Loading and Derived Settings
// ============================================================================

impl MirrorConfig {
    /// Config for `subreddit` with every other setting defaulted
    pub fn for_subreddit(subreddit: impl Into<String>) -> Self {
        Self {
            subreddit: subreddit.into(),
            ..Self::default()
        }
    }

    /// Load a YAML config file
    ///
    /// Not validated yet: command-line overrides may still fill in fields.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Failed to read config '{}': {e}", path.display()))
        })?;
        Self::from_yaml_str(&contents)
    }

    /// Parse a YAML config
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Apply command-line overrides
    #[must_use]
    pub fn with_overrides(mut self, subreddit: Option<&str>, store_path: Option<&Path>) -> Self {
        if let Some(subreddit) = subreddit {
            self.subreddit = subreddit.to_string();
        }
        if let Some(path) = store_path {
            self.store.path = path.to_path_buf();
        }
        self
    }

    /// Check the settings that would otherwise fail at request time
    pub fn validate(&self) -> Result<()> {
        let subreddit = self.subreddit_name();
        if subreddit.is_empty() {
            return Err(Error::missing_field("subreddit"));
        }
        if !subreddit
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(Error::invalid_value(
                "subreddit",
                format!("'{subreddit}' is not a subreddit name"),
            ));
        }

        if !(1..=100).contains(&self.limit) {
            return Err(Error::invalid_value(
                "limit",
                format!("must be between 1 and 100, got {}", self.limit),
            ));
        }

        url::Url::parse(&self.base_url)?;

        if self.poll.interval_secs == 0 {
            return Err(Error::invalid_value("poll.interval_secs", "must be positive"));
        }

        Ok(())
    }

    /// Subreddit name with any `r/` prefix stripped
    pub fn subreddit_name(&self) -> &str {
        let name = self.subreddit.trim();
        name.strip_prefix("/r/")
            .or_else(|| name.strip_prefix("r/"))
            .unwrap_or(name)
    }

    /// Effective search query, if any
    pub fn search_query(&self) -> Option<String> {
        self.query.clone().none_if_empty()
    }

    /// Listing path relative to `base_url`
    pub fn endpoint_path(&self) -> String {
        let subreddit = self.subreddit_name();
        if self.search_query().is_some() {
            format!("/r/{subreddit}/search.json")
        } else {
            format!("/r/{subreddit}/new.json")
        }
    }

    /// Fixed query parameters sent with every listing page
    pub fn listing_params(&self) -> StringMap {
        let mut params = StringMap::new();
        params.insert("limit".to_string(), self.limit.to_string());
        params.insert("raw_json".to_string(), "1".to_string());

        if let Some(query) = self.search_query() {
            params.insert("q".to_string(), query);
            params.insert("restrict_sr".to_string(), "1".to_string());
            params.insert("sort".to_string(), self.sort.as_str().to_string());
            params.insert("t".to_string(), "all".to_string());
        }

        for (key, value) in &self.extra_params {
            params.insert(key.clone(), value.clone());
        }
        params
    }

    /// HTTP client settings
    pub fn http_client_config(&self) -> HttpClientConfig {
        let mut builder = HttpClientConfig::builder()
            .base_url(self.base_url.trim_end_matches('/'))
            .timeout(Duration::from_secs(self.http.timeout_secs))
            .max_retries(self.http.max_retries)
            .backoff(
                self.http.backoff.backoff_type,
                Duration::from_millis(self.http.backoff.initial_ms),
                Duration::from_millis(self.http.backoff.max_ms),
            );

        builder = if self.http.requests_per_minute == 0 {
            builder.no_rate_limit()
        } else {
            builder.rate_limit(RateLimiterConfig::new(
                self.http.requests_per_minute,
                self.http.burst_size,
            ))
        };

        if let Some(agent) = self.user_agent.clone().none_if_empty() {
            builder = builder.user_agent(agent);
        }

        for (key, value) in &self.http.headers {
            builder = builder.header(key, value);
        }

        builder.build()
    }

    /// The listing source the poller walks
    pub fn listing_source(&self) -> Result<HttpListingSource> {
        let client = HttpClient::with_config(self.http_client_config())?;
        let base = self
            .listing_params()
            .into_iter()
            .fold(RequestConfig::new(), |request, (key, value)| {
                request.query(key, value)
            });
        Ok(HttpListingSource::new(client, self.endpoint_path(), base)
            .with_params(self.page_params.clone()))
    }

    /// Reducer guards for each poll
    pub fn reducer_limits(&self) -> ReducerLimits {
        ReducerLimits {
            max_requests: self.poll.max_requests,
            detect_repeated_cursor: self.poll.detect_repeated_cursor,
        }
    }

    /// Watch interval
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll.interval_secs)
    }
}
