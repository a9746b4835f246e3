//! HTTP client module
//!
//! Provides the HTTP client with retry, rate limiting, and backoff strategies.
//!
//! # Features
//!
//! - **Automatic Retries**: 429s and 5xx are retried with backoff; transport
//!   failures too, unless the request opts out with `fail_fast`
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Backoff Strategies**: Constant, linear, and exponential backoff
//! - **Status passthrough**: Non-success statuses are returned, never raised

mod client;
mod rate_limit;

pub use client::{
    HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig, RetryPolicy,
};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
