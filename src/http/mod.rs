//! HTTP client module
//!
//! The transport behind [`HttpListOperation`](crate::operation::HttpListOperation).
//!
//! # Features
//!
//! - **Automatic Retries**: 429/5xx, timeouts and connect errors, with backoff
//! - **Rate Limiting**: Token bucket rate limiter using governor
//! - **Backoff Strategies**: Constant, linear, and exponential backoff

mod client;
mod rate_limit;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestConfig};
pub use rate_limit::{RateLimiter, RateLimiterConfig};
