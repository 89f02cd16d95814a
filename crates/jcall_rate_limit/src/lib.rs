//! Rate limiting and retry for the JustCall API.
//!
//! This crate keeps the client inside the API's quotas:
//!
//! - [`RateLimiter`] gates every outbound request with one of three admission
//!   strategies (token bucket, fixed window, sliding window) and tightens
//!   itself when the server reports an exhausted burst window.
//! - [`RetryHandler`] retries transient failures with capped exponential
//!   backoff, forwarding quota headers from each failure to the limiter.
//! - [`JCallConfig`] loads the TOML configuration for both, plus HTTP settings.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod headers;
mod limiter;
mod retry;
mod strategy;

pub use config::{
    DEFAULT_BACKOFF_FACTOR, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, DEFAULT_MAX_TOKENS,
    DEFAULT_RATE, DEFAULT_RETRY_DELAY_MS, DEFAULT_RETRY_JITTER, DEFAULT_RETRY_STATUSES, DEFAULT_WINDOW_SIZE_SECS,
    HttpConfig, JCallConfig, MAX_BACKOFF_MS, MIN_WAIT_MS, RateLimitConfig, RetryConfig,
};
pub use error::{RateLimitError, RateLimitErrorKind};
pub use headers::{
    BURST_LIMIT_HEADER, BURST_REMAINING_HEADER, BURST_RESET_HEADER, LIMIT_HEADER,
    REMAINING_HEADER, RESET_HEADER, RateLimitHeaders,
};
pub use limiter::{MIN_RATE, RateLimitMetrics, RateLimiter};
pub use retry::{RetryHandler, RetryPolicy};
pub use strategy::{
    Admission, AdmissionLimits, AdmissionStrategy, FixedWindow, GLOBAL_KEY, SlidingWindow,
    Strategy, TokenBucket,
};
