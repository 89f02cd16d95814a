//! Test utilities for jcall_client tests.
//!
//! This module provides a scripted transport and response helpers.

pub mod mock_transport;

#[allow(unused_imports)]
pub use mock_transport::{MockResponse, MockTransport};

use jcall_rate_limit::{JCallConfig, RetryConfig};

/// Settings with a generous rate limit and fast retries, so tests only wait
/// where they mean to.
#[allow(dead_code)]
pub fn fast_settings() -> JCallConfig {
    let mut settings = JCallConfig::default();
    settings.rate_limit.rate = 1000.0;
    settings.rate_limit.max_tokens = 1000;
    settings.rate_limit.jitter_fraction = 0.0;
    settings.retry = RetryConfig {
        max_retries: 3,
        retry_delay_ms: 10,
        backoff_factor: 2.0,
        jitter_fraction: 0.0,
        ..Default::default()
    };
    settings
}
