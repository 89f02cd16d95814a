//! Retry bounds, short-circuiting and limiter feedback.

use jcall_error::{ApiError, ApiErrorKind};
use jcall_rate_limit::{RateLimitConfig, RateLimiter, RetryHandler, RetryPolicy};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::time::Instant;

fn fast_policy(max_retries: u32) -> RetryPolicy {
    RetryPolicy::default()
        .with_max_retries(max_retries)
        .with_retry_delay(Duration::from_millis(10))
}

fn status_error(status: u16) -> ApiError {
    ApiError::new(ApiErrorKind::from_status(status, format!("HTTP {}", status)))
}

#[tokio::test(start_paused = true)]
async fn test_retryable_failure_makes_max_retries_plus_one_attempts() {
    let handler = RetryHandler::new(fast_policy(3));
    let calls = AtomicU32::new(0);

    let result: Result<(), ApiError> = handler
        .execute_with_retry(None, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(status_error(503)) }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 4);
    let err = result.unwrap_err();
    assert_eq!(err.status(), 503);
    assert_eq!(err.attempts(), 4);
    assert!(err.retries_exhausted());
}

#[tokio::test(start_paused = true)]
async fn test_transport_failures_are_retried() {
    let handler = RetryHandler::new(fast_policy(2));
    let calls = AtomicU32::new(0);

    let result: Result<(), ApiError> = handler
        .execute_with_retry(None, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(ApiError::transport("connection refused")) }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 3);
    assert_eq!(result.unwrap_err().status(), 500);
}

#[tokio::test(start_paused = true)]
async fn test_not_found_short_circuits_without_sleeping() {
    let handler = RetryHandler::default();
    let calls = AtomicU32::new(0);
    let start = Instant::now();

    let result: Result<(), ApiError> = handler
        .execute_with_retry(None, || {
            calls.fetch_add(1, Ordering::SeqCst);
            async { Err(status_error(404)) }
        })
        .await;

    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(start.elapsed(), Duration::ZERO);
    let err = result.unwrap_err();
    assert_eq!(err.attempts(), 1);
    assert!(!err.retries_exhausted());
}

#[tokio::test(start_paused = true)]
async fn test_success_after_failures_returns_value() {
    let handler = RetryHandler::new(fast_policy(5));
    let calls = AtomicU32::new(0);

    let result = handler
        .execute_with_retry(None, || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if attempt < 3 {
                    Err(status_error(502))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

    assert_eq!(result.unwrap(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_backoff_follows_policy_delays() {
    let handler = RetryHandler::new(
        RetryPolicy::default()
            .with_max_retries(2)
            .with_retry_delay(Duration::from_secs(2)),
    );
    let start = Instant::now();

    let _: Result<(), ApiError> = handler
        .execute_with_retry(None, || async { Err(status_error(500)) })
        .await;

    // 2s then 2s * 1.5
    assert!(start.elapsed() >= Duration::from_secs(5));
}

#[tokio::test(start_paused = true)]
async fn test_throttle_headers_reach_limiter_before_retry() {
    let limiter = RateLimiter::new(RateLimitConfig {
        jitter_fraction: 0.0,
        ..Default::default()
    });
    let handler = RetryHandler::new(fast_policy(5));
    let calls = AtomicU32::new(0);
    let start = Instant::now();
    let shared = &limiter;

    let result = handler
        .execute_with_retry(Some(shared), || {
            let attempt = calls.fetch_add(1, Ordering::SeqCst) + 1;
            let limiter = shared;
            async move {
                limiter.acquire(Some("calls")).await;
                if attempt == 1 {
                    let mut headers = HashMap::new();
                    headers.insert("x-rate-limit-burst-remaining".to_string(), "0".to_string());
                    headers.insert("x-rate-limit-burst-reset".to_string(), "5".to_string());
                    Err(status_error(429).with_headers(headers))
                } else {
                    Ok("done")
                }
            }
        })
        .await;

    assert_eq!(result.unwrap(), "done");
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    // 5s reset stretched by the 1.2 buffer
    assert!(start.elapsed() >= Duration::from_secs(6));
    assert_eq!(limiter.consecutive_throttles().await, 1);
    assert!(limiter.rate().await < 1.0);
}
