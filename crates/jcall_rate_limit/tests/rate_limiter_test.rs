//! Admission and adaptive behavior of the rate limiter.

use jcall_rate_limit::{RateLimitConfig, RateLimitHeaders, RateLimiter, Strategy};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

fn throttle(reset: u64) -> RateLimitHeaders {
    RateLimitHeaders {
        burst_remaining: Some(0),
        burst_reset: Some(reset),
        ..Default::default()
    }
}

#[tokio::test(start_paused = true)]
async fn test_admission_bound_holds_for_fast_callers() {
    let limiter = RateLimiter::new(RateLimitConfig {
        rate: 2.0,
        max_tokens: 5,
        ..Default::default()
    });

    let start = Instant::now();
    for _ in 0..15 {
        limiter.acquire(None).await;
    }

    // (N - max_tokens) / rate = (15 - 5) / 2
    assert!(start.elapsed() >= Duration::from_secs(5));
    assert_eq!(limiter.metrics().await.total_requests, 15);
}

#[tokio::test(start_paused = true)]
async fn test_admission_bound_holds_across_tasks() {
    let limiter = Arc::new(RateLimiter::new(RateLimitConfig {
        rate: 4.0,
        max_tokens: 2,
        ..Default::default()
    }));

    let start = Instant::now();
    let handles: Vec<_> = (0..10)
        .map(|_| {
            let limiter = Arc::clone(&limiter);
            tokio::spawn(async move { limiter.acquire(Some("calls")).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap();
    }

    assert!(start.elapsed() >= Duration::from_secs(2));
    let metrics = limiter.metrics().await;
    assert_eq!(metrics.total_requests, 10);
    assert_eq!(metrics.endpoint_counts["calls"], 10);
}

#[tokio::test]
async fn test_burst_exhaustion_tightens_rate_and_burst() {
    let limiter = RateLimiter::default();
    let rate_before = limiter.rate().await;
    let tokens_before = limiter.max_tokens().await;

    limiter.update_from_headers(&throttle(10)).await;

    assert!(limiter.rate().await < rate_before);
    assert!(limiter.max_tokens().await < tokens_before);

    let metrics = limiter.metrics().await;
    assert_eq!(metrics.consecutive_throttles, 1);
    assert_eq!(metrics.last_quota.burst_reset, Some(10));
    // 10s reset stretched by the 1.2 buffer
    assert!(metrics.blocked_for.unwrap() >= Duration::from_secs(11));
}

#[tokio::test]
async fn test_consecutive_throttles_tighten_faster() {
    let first = RateLimiter::default();
    first.update_from_headers(&throttle(1)).await;
    // Default rate is 1.0, so the new rate is the factor applied
    let first_factor = first.rate().await;

    let second = RateLimiter::default();
    second.update_from_headers(&throttle(1)).await;
    let rate_after_one = second.rate().await;
    second.update_from_headers(&throttle(1)).await;
    let second_factor = second.rate().await / rate_after_one;

    assert!(second_factor < first_factor);
}

#[tokio::test(start_paused = true)]
async fn test_acquire_waits_out_server_pause() {
    let limiter = RateLimiter::new(RateLimitConfig {
        jitter_fraction: 0.0,
        ..Default::default()
    });
    limiter.update_from_headers(&throttle(5)).await;

    let start = Instant::now();
    limiter.acquire(None).await;
    assert!(start.elapsed() >= Duration::from_secs(6));
}

#[tokio::test(start_paused = true)]
async fn test_global_quota_exhaustion_pauses() {
    let limiter = RateLimiter::new(RateLimitConfig {
        jitter_fraction: 0.0,
        ..Default::default()
    });
    limiter
        .update_from_headers(&RateLimitHeaders {
            limit: Some(1000),
            remaining: Some(0),
            reset: Some(30),
            ..Default::default()
        })
        .await;

    // Global exhaustion pauses but does not count as a burst throttle
    assert_eq!(limiter.consecutive_throttles().await, 0);
    let start = Instant::now();
    limiter.acquire(None).await;
    assert!(start.elapsed() >= Duration::from_secs(36));
}

#[tokio::test(start_paused = true)]
async fn test_internal_fault_admits_immediately() {
    let limiter = RateLimiter::new(RateLimitConfig {
        rate: 0.0,
        ..Default::default()
    });

    let start = Instant::now();
    for _ in 0..20 {
        limiter.acquire(Some("calls")).await;
    }
    assert_eq!(start.elapsed(), Duration::ZERO);
    assert!(limiter.try_acquire(None).await);
    assert_eq!(limiter.metrics().await.endpoint_counts["calls"], 20);
}

#[tokio::test(start_paused = true)]
async fn test_endpoint_limit_sets_refill_rate() {
    let mut endpoint_limits = HashMap::new();
    endpoint_limits.insert("texts".to_string(), 0.5);
    let limiter = RateLimiter::new(RateLimitConfig {
        max_tokens: 1,
        endpoint_limits,
        jitter_fraction: 0.0,
        ..Default::default()
    });

    assert!(limiter.try_acquire(Some("texts")).await);
    // The burst is shared, so other keys find the bucket empty too
    assert!(!limiter.try_acquire(Some("calls")).await);

    // 0.5/s needs two seconds for the next token
    let start = Instant::now();
    limiter.acquire(Some("texts")).await;
    assert!(start.elapsed() >= Duration::from_secs(2));
}

#[tokio::test(start_paused = true)]
async fn test_endpoint_limits_share_the_burst_ceiling() {
    let mut endpoint_limits = HashMap::new();
    endpoint_limits.insert("calls".to_string(), 1.0);
    endpoint_limits.insert("texts".to_string(), 1.0);
    let limiter = RateLimiter::new(RateLimitConfig {
        rate: 1.0,
        max_tokens: 5,
        endpoint_limits,
        ..Default::default()
    });

    let start = Instant::now();
    for key in [None, Some("calls"), Some("texts")] {
        for _ in 0..5 {
            limiter.acquire(key).await;
        }
    }

    // (15 - 5) / 1 across plain and overridden keys alike
    assert!(start.elapsed() >= Duration::from_secs(10));
    let metrics = limiter.metrics().await;
    assert_eq!(metrics.total_requests, 15);
    assert_eq!(metrics.endpoint_counts["calls"], 5);
    assert_eq!(metrics.endpoint_counts["texts"], 5);
}

#[tokio::test(start_paused = true)]
async fn test_sliding_window_strategy() {
    let limiter = RateLimiter::new(RateLimitConfig {
        rate: 0.1,
        strategy: Strategy::SlidingWindow,
        window_size_secs: 30.0,
        jitter_fraction: 0.0,
        ..Default::default()
    });

    let start = Instant::now();
    for _ in 0..2 {
        limiter.acquire(None).await;
    }
    tokio::time::advance(Duration::from_secs(10)).await;
    limiter.acquire(None).await;

    // Three per 30s window; the fourth waits for the two t=0 entries to age out
    limiter.acquire(None).await;
    assert!(start.elapsed() >= Duration::from_secs(30));

    // The t=10 entry is still inside the window
    let metrics = limiter.metrics().await;
    assert_eq!(metrics.strategy, Strategy::SlidingWindow);
    assert!(metrics.current_tokens.is_none());
    assert_eq!(metrics.window_counts["global"], 2);
}

#[tokio::test(start_paused = true)]
async fn test_fixed_window_strategy() {
    let limiter = RateLimiter::new(RateLimitConfig {
        rate: 0.1,
        strategy: Strategy::FixedWindow,
        window_size_secs: 20.0,
        jitter_fraction: 0.0,
        ..Default::default()
    });

    let start = Instant::now();
    for _ in 0..3 {
        limiter.acquire(Some("users")).await;
    }
    // Two per 20s window; the third lands in the next window
    assert!(start.elapsed() >= Duration::from_secs(19));
    assert_eq!(limiter.metrics().await.window_counts["users"], 1);
}

#[tokio::test]
async fn test_update_configuration_switches_strategy() {
    let limiter = RateLimiter::default();
    limiter.acquire(None).await;

    limiter
        .update_configuration(RateLimitConfig {
            strategy: Strategy::FixedWindow,
            rate: 3.0,
            ..Default::default()
        })
        .await;

    let metrics = limiter.metrics().await;
    assert_eq!(metrics.strategy, Strategy::FixedWindow);
    assert_eq!(metrics.rate, 3.0);
    assert_eq!(metrics.total_requests, 1);
}

#[tokio::test]
async fn test_metrics_serialize() -> anyhow::Result<()> {
    let limiter = RateLimiter::default();
    limiter.acquire(Some("calls")).await;
    let json = serde_json::to_value(limiter.metrics().await)?;
    assert_eq!(json["strategy"], "token_bucket");
    assert_eq!(json["total_requests"], 1);
    assert_eq!(json["endpoint_counts"]["calls"], 1);
    Ok(())
}
