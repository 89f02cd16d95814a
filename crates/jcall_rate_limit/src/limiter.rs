//! Adaptive rate limiter.
//!
//! One limiter is shared by every request a client makes. All state lives
//! behind a single async mutex: an admission check and the capacity it
//! consumes happen under one lock acquisition, and the lock is always
//! released before the caller sleeps.
//!
//! Server feedback tightens the limiter. When a response reports an exhausted
//! burst window the limiter pauses all admissions for the reported reset time
//! (stretched by `buffer_factor` plus jitter) and permanently lowers its rate
//! and burst ceiling. Consecutive throttles lower them faster, up to
//! `max_backoff_multiplier`. A request that completes without exhausting the
//! burst window resets the multiplier.

use crate::strategy::{Admission, AdmissionLimits, AdmissionStrategy, duration_from_secs};
use crate::{RateLimitConfig, RateLimitError, RateLimitHeaders, Strategy};
use rand::Rng;
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::{debug, error, info, instrument, warn};

/// Lowest rate adaptive tightening may reach, in requests per second.
pub const MIN_RATE: f64 = 0.01;

/// Global quota fraction assumed when the server does not report one.
const UNKNOWN_QUOTA_FRACTION: f64 = 0.5;

/// Multiplier growth per consecutive throttle.
const MULTIPLIER_STEP: f64 = 0.5;

/// Point-in-time view of limiter state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateLimitMetrics {
    /// Admission algorithm
    pub strategy: Strategy,
    /// Current sustained rate, after any tightening
    pub rate: f64,
    /// Current burst ceiling, after any tightening
    pub max_tokens: u32,
    /// Window length for windowed strategies
    pub window_size: Duration,
    /// Requests admitted since creation
    pub total_requests: u64,
    /// Requests admitted per resource key
    pub endpoint_counts: HashMap<String, u64>,
    /// Tokens in the global bucket (token bucket only)
    pub current_tokens: Option<f64>,
    /// Admissions counted per key (windowed strategies only)
    pub window_counts: HashMap<String, usize>,
    /// Most recent server-reported quota
    pub last_quota: RateLimitHeaders,
    /// Throttle events since the last clean success
    pub consecutive_throttles: u32,
    /// Current progressive backoff multiplier
    pub backoff_multiplier: f64,
    /// Remaining server-imposed pause, if any
    pub blocked_for: Option<Duration>,
}

/// Random fraction in `0.0..=fraction`, zero for unusable fractions.
fn jitter_sample(fraction: f64) -> f64 {
    if !(fraction > 0.0 && fraction.is_finite()) {
        return 0.0;
    }
    rand::thread_rng().gen_range(0.0..=fraction)
}

#[derive(Debug)]
struct LimiterState {
    config: RateLimitConfig,
    strategy: Box<dyn AdmissionStrategy>,
    blocked_until: Option<Instant>,
    last_quota: RateLimitHeaders,
    consecutive_throttles: u32,
    backoff_multiplier: f64,
    total_requests: u64,
    endpoint_counts: HashMap<String, u64>,
}

impl LimiterState {
    fn new(config: RateLimitConfig) -> Self {
        Self {
            strategy: config.strategy.build(),
            config,
            blocked_until: None,
            last_quota: RateLimitHeaders::default(),
            consecutive_throttles: 0,
            backoff_multiplier: 1.0,
            total_requests: 0,
            endpoint_counts: HashMap::new(),
        }
    }

    fn limits_for(&self, key: Option<&str>) -> AdmissionLimits {
        AdmissionLimits {
            rate: self.config.rate_for(key),
            max_tokens: self.config.max_tokens,
            window: self.config.window(),
            min_wait: self.config.min_wait(),
        }
    }

    fn jittered(&self, wait: Duration) -> Duration {
        let extra = duration_from_secs(wait.as_secs_f64() * jitter_sample(self.config.jitter_fraction));
        wait.saturating_add(extra)
    }

    fn record_admission(&mut self, key: Option<&str>) {
        self.total_requests += 1;
        if let Some(key) = key {
            *self.endpoint_counts.entry(key.to_string()).or_insert(0) += 1;
        }
    }

    fn admit(&mut self, key: Option<&str>, now: Instant) -> Result<Admission, RateLimitError> {
        if let Some(until) = self.blocked_until {
            if until > now {
                return Ok(Admission::Wait(self.jittered(until - now)));
            }
            self.blocked_until = None;
        }

        let limits = self.limits_for(key);
        match self.strategy.try_admit(key, &limits, now) {
            Ok(Admission::Admitted) => {
                self.record_admission(key);
                Ok(Admission::Admitted)
            }
            Ok(Admission::Wait(wait)) => Ok(Admission::Wait(self.jittered(wait))),
            Err(e) => {
                self.record_admission(key);
                Err(e)
            }
        }
    }

    fn block_for(&mut self, now: Instant, pause: Duration) {
        let Some(until) = now.checked_add(pause) else {
            return;
        };
        if self.blocked_until.is_none_or(|current| current < until) {
            self.blocked_until = Some(until);
        }
    }

    fn observe(&mut self, headers: &RateLimitHeaders, now: Instant) {
        self.last_quota.merge(headers);

        if headers.burst_exhausted() {
            self.consecutive_throttles += 1;
            self.backoff_multiplier = (1.0
                + MULTIPLIER_STEP * f64::from(self.consecutive_throttles))
            .min(self.config.max_backoff_multiplier);

            let reset = headers.burst_reset.unwrap_or(1) as f64;
            let jitter = jitter_sample(self.config.jitter_fraction);
            let pause = duration_from_secs(reset * self.config.buffer_factor * (1.0 + jitter));
            self.block_for(now, pause);

            let fraction = self
                .last_quota
                .global_fraction_remaining()
                .unwrap_or(UNKNOWN_QUOTA_FRACTION)
                .clamp(0.1, 0.9);
            let factor = fraction / self.backoff_multiplier;
            self.tighten(factor);

            warn!(
                consecutive_throttles = self.consecutive_throttles,
                backoff_multiplier = self.backoff_multiplier,
                pause_ms = pause.as_millis() as u64,
                rate = self.config.rate,
                max_tokens = self.config.max_tokens,
                "Burst limit exhausted, pausing and reducing rate"
            );
        }

        if headers.global_exhausted() {
            let reset = headers.reset.or(self.last_quota.reset).unwrap_or(1) as f64;
            let pause = duration_from_secs(reset * self.config.buffer_factor);
            self.block_for(now, pause);
            warn!(
                pause_ms = pause.as_millis() as u64,
                "Global quota exhausted, pausing until reset"
            );
        }
    }

    fn tighten(&mut self, factor: f64) {
        self.config.rate = (self.config.rate * factor).max(MIN_RATE);
        self.config.max_tokens = ((f64::from(self.config.max_tokens) * factor).floor() as u32).max(1);
        for rate in self.config.endpoint_limits.values_mut() {
            *rate = (*rate * factor).max(MIN_RATE);
        }
        self.strategy.clamp_capacity(self.config.max_tokens);
    }

    fn metrics(&self, now: Instant) -> RateLimitMetrics {
        RateLimitMetrics {
            strategy: self.strategy.strategy(),
            rate: self.config.rate,
            max_tokens: self.config.max_tokens,
            window_size: self.config.window(),
            total_requests: self.total_requests,
            endpoint_counts: self.endpoint_counts.clone(),
            current_tokens: self.strategy.current_tokens(),
            window_counts: self.strategy.window_counts(),
            last_quota: self.last_quota,
            consecutive_throttles: self.consecutive_throttles,
            backoff_multiplier: self.backoff_multiplier,
            blocked_for: self
                .blocked_until
                .filter(|until| *until > now)
                .map(|until| until - now),
        }
    }
}

/// Adaptive admission gate shared by all requests of one client.
///
/// # Example
///
/// ```
/// use jcall_rate_limit::{RateLimitConfig, RateLimiter};
///
/// # #[tokio::main]
/// # async fn main() {
/// let limiter = RateLimiter::new(RateLimitConfig::default());
///
/// // Wait for capacity before each request
/// limiter.acquire(Some("calls")).await;
/// assert_eq!(limiter.metrics().await.total_requests, 1);
/// # }
/// ```
#[derive(Debug)]
pub struct RateLimiter {
    state: Mutex<LimiterState>,
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

impl RateLimiter {
    /// Create a limiter from configuration.
    pub fn new(config: RateLimitConfig) -> Self {
        info!(
            strategy = %config.strategy,
            rate = config.rate,
            max_tokens = config.max_tokens,
            "Initialized rate limiter"
        );
        Self {
            state: Mutex::new(LimiterState::new(config)),
        }
    }

    /// Wait until a request for `resource_key` may be sent.
    ///
    /// Never fails: an internal fault is logged and the request is admitted.
    #[instrument(skip(self))]
    pub async fn acquire(&self, resource_key: Option<&str>) {
        loop {
            let decision = {
                let mut state = self.state.lock().await;
                state.admit(resource_key, Instant::now())
            };

            match decision {
                Ok(Admission::Admitted) => return,
                Ok(Admission::Wait(wait)) => {
                    debug!(wait_ms = wait.as_millis() as u64, "Rate limit reached, waiting");
                    tokio::time::sleep(wait).await;
                }
                Err(e) => {
                    error!(error = %e, "Rate limiter fault, admitting request");
                    return;
                }
            }
        }
    }

    /// Admit a request only if capacity is available right now.
    pub async fn try_acquire(&self, resource_key: Option<&str>) -> bool {
        let mut state = self.state.lock().await;
        match state.admit(resource_key, Instant::now()) {
            Ok(Admission::Admitted) => true,
            Ok(Admission::Wait(_)) => false,
            Err(e) => {
                error!(error = %e, "Rate limiter fault, admitting request");
                true
            }
        }
    }

    /// Feed server-reported quota headers back into the limiter.
    ///
    /// Responses without quota headers leave the limiter untouched.
    #[instrument(skip(self))]
    pub async fn update_from_headers(&self, headers: &RateLimitHeaders) {
        if headers.is_empty() {
            return;
        }
        let mut state = self.state.lock().await;
        state.observe(headers, Instant::now());
    }

    /// Record a request that completed without exhausting the burst window.
    pub async fn record_success(&self) {
        let mut state = self.state.lock().await;
        if state.consecutive_throttles > 0 {
            info!(
                consecutive_throttles = state.consecutive_throttles,
                "Request succeeded, resetting throttle backoff"
            );
        }
        state.consecutive_throttles = 0;
        state.backoff_multiplier = 1.0;
    }

    /// Replace the configuration.
    ///
    /// Switching strategy starts the new algorithm with fresh state; otherwise
    /// stored capacity is clamped to the new ceiling. Observed quota and
    /// throttle history are kept.
    pub async fn update_configuration(&self, config: RateLimitConfig) {
        let mut state = self.state.lock().await;
        if config.strategy != state.strategy.strategy() {
            state.strategy = config.strategy.build();
        } else {
            state.strategy.clamp_capacity(config.max_tokens);
        }
        info!(
            strategy = %config.strategy,
            rate = config.rate,
            max_tokens = config.max_tokens,
            "Rate limiter configuration updated"
        );
        state.config = config;
    }

    /// Snapshot of current state for monitoring.
    pub async fn metrics(&self) -> RateLimitMetrics {
        self.state.lock().await.metrics(Instant::now())
    }

    /// Current sustained rate.
    pub async fn rate(&self) -> f64 {
        self.state.lock().await.config.rate
    }

    /// Current burst ceiling.
    pub async fn max_tokens(&self) -> u32 {
        self.state.lock().await.config.max_tokens
    }

    /// Throttle events since the last clean success.
    pub async fn consecutive_throttles(&self) -> u32 {
        self.state.lock().await.consecutive_throttles
    }

    /// Current configuration, including any tightening.
    pub async fn configuration(&self) -> RateLimitConfig {
        self.state.lock().await.config.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet_config() -> RateLimitConfig {
        RateLimitConfig {
            jitter_fraction: 0.0,
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_burst_is_admitted_immediately() {
        let limiter = RateLimiter::new(quiet_config());
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire(None).await;
        }
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(!limiter.try_acquire(None).await);
    }

    #[tokio::test]
    async fn test_tightening_factor_uses_global_fraction() {
        let limiter = RateLimiter::new(RateLimitConfig {
            rate: 10.0,
            max_tokens: 20,
            ..quiet_config()
        });
        limiter
            .update_from_headers(&RateLimitHeaders {
                burst_remaining: Some(0),
                burst_reset: Some(1),
                limit: Some(100),
                remaining: Some(60),
                ..Default::default()
            })
            .await;

        // fraction 0.6, multiplier 1.5 after the first throttle
        let factor = 0.6 / 1.5;
        assert!((limiter.rate().await - 10.0 * factor).abs() < 1e-9);
        let max_tokens = limiter.max_tokens().await;
        assert_eq!(max_tokens, (20.0 * factor).floor() as u32);
        assert!(max_tokens < 20);
        assert_eq!(limiter.consecutive_throttles().await, 1);
    }

    #[tokio::test]
    async fn test_multiplier_is_capped() {
        let limiter = RateLimiter::new(RateLimitConfig {
            max_backoff_multiplier: 2.0,
            ..quiet_config()
        });
        let throttle = RateLimitHeaders {
            burst_remaining: Some(0),
            burst_reset: Some(1),
            ..Default::default()
        };
        for _ in 0..4 {
            limiter.update_from_headers(&throttle).await;
        }
        let metrics = limiter.metrics().await;
        assert_eq!(metrics.consecutive_throttles, 4);
        assert_eq!(metrics.backoff_multiplier, 2.0);
        assert!(metrics.rate >= MIN_RATE);
        assert_eq!(metrics.max_tokens, 1);

        limiter.record_success().await;
        let metrics = limiter.metrics().await;
        assert_eq!(metrics.consecutive_throttles, 0);
        assert_eq!(metrics.backoff_multiplier, 1.0);
    }

    #[tokio::test]
    async fn test_empty_headers_leave_state_untouched() {
        let limiter = RateLimiter::new(quiet_config());
        let before = limiter.metrics().await;
        limiter.update_from_headers(&RateLimitHeaders::default()).await;
        assert_eq!(limiter.metrics().await, before);
    }
}
