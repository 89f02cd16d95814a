//! Bounded retry with exponential backoff.
//!
//! A [`RetryPolicy`] decides from an [`ApiError`]'s classification alone
//! whether another attempt is worthwhile. The [`RetryHandler`] drives the
//! attempts with `tokio-retry2`, feeding each failure's quota headers to the
//! rate limiter before the backoff delay runs.

use crate::{RateLimitHeaders, RateLimiter, RetryConfig};
use arc_swap::ArcSwap;
use derive_getters::Getters;
use jcall_error::{ApiError, RetryableError};
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_retry2::strategy::jitter_range;
use tokio_retry2::{Retry, RetryError};
use tracing::{debug, instrument, warn};

/// Which failures to retry and how long to wait between attempts.
///
/// # Examples
///
/// ```
/// use jcall_rate_limit::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.delay_for(1), Duration::from_secs(2));
/// assert_eq!(policy.delay_for(2), Duration::from_secs(3));
///
/// // Actual waits add up to 10% jitter on top of the schedule
/// let delays: Vec<Duration> = policy.delays().collect();
/// assert_eq!(delays.len(), 5);
/// assert!(delays[0] >= Duration::from_secs(2) && delays[0] <= Duration::from_millis(2200));
/// ```
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct RetryPolicy {
    /// Retries after the first attempt
    max_retries: u32,
    /// Delay before the first retry
    retry_delay: Duration,
    /// Growth factor between consecutive retries
    backoff_factor: f64,
    /// Ceiling on any single delay
    max_backoff: Duration,
    /// HTTP statuses worth retrying
    retry_statuses: BTreeSet<u16>,
    /// Upper bound of the random stretch applied to each delay
    jitter_fraction: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&RetryConfig::default())
    }
}

impl RetryPolicy {
    /// Build a policy from configuration.
    pub fn from_config(config: &RetryConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            backoff_factor: config.backoff_factor,
            max_backoff: Duration::from_millis(config.max_backoff_ms),
            retry_statuses: config.retry_statuses.iter().copied().collect(),
            jitter_fraction: config.jitter_fraction,
        }
    }

    /// A policy that never retries.
    pub fn no_retry() -> Self {
        Self {
            max_retries: 0,
            ..Self::default()
        }
    }

    /// Same policy with a different retry count.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Same policy with a different base delay.
    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Same policy with a different jitter bound.
    pub fn with_jitter_fraction(mut self, jitter_fraction: f64) -> Self {
        self.jitter_fraction = jitter_fraction;
        self
    }

    /// Slower variant used while the server keeps throttling: two more
    /// retries, twice the base delay and at least doubling between attempts.
    /// The delay ceiling is unchanged.
    pub fn patient(&self) -> Self {
        Self {
            max_retries: self.max_retries.saturating_add(2),
            retry_delay: self.retry_delay.saturating_mul(2),
            backoff_factor: self.backoff_factor.max(2.0),
            max_backoff: self.max_backoff,
            retry_statuses: self.retry_statuses.clone(),
            jitter_fraction: self.jitter_fraction,
        }
    }

    /// Whether a failure warrants another attempt under this policy's
    /// retry statuses.
    pub fn should_retry(&self, error: &ApiError) -> bool {
        error.is_retryable(&self.retry_statuses)
    }

    /// Delay before retry number `retry` (1-based):
    /// `retry_delay * backoff_factor^(retry - 1)`, capped at `max_backoff`.
    pub fn delay_for(&self, retry: u32) -> Duration {
        let exponent = i32::try_from(retry.saturating_sub(1)).unwrap_or(i32::MAX);
        let secs = self.retry_delay.as_secs_f64() * self.backoff_factor.powi(exponent);
        Duration::try_from_secs_f64(secs)
            .unwrap_or(self.max_backoff)
            .min(self.max_backoff)
    }

    /// Delays before each retry, one per allowed retry.
    ///
    /// Each scheduled delay is stretched by a random factor in
    /// `1.0..1.0 + jitter_fraction`, still capped at `max_backoff`.
    pub fn delays(&self) -> impl Iterator<Item = Duration> + use<> {
        let policy = self.clone();
        let spread = if self.jitter_fraction.is_finite() && self.jitter_fraction > 0.0 {
            self.jitter_fraction
        } else {
            0.0
        };
        let stretch = jitter_range(1.0, 1.0 + spread);
        (1..=self.max_retries)
            .map(move |retry| stretch(policy.delay_for(retry)).min(policy.max_backoff))
    }
}

/// Executes operations under a hot-swappable [`RetryPolicy`].
///
/// # Example
///
/// ```
/// use jcall_error::ApiError;
/// use jcall_rate_limit::{RetryHandler, RetryPolicy};
///
/// # #[tokio::main]
/// # async fn main() {
/// let handler = RetryHandler::new(RetryPolicy::no_retry());
/// let result: Result<u32, ApiError> = handler
///     .execute_with_retry(None, || async { Ok(42) })
///     .await;
/// assert_eq!(result.unwrap(), 42);
/// # }
/// ```
#[derive(Debug)]
pub struct RetryHandler {
    policy: ArcSwap<RetryPolicy>,
}

impl Default for RetryHandler {
    fn default() -> Self {
        Self::new(RetryPolicy::default())
    }
}

impl RetryHandler {
    /// Create a handler with the given policy.
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy: ArcSwap::from_pointee(policy),
        }
    }

    /// Policy used by calls that start from now on.
    pub fn policy(&self) -> Arc<RetryPolicy> {
        self.policy.load_full()
    }

    /// Swap the policy. Calls already in progress keep the policy they
    /// started with.
    pub fn update_policy(&self, policy: RetryPolicy) {
        debug!(
            max_retries = policy.max_retries,
            retry_delay_ms = policy.retry_delay.as_millis() as u64,
            "Retry policy updated"
        );
        self.policy.store(Arc::new(policy));
    }

    /// Run `operation` until it succeeds, fails permanently or runs out of
    /// retries.
    ///
    /// Each failure's quota headers are forwarded to `limiter` before the
    /// retry decision. The returned error is the last failure, carrying the
    /// number of attempts made and, when retries ran out, the exhaustion flag.
    #[instrument(skip_all)]
    pub async fn execute_with_retry<T, F, Fut>(
        &self,
        limiter: Option<&RateLimiter>,
        mut operation: F,
    ) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let policy = self.policy.load_full();
        let attempts = AtomicU32::new(0);
        let policy_ref = &policy;

        let result = Retry::spawn(policy.delays(), || {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            let request = operation();
            async move {
                match request.await {
                    Ok(value) => Ok(value),
                    Err(err) => {
                        if let (Some(limiter), Some(headers)) = (limiter, err.headers()) {
                            limiter
                                .update_from_headers(&RateLimitHeaders::from_map(headers))
                                .await;
                        }

                        if policy_ref.should_retry(&err) {
                            warn!(attempt, status = err.status(), error = %err, "Transient error, will retry");
                            Err(RetryError::Transient {
                                err,
                                retry_after: None,
                            })
                        } else {
                            warn!(attempt, status = err.status(), error = %err, "Permanent error, failing immediately");
                            Err(RetryError::Permanent(err))
                        }
                    }
                }
            }
        })
        .await;

        let attempts = attempts.load(Ordering::SeqCst);
        result.map_err(|err| {
            if policy.should_retry(&err) {
                warn!(attempts, status = err.status(), "Retries exhausted");
                err.exhausted(attempts)
            } else {
                err.with_attempts(attempts)
            }
        })
    }
}
