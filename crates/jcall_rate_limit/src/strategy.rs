//! Admission strategies.
//!
//! Each strategy answers one question under the limiter's lock: may a request
//! for this key go now, or how long should the caller wait before asking
//! again? Strategies never sleep themselves.

use crate::{RateLimitError, RateLimitErrorKind};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::time::Duration;
use tokio::time::Instant;

/// Key used when a request carries no resource key.
pub const GLOBAL_KEY: &str = "global";

/// Admission algorithm selection.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Strategy {
    /// Continuous refill up to a burst ceiling
    #[default]
    TokenBucket,
    /// Counter reset at window boundaries
    FixedWindow,
    /// Timestamps evicted as they age out of the window
    SlidingWindow,
}

impl Strategy {
    /// Build fresh admission state for this strategy.
    pub fn build(self) -> Box<dyn AdmissionStrategy> {
        match self {
            Strategy::TokenBucket => Box::new(TokenBucket::default()),
            Strategy::FixedWindow => Box::new(FixedWindow::new(Instant::now())),
            Strategy::SlidingWindow => Box::new(SlidingWindow::default()),
        }
    }
}

/// Limits in force for one admission check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdmissionLimits {
    /// Requests per second for the key being admitted
    pub rate: f64,
    /// Burst ceiling
    pub max_tokens: u32,
    /// Window length for windowed strategies
    pub window: Duration,
    /// Floor on any computed wait
    pub min_wait: Duration,
}

impl AdmissionLimits {
    fn check_rate(&self) -> Result<(), RateLimitError> {
        if self.rate.is_finite() && self.rate > 0.0 {
            Ok(())
        } else {
            Err(RateLimitError::new(RateLimitErrorKind::InvalidRate(format!(
                "{} requests/second",
                self.rate
            ))))
        }
    }

    fn check_window(&self) -> Result<(), RateLimitError> {
        self.check_rate()?;
        if self.window.is_zero() {
            return Err(RateLimitError::new(RateLimitErrorKind::InvalidWindow(
                "window size must be greater than zero".to_string(),
            )));
        }
        Ok(())
    }

    /// Requests admitted per window: `floor(rate * window)`, at least one.
    pub fn max_requests(&self) -> usize {
        ((self.rate * self.window.as_secs_f64()).floor() as usize).max(1)
    }
}

/// Outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// Capacity was consumed; the request may proceed.
    Admitted,
    /// No capacity; check again after this long.
    Wait(Duration),
}

/// A rate limiting algorithm.
pub trait AdmissionStrategy: Send + Sync + std::fmt::Debug {
    /// Which algorithm this is.
    fn strategy(&self) -> Strategy;

    /// Check and, when admitted, consume capacity for `key` in one step.
    fn try_admit(
        &mut self,
        key: Option<&str>,
        limits: &AdmissionLimits,
        now: Instant,
    ) -> Result<Admission, RateLimitError>;

    /// Shrink stored capacity after the burst ceiling was lowered.
    fn clamp_capacity(&mut self, _max_tokens: u32) {}

    /// Tokens in the global bucket, for token-based strategies.
    fn current_tokens(&self) -> Option<f64> {
        None
    }

    /// Admissions currently counted per key, for windowed strategies.
    fn window_counts(&self) -> HashMap<String, usize> {
        HashMap::new()
    }
}

/// Convert seconds to a duration, saturating instead of panicking.
pub(crate) fn duration_from_secs(secs: f64) -> Duration {
    if secs.is_nan() || secs <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Bucket {
    tokens: f64,
    last_refill: Instant,
}

/// Token bucket admission.
///
/// Every request draws from one shared bucket, so `max_tokens` bounds the
/// aggregate burst. A key with its own configured rate only changes the rate
/// the bucket refills at while that key is being admitted. The bucket starts
/// full.
#[derive(Debug, Default)]
pub struct TokenBucket {
    bucket: Option<Bucket>,
}

impl AdmissionStrategy for TokenBucket {
    fn strategy(&self) -> Strategy {
        Strategy::TokenBucket
    }

    fn try_admit(
        &mut self,
        _key: Option<&str>,
        limits: &AdmissionLimits,
        now: Instant,
    ) -> Result<Admission, RateLimitError> {
        limits.check_rate()?;

        let capacity = f64::from(limits.max_tokens.max(1));
        let bucket = self.bucket.get_or_insert(Bucket {
            tokens: capacity,
            last_refill: now,
        });

        let elapsed = now.saturating_duration_since(bucket.last_refill);
        bucket.tokens = (bucket.tokens + elapsed.as_secs_f64() * limits.rate).min(capacity);
        bucket.last_refill = now;

        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            Ok(Admission::Admitted)
        } else {
            let wait = duration_from_secs(1.0 / limits.rate).max(limits.min_wait);
            Ok(Admission::Wait(wait))
        }
    }

    fn clamp_capacity(&mut self, max_tokens: u32) {
        if let Some(bucket) = self.bucket.as_mut() {
            bucket.tokens = bucket.tokens.min(f64::from(max_tokens.max(1)));
        }
    }

    fn current_tokens(&self) -> Option<f64> {
        Some(self.bucket.map_or(0.0, |b| b.tokens))
    }
}

/// Fixed window admission.
///
/// Time is cut into consecutive windows measured from the moment the strategy
/// was built. Each key's counter resets when a new window starts.
#[derive(Debug)]
pub struct FixedWindow {
    epoch: Instant,
    windows: HashMap<String, (u64, usize)>,
}

impl FixedWindow {
    /// Start counting windows at `epoch`.
    pub fn new(epoch: Instant) -> Self {
        Self {
            epoch,
            windows: HashMap::new(),
        }
    }
}

impl AdmissionStrategy for FixedWindow {
    fn strategy(&self) -> Strategy {
        Strategy::FixedWindow
    }

    fn try_admit(
        &mut self,
        key: Option<&str>,
        limits: &AdmissionLimits,
        now: Instant,
    ) -> Result<Admission, RateLimitError> {
        limits.check_window()?;

        let window_secs = limits.window.as_secs_f64();
        let since_epoch = now.saturating_duration_since(self.epoch).as_secs_f64();
        let index = (since_epoch / window_secs).floor() as u64;

        let (current, count) = self
            .windows
            .entry(key.unwrap_or(GLOBAL_KEY).to_string())
            .or_insert((index, 0));
        if *current != index {
            *current = index;
            *count = 0;
        }

        if *count < limits.max_requests() {
            *count += 1;
            return Ok(Admission::Admitted);
        }

        let next_boundary = (index + 1) as f64 * window_secs;
        let wait = duration_from_secs(next_boundary - since_epoch).max(limits.min_wait);
        Ok(Admission::Wait(wait))
    }

    fn window_counts(&self) -> HashMap<String, usize> {
        self.windows
            .iter()
            .map(|(key, (_, count))| (key.clone(), *count))
            .collect()
    }
}

/// Sliding window admission.
///
/// Every admission is timestamped per key; timestamps older than the window
/// are evicted on each check.
#[derive(Debug, Default)]
pub struct SlidingWindow {
    timestamps: HashMap<String, VecDeque<Instant>>,
}

impl AdmissionStrategy for SlidingWindow {
    fn strategy(&self) -> Strategy {
        Strategy::SlidingWindow
    }

    fn try_admit(
        &mut self,
        key: Option<&str>,
        limits: &AdmissionLimits,
        now: Instant,
    ) -> Result<Admission, RateLimitError> {
        limits.check_window()?;

        let window = limits.window;
        let stamps = self
            .timestamps
            .entry(key.unwrap_or(GLOBAL_KEY).to_string())
            .or_default();
        while stamps
            .front()
            .is_some_and(|oldest| now.saturating_duration_since(*oldest) >= window)
        {
            stamps.pop_front();
        }

        if stamps.len() < limits.max_requests() {
            stamps.push_back(now);
            return Ok(Admission::Admitted);
        }

        let wait = stamps
            .front()
            .map(|oldest| window.saturating_sub(now.saturating_duration_since(*oldest)))
            .unwrap_or(Duration::ZERO)
            .max(limits.min_wait);
        Ok(Admission::Wait(wait))
    }

    fn window_counts(&self) -> HashMap<String, usize> {
        self.timestamps
            .iter()
            .map(|(key, stamps)| (key.clone(), stamps.len()))
            .collect()
    }
}
