//! Server-reported quota headers.
//!
//! JustCall reports two quotas on every response: a short burst window and a
//! longer global window. Each is described by a limit, the requests remaining
//! and the seconds until the window resets:
//!
//! - `x-rate-limit-burst-limit` / `-burst-remaining` / `-burst-reset`
//! - `x-rate-limit-limit` / `-remaining` / `-reset`
//!
//! Header names are matched case-insensitively. Missing or unparseable headers
//! are simply absent; they never reset previously observed values.

use reqwest::header::HeaderMap;
use serde::Serialize;
use std::collections::HashMap;

/// Burst window size.
pub const BURST_LIMIT_HEADER: &str = "x-rate-limit-burst-limit";
/// Requests left in the burst window.
pub const BURST_REMAINING_HEADER: &str = "x-rate-limit-burst-remaining";
/// Seconds until the burst window resets.
pub const BURST_RESET_HEADER: &str = "x-rate-limit-burst-reset";
/// Global quota size.
pub const LIMIT_HEADER: &str = "x-rate-limit-limit";
/// Requests left in the global quota.
pub const REMAINING_HEADER: &str = "x-rate-limit-remaining";
/// Seconds until the global quota resets.
pub const RESET_HEADER: &str = "x-rate-limit-reset";

/// Quota information extracted from one response.
///
/// # Examples
///
/// ```
/// use jcall_rate_limit::RateLimitHeaders;
/// use std::collections::HashMap;
///
/// let mut raw = HashMap::new();
/// raw.insert("X-Rate-Limit-Burst-Remaining".to_string(), "0".to_string());
/// raw.insert("x-rate-limit-burst-reset".to_string(), "10".to_string());
///
/// let headers = RateLimitHeaders::from_map(&raw);
/// assert!(headers.burst_exhausted());
/// assert_eq!(headers.burst_reset, Some(10));
/// assert_eq!(headers.limit, None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
pub struct RateLimitHeaders {
    /// Burst window size
    pub burst_limit: Option<u64>,
    /// Requests left in the burst window
    pub burst_remaining: Option<u64>,
    /// Seconds until the burst window resets
    pub burst_reset: Option<u64>,
    /// Global quota size
    pub limit: Option<u64>,
    /// Requests left in the global quota
    pub remaining: Option<u64>,
    /// Seconds until the global quota resets
    pub reset: Option<u64>,
}

impl RateLimitHeaders {
    /// Extract quota headers from a plain header map.
    pub fn from_map(headers: &HashMap<String, String>) -> Self {
        let lookup = |name: &str| {
            headers
                .iter()
                .find(|(key, _)| key.eq_ignore_ascii_case(name))
                .and_then(|(_, value)| parse_header_u64(value))
        };
        Self::from_lookup(lookup)
    }

    /// Extract quota headers from a reqwest header map.
    pub fn from_header_map(headers: &HeaderMap) -> Self {
        let lookup = |name: &str| {
            headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .and_then(parse_header_u64)
        };
        Self::from_lookup(lookup)
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<u64>) -> Self {
        Self {
            burst_limit: lookup(BURST_LIMIT_HEADER),
            burst_remaining: lookup(BURST_REMAINING_HEADER),
            burst_reset: lookup(BURST_RESET_HEADER),
            limit: lookup(LIMIT_HEADER),
            remaining: lookup(REMAINING_HEADER),
            reset: lookup(RESET_HEADER),
        }
    }

    /// True when no quota header was present.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The burst window has no requests left.
    pub fn burst_exhausted(&self) -> bool {
        self.burst_remaining == Some(0)
    }

    /// The global quota has no requests left.
    pub fn global_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    /// Fraction of the global quota still available, when both values are known.
    pub fn global_fraction_remaining(&self) -> Option<f64> {
        match (self.remaining, self.limit) {
            (Some(remaining), Some(limit)) if limit > 0 => Some(remaining as f64 / limit as f64),
            _ => None,
        }
    }

    /// Overlay the values present in `newer`.
    pub fn merge(&mut self, newer: &RateLimitHeaders) {
        self.burst_limit = newer.burst_limit.or(self.burst_limit);
        self.burst_remaining = newer.burst_remaining.or(self.burst_remaining);
        self.burst_reset = newer.burst_reset.or(self.burst_reset);
        self.limit = newer.limit.or(self.limit);
        self.remaining = newer.remaining.or(self.remaining);
        self.reset = newer.reset.or(self.reset);
    }
}

/// Parse an integer header, tolerating a fractional value such as `"2.5"`.
fn parse_header_u64(value: &str) -> Option<u64> {
    let value = value.trim();
    value.parse::<u64>().ok().or_else(|| {
        value
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v >= 0.0)
            .map(|v| v.ceil() as u64)
    })
}
