//! Classified failures of the JustCall request pipeline.

use std::collections::{BTreeSet, HashMap};

/// Synthetic status code assigned to failures that never produced a response.
pub const TRANSPORT_FAILURE_STATUS: u16 = 500;

/// Classified API failure conditions.
///
/// Classification happens once, when a response (or the lack of one) is turned
/// into an error. Retry decisions only ever look at these fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum ApiErrorKind {
    /// The request never produced a response (connection refused, DNS, timeout)
    #[display("Request failed: {}", _0)]
    Transport(String),
    /// HTTP 429
    #[display("Rate limited (HTTP {}): {}", status, message)]
    RateLimited {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },
    /// HTTP 5xx
    #[display("Server error (HTTP {}): {}", status, message)]
    Server {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },
    /// Any other non-2xx status
    #[display("API Error (HTTP {}): {}", status, message)]
    Client {
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },
    /// A structured payload was expected but the body could not be parsed
    #[display("Malformed response (HTTP {}): {}", status, message)]
    MalformedResponse {
        /// HTTP status code
        status: u16,
        /// Parser error message
        message: String,
    },
}

impl ApiErrorKind {
    /// Classify a non-2xx HTTP status into an error kind.
    ///
    /// # Examples
    ///
    /// ```
    /// use jcall_error::ApiErrorKind;
    ///
    /// let kind = ApiErrorKind::from_status(429, "slow down");
    /// assert!(matches!(kind, ApiErrorKind::RateLimited { .. }));
    ///
    /// let kind = ApiErrorKind::from_status(404, "missing");
    /// assert!(matches!(kind, ApiErrorKind::Client { .. }));
    /// ```
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = message.into();
        match status {
            429 => ApiErrorKind::RateLimited { status, message },
            500..=599 => ApiErrorKind::Server { status, message },
            _ => ApiErrorKind::Client { status, message },
        }
    }

    /// HTTP status of this failure. Transport failures report
    /// [`TRANSPORT_FAILURE_STATUS`].
    pub fn status(&self) -> u16 {
        match self {
            ApiErrorKind::Transport(_) => TRANSPORT_FAILURE_STATUS,
            ApiErrorKind::RateLimited { status, .. }
            | ApiErrorKind::Server { status, .. }
            | ApiErrorKind::Client { status, .. }
            | ApiErrorKind::MalformedResponse { status, .. } => *status,
        }
    }

    /// Human readable message without the classification prefix.
    pub fn message(&self) -> &str {
        match self {
            ApiErrorKind::Transport(message)
            | ApiErrorKind::RateLimited { message, .. }
            | ApiErrorKind::Server { message, .. }
            | ApiErrorKind::Client { message, .. }
            | ApiErrorKind::MalformedResponse { message, .. } => message,
        }
    }

    /// Retry classification against a set of retryable HTTP statuses.
    ///
    /// Transport failures are always retryable, malformed responses never,
    /// and HTTP failures when their status is in `retry_statuses`.
    pub fn is_retryable(&self, retry_statuses: &BTreeSet<u16>) -> bool {
        match self {
            ApiErrorKind::Transport(_) => true,
            ApiErrorKind::MalformedResponse { .. } => false,
            other => retry_statuses.contains(&other.status()),
        }
    }
}

/// Uniform API error with source location tracking.
///
/// # Examples
///
/// ```
/// use jcall_error::{ApiError, ApiErrorKind};
///
/// let err = ApiError::new(ApiErrorKind::Server {
///     status: 503,
///     message: "Service unavailable".to_string(),
/// });
/// assert_eq!(err.status(), 503);
/// assert_eq!(err.attempts(), 1);
/// assert!(!err.retries_exhausted());
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display(
    "JustCall API Error: {} (attempts: {}) at line {} in {}",
    kind,
    attempts,
    line,
    file
)]
pub struct ApiError {
    kind: ApiErrorKind,
    headers: Option<HashMap<String, String>>,
    attempts: u32,
    retries_exhausted: bool,
    line: u32,
    file: &'static str,
}

impl ApiError {
    /// Create a new ApiError with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ApiErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            headers: None,
            attempts: 1,
            retries_exhausted: false,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for a transport failure.
    #[track_caller]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ApiErrorKind::Transport(message.into()))
    }

    /// Attach the raw response headers. Keys are lower-cased.
    pub fn with_headers(mut self, headers: HashMap<String, String>) -> Self {
        let headers = headers
            .into_iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v))
            .collect();
        self.headers = Some(headers);
        self
    }

    /// Record how many attempts were made before this error surfaced.
    pub fn with_attempts(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self
    }

    /// Mark this error as the last failure of an exhausted retry loop.
    pub fn exhausted(mut self, attempts: u32) -> Self {
        self.attempts = attempts.max(1);
        self.retries_exhausted = true;
        self
    }

    /// Get the error kind.
    pub fn kind(&self) -> &ApiErrorKind {
        &self.kind
    }

    /// HTTP status (500 for transport failures).
    pub fn status(&self) -> u16 {
        self.kind.status()
    }

    /// Human readable message.
    pub fn message(&self) -> &str {
        self.kind.message()
    }

    /// Raw response headers, when a response was received.
    pub fn headers(&self) -> Option<&HashMap<String, String>> {
        self.headers.as_ref()
    }

    /// Number of attempts made, including the first.
    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    /// True when this error ended a retry loop that ran out of attempts.
    pub fn retries_exhausted(&self) -> bool {
        self.retries_exhausted
    }
}

/// Trait for errors that support retry logic.
///
/// # Examples
///
/// ```
/// use jcall_error::{ApiError, ApiErrorKind, RetryableError};
/// use std::collections::BTreeSet;
///
/// let statuses = BTreeSet::from([429, 503]);
/// let err = ApiError::new(ApiErrorKind::Client {
///     status: 401,
///     message: "Unauthorized".to_string(),
/// });
/// assert!(!err.is_retryable(&statuses));
/// ```
pub trait RetryableError {
    /// Returns true if this error should trigger a retry when the statuses in
    /// `retry_statuses` are considered transient.
    fn is_retryable(&self, retry_statuses: &BTreeSet<u16>) -> bool;
}

impl RetryableError for ApiError {
    fn is_retryable(&self, retry_statuses: &BTreeSet<u16>) -> bool {
        self.kind.is_retryable(retry_statuses)
    }
}
