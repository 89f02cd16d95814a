//! Faults inside the admission strategies.

/// Why a strategy could not compute an admission decision.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum RateLimitErrorKind {
    /// The rate is zero, negative or not finite
    #[display("Invalid rate: {}", _0)]
    InvalidRate(String),
    /// A windowed strategy has an empty window
    #[display("Invalid window: {}", _0)]
    InvalidWindow(String),
}

/// Strategy fault with the location it was raised from.
///
/// These never reach callers of [`crate::RateLimiter::acquire`]: the limiter
/// logs them and admits the request.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Rate Limit Error: {} at line {} in {}", kind, line, file)]
pub struct RateLimitError {
    kind: RateLimitErrorKind,
    line: u32,
    file: &'static str,
}

impl RateLimitError {
    /// Create an error at the caller's location.
    #[track_caller]
    pub fn new(kind: RateLimitErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// The error kind.
    pub fn kind(&self) -> &RateLimitErrorKind {
        &self.kind
    }
}
