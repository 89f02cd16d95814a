//! Configuration errors.

/// What went wrong while loading or applying settings.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ConfigErrorKind {
    /// A setting holds a value the client cannot work with
    #[display("Invalid setting {}: {}", key, reason)]
    InvalidValue {
        /// Dotted path of the setting, e.g. `rate_limit.rate`
        key: String,
        /// Why the value was rejected
        reason: String,
    },
    /// A configuration source could not be read or deserialized
    #[display("Failed to load configuration: {}", _0)]
    Load(String),
    /// Client resources (HTTP session, runtime) could not be set up
    #[display("Client setup failed: {}", _0)]
    Setup(String),
}

/// Configuration error with the location it was raised from.
///
/// # Examples
///
/// ```
/// use jcall_error::{ConfigError, ConfigErrorKind};
///
/// let err = ConfigError::invalid("retry.backoff_factor", "must be >= 1.0, got 0.5");
/// assert!(matches!(err.kind(), ConfigErrorKind::InvalidValue { key, .. } if key == "retry.backoff_factor"));
/// assert!(err.to_string().contains("must be >= 1.0"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Configuration Error: {} at line {} in {}", kind, line, file)]
pub struct ConfigError {
    kind: ConfigErrorKind,
    line: u32,
    file: &'static str,
}

impl ConfigError {
    /// Create an error of the given kind at the caller's location.
    #[track_caller]
    pub fn new(kind: ConfigErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Reject the value of one setting.
    #[track_caller]
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::InvalidValue {
            key: key.into(),
            reason: reason.into(),
        })
    }

    /// A configuration source failed to load.
    #[track_caller]
    pub fn load(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Load(message.into()))
    }

    /// Client resources failed to initialise.
    #[track_caller]
    pub fn setup(message: impl Into<String>) -> Self {
        Self::new(ConfigErrorKind::Setup(message.into()))
    }

    /// The error kind.
    pub fn kind(&self) -> &ConfigErrorKind {
        &self.kind
    }
}
