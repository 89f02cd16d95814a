//! Top-level error wrapper types.

use crate::{ApiError, BuilderError, ConfigError, WireFormatError};

/// Every error the jcall crates can produce.
///
/// # Examples
///
/// ```
/// use jcall_error::{ConfigError, JCallError};
///
/// let err: JCallError = ConfigError::load("unknown variant `leaky_bucket`").into();
/// assert!(format!("{}", err).contains("Configuration Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum JCallErrorKind {
    /// Classified API failure
    #[from(ApiError)]
    Api(ApiError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
    /// Builder error
    #[from(BuilderError)]
    Builder(BuilderError),
    /// Wire format error
    #[from(WireFormatError)]
    WireFormat(WireFormatError),
}

/// jcall error with kind discrimination.
///
/// # Examples
///
/// ```
/// use jcall_error::{JCallResult, WireFormatError};
///
/// fn might_fail() -> JCallResult<()> {
///     Err(WireFormatError::new("Invalid date format: 05/01/2023"))?
/// }
///
/// assert!(might_fail().is_err());
/// ```
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("jcall Error: {}", _0)]
pub struct JCallError(Box<JCallErrorKind>);

impl JCallError {
    /// Create a new error from a kind.
    pub fn new(kind: JCallErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &JCallErrorKind {
        &self.0
    }

    /// The classified API failure, if this error wraps one.
    pub fn as_api(&self) -> Option<&ApiError> {
        match self.kind() {
            JCallErrorKind::Api(err) => Some(err),
            _ => None,
        }
    }
}

// Generic From implementation for any type that converts to JCallErrorKind
impl<T> From<T> for JCallError
where
    T: Into<JCallErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for jcall operations.
pub type JCallResult<T> = std::result::Result<T, JCallError>;
