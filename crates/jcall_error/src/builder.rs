//! Errors from assembling client settings with a builder.

/// Why a builder refused to produce a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, derive_more::Display)]
pub enum BuilderErrorKind {
    /// A required field was never set or was left empty
    #[display("{} is required", _0)]
    MissingField(String),

    /// A field was set to an unusable value
    #[display("{} is invalid: {}", field, reason)]
    InvalidField {
        /// The field name
        field: String,
        /// Why it was rejected
        reason: String,
    },

    /// The generated builder reported an error of its own
    #[display("Incomplete builder: {}", _0)]
    Incomplete(String),
}

/// Builder error with the location it was raised from.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Builder Error: {} at line {} in {}", kind, line, file)]
pub struct BuilderError {
    kind: BuilderErrorKind,
    line: u32,
    file: &'static str,
}

impl BuilderError {
    /// Create an error at the caller's location.
    #[track_caller]
    pub fn new(kind: BuilderErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Shorthand for [`BuilderErrorKind::MissingField`].
    #[track_caller]
    pub fn missing(field: impl Into<String>) -> Self {
        Self::new(BuilderErrorKind::MissingField(field.into()))
    }

    /// The error kind.
    pub fn kind(&self) -> &BuilderErrorKind {
        &self.kind
    }
}
