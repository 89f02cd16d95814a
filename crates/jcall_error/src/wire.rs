//! Wire format errors (API date and datetime strings).

/// A value received from the API did not match the expected wire format.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Wire Format Error: {} at line {} in {}", message, line, file)]
pub struct WireFormatError {
    /// What failed to parse and why
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl WireFormatError {
    /// Create a new WireFormatError at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use jcall_error::WireFormatError;
    ///
    /// let err = WireFormatError::new("Invalid datetime format: 05/01/2023");
    /// assert!(err.message.contains("05/01/2023"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
