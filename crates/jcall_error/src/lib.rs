//! Error types for the jcall library.
//!
//! This crate provides the foundation error types used throughout the jcall workspace.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All errors use `#[track_caller]` for automatic location capture
//!
//! [`ApiError`] is the uniform failure produced by the request pipeline. It carries
//! the HTTP status, a human readable message, the raw response headers (when a
//! response was received) and the number of attempts that were made.
//!
//! # Examples
//!
//! ```
//! use jcall_error::{ApiError, ApiErrorKind, JCallResult};
//!
//! fn fetch_user() -> JCallResult<String> {
//!     Err(ApiError::new(ApiErrorKind::Client {
//!         status: 404,
//!         message: "User not found".to_string(),
//!     }))?
//! }
//!
//! assert!(fetch_user().is_err());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod api;
mod builder;
mod config;
mod error;
mod wire;

pub use api::{ApiError, ApiErrorKind, RetryableError, TRANSPORT_FAILURE_STATUS};
pub use builder::{BuilderError, BuilderErrorKind};
pub use config::{ConfigError, ConfigErrorKind};
pub use error::{JCallError, JCallErrorKind, JCallResult};
pub use wire::WireFormatError;
