//! Request pipeline and client for the JustCall API.
//!
//! Requests flow through one path:
//!
//! ```text
//! paginate ─► RequestExecutor::send ─► RetryHandler ─► RateLimiter::acquire ─► Transport
//! ```
//!
//! - [`Transport`] sends wire-format requests; [`HttpTransport`] is the
//!   reqwest implementation with a lazily opened session.
//! - [`RequestExecutor`] gates each attempt on the rate limiter, classifies
//!   failures and feeds quota headers back to the limiter.
//! - [`paginate`] flattens page-numbered endpoints into one item stream.
//! - [`JustCallClient`] ties the pipeline together and exposes thin resource
//!   wrappers; [`blocking::JustCallClient`] drives it from plain threads.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod blocking;
mod client;
mod executor;
mod paginator;
mod resources;
mod transport;

pub use client::{ClientConfig, ClientConfigBuilder, JustCallClient};
pub use executor::{RequestExecutor, SUSTAINED_THROTTLE_EVENTS, classify_failure};
pub use paginator::paginate;
pub use resources::*;
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Transport};
