//! jcall - async client for the JustCall API
//!
//! jcall wraps the JustCall REST API (calls, messages, phone numbers, users,
//! contacts and sales dialer campaigns) behind one resilient request pipeline.
//!
//! # Features
//!
//! - **Adaptive rate limiting**: token bucket, fixed window or sliding window
//!   admission that tightens itself when the server reports an exhausted burst
//! - **Retry**: transient failures (429, 5xx, network) retried with capped
//!   exponential backoff
//! - **Pagination**: page-numbered endpoints flattened into one lazy stream
//! - **Blocking facade**: the same pipeline driven from plain threads
//!
//! # Quick Start
//!
//! ```no_run
//! use futures_util::{StreamExt, pin_mut};
//! use jcall::{JustCallClient, ListCallsParams, init_tracing};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     init_tracing()?;
//!     let client = JustCallClient::new(
//!         std::env::var("JUSTCALL_API_KEY")?,
//!         std::env::var("JUSTCALL_API_SECRET")?,
//!     )?;
//!
//!     let calls = client.calls().iter_all(&ListCallsParams::default(), Some(50));
//!     pin_mut!(calls);
//!     while let Some(call) = calls.next().await {
//!         println!("{}", call?["id"]);
//!     }
//!
//!     client.close().await;
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `jcall_error` - Error types
//! - `jcall_core` - Request descriptors, parameter values, page cursor
//! - `jcall_rate_limit` - Rate limiter, retry handler and configuration
//! - `jcall_client` - Transport, executor, paginator, client and resources
//!
//! This crate (`jcall`) re-exports everything for convenience.

pub use jcall_client::*;
pub use jcall_core::*;
pub use jcall_error::*;
pub use jcall_rate_limit::*;
