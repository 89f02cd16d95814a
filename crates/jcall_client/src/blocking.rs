//! Blocking facade for callers on plain OS threads.
//!
//! The same async pipeline runs on a current-thread runtime owned by the
//! client. Do not use this client from inside an async runtime.

use futures_util::StreamExt;
use jcall_core::{ApiResponse, PageCursor, RequestDescriptor};
use jcall_error::{ApiError, ConfigError, JCallResult};
use jcall_rate_limit::{JCallConfig, RateLimiter};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use tokio::runtime::{Builder, Runtime};

/// Blocking JustCall client.
///
/// # Examples
///
/// ```no_run
/// use jcall_client::blocking::JustCallClient;
/// use jcall_client::ListUsersParams;
/// use jcall_core::{PageCursor, RequestDescriptor};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = JustCallClient::new("api-key", "api-secret")?;
///
/// let users = client.block_on(client.inner().users().list(&ListUsersParams::default()))?;
/// println!("{}", users);
///
/// let template = RequestDescriptor::post("/v1/contacts/list");
/// for contact in client.paginate(template, PageCursor::starting_at(1)).take(10) {
///     println!("{}", contact?);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct JustCallClient {
    inner: crate::JustCallClient,
    runtime: Runtime,
}

impl JustCallClient {
    /// Client with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are invalid or the runtime cannot
    /// start.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> JCallResult<Self> {
        Self::from_async(crate::JustCallClient::new(api_key, api_secret)?)
    }

    /// Client with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials or settings are invalid or the
    /// runtime cannot start.
    pub fn with_config(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        settings: JCallConfig,
    ) -> JCallResult<Self> {
        Self::from_async(crate::JustCallClient::with_config(
            api_key, api_secret, settings,
        )?)
    }

    /// Drive an existing async client from blocking code.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot start.
    pub fn from_async(inner: crate::JustCallClient) -> JCallResult<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ConfigError::setup(format!("Failed to start runtime: {}", e)))?;
        Ok(Self { inner, runtime })
    }

    /// The async client being driven.
    pub fn inner(&self) -> &crate::JustCallClient {
        &self.inner
    }

    /// Shared rate limiter.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        self.inner.limiter()
    }

    /// Run any future of the async client to completion.
    pub fn block_on<F: Future>(&self, future: F) -> F::Output {
        self.runtime.block_on(future)
    }

    /// Send any request.
    ///
    /// # Errors
    ///
    /// Returns the classified failure after retries.
    pub fn send(&self, request: &RequestDescriptor) -> Result<ApiResponse, ApiError> {
        self.runtime.block_on(self.inner.send(request))
    }

    /// Send a request and take the JSON document.
    ///
    /// # Errors
    ///
    /// Returns the classified failure after retries.
    pub fn send_json(&self, request: &RequestDescriptor) -> Result<Value, ApiError> {
        self.runtime.block_on(self.inner.send_json(request))
    }

    /// Iterate every item of a paginated endpoint.
    ///
    /// Each call to `next` fetches at most one page.
    pub fn paginate(
        &self,
        template: RequestDescriptor,
        cursor: PageCursor,
    ) -> impl Iterator<Item = Result<Value, ApiError>> + '_ {
        let mut items = Box::pin(self.inner.paginate(template, cursor));
        std::iter::from_fn(move || self.runtime.block_on(items.next()))
    }

    /// Release the HTTP session.
    pub fn close(&self) {
        self.runtime.block_on(self.inner.close());
    }
}
