//! The JustCall API client.

use crate::{
    CampaignCalls, CampaignContacts, Campaigns, Calls, Contacts, HttpTransport, Messages,
    PhoneNumbers, RequestExecutor, Transport, Users, paginator,
};
use derive_getters::Getters;
use futures_util::Stream;
use jcall_core::{ApiResponse, PageCursor, RequestDescriptor};
use jcall_error::{ApiError, BuilderError, BuilderErrorKind, JCallResult};
use jcall_rate_limit::{JCallConfig, RateLimiter, RetryPolicy};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Credentials and settings for a [`JustCallClient`].
///
/// # Examples
///
/// ```
/// use jcall_client::ClientConfig;
///
/// let config = ClientConfig::builder()
///     .api_key("key")
///     .api_secret("secret")
///     .build()
///     .unwrap();
/// assert_eq!(config.api_key(), "key");
/// assert_eq!(config.settings().rate_limit.max_tokens, 5);
///
/// assert!(ClientConfig::builder().api_key("key").build().is_err());
/// ```
#[derive(Clone, PartialEq, Getters, derive_builder::Builder)]
#[builder(setter(into), build_fn(private, name = "build_internal"))]
pub struct ClientConfig {
    /// API key
    api_key: String,
    /// API secret
    api_secret: String,
    /// Rate limit, retry and HTTP settings
    #[builder(default)]
    settings: JCallConfig,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .field("settings", &self.settings)
            .finish()
    }
}

impl ClientConfig {
    /// Start building a configuration.
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }
}

impl ClientConfigBuilder {
    /// Build the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if a credential is missing or empty.
    #[track_caller]
    pub fn build(&self) -> Result<ClientConfig, BuilderError> {
        let config = self
            .build_internal()
            .map_err(|e| BuilderError::new(BuilderErrorKind::Incomplete(e.to_string())))?;
        if config.api_key.is_empty() {
            return Err(BuilderError::missing("api_key"));
        }
        if config.api_secret.is_empty() {
            return Err(BuilderError::missing("api_secret"));
        }
        Ok(config)
    }
}

/// Async client for the JustCall API.
///
/// Cloning is cheap: clones share one rate limiter, one retry handler and one
/// HTTP session. The session opens on the first request and is released by
/// [`close`](Self::close) or when the last clone is dropped; a request after
/// `close` opens a new one.
///
/// # Examples
///
/// ```no_run
/// use futures_util::{StreamExt, pin_mut};
/// use jcall_client::{JustCallClient, ListCallsParams};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let client = JustCallClient::new("api-key", "api-secret")?;
///
/// let calls = client.calls().iter_all(&ListCallsParams::default(), Some(100));
/// pin_mut!(calls);
/// while let Some(call) = calls.next().await {
///     println!("{}", call?["id"]);
/// }
///
/// client.close().await;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct JustCallClient {
    executor: Arc<RequestExecutor>,
}

impl JustCallClient {
    /// Client with default settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials cannot be sent as a header.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> JCallResult<Self> {
        let config = ClientConfig::builder()
            .api_key(api_key)
            .api_secret(api_secret)
            .build()?;
        Self::from_config(config)
    }

    /// Client with explicit settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials or settings are invalid.
    pub fn with_config(
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
        settings: JCallConfig,
    ) -> JCallResult<Self> {
        let config = ClientConfig::builder()
            .api_key(api_key)
            .api_secret(api_secret)
            .settings(settings)
            .build()?;
        Self::from_config(config)
    }

    /// Client from a built [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials or settings are invalid.
    #[instrument(skip(config))]
    pub fn from_config(config: ClientConfig) -> JCallResult<Self> {
        config.settings.validate()?;
        let transport = HttpTransport::new(&config.api_key, &config.api_secret, &config.settings.http)?;
        info!(base_url = %transport.base_url(), "Creating JustCall client");
        Ok(Self::with_transport(Arc::new(transport), &config.settings))
    }

    /// Client over a custom transport.
    pub fn with_transport(transport: Arc<dyn Transport>, settings: &JCallConfig) -> Self {
        debug!(strategy = ?settings.rate_limit.strategy, "Building request pipeline");
        let limiter = Arc::new(RateLimiter::new(settings.rate_limit.clone()));
        let policy = RetryPolicy::from_config(&settings.retry);
        Self {
            executor: Arc::new(RequestExecutor::new(transport, limiter, policy)),
        }
    }

    /// The request executor behind this client.
    pub fn executor(&self) -> &RequestExecutor {
        &self.executor
    }

    /// Shared rate limiter.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        self.executor.limiter()
    }

    /// Send any request.
    ///
    /// # Errors
    ///
    /// Returns the classified failure after retries.
    pub async fn send(&self, request: &RequestDescriptor) -> Result<ApiResponse, ApiError> {
        self.executor.send(request).await
    }

    /// Send a request and take the JSON document.
    ///
    /// # Errors
    ///
    /// Returns the classified failure after retries, or a malformed-response
    /// error for raw payloads.
    pub async fn send_json(&self, request: &RequestDescriptor) -> Result<Value, ApiError> {
        self.executor.send(request).await?.into_json()
    }

    /// Stream every item of a paginated endpoint.
    ///
    /// See [`paginate`](crate::paginate) for the iteration rules.
    pub fn paginate(
        &self,
        template: RequestDescriptor,
        cursor: PageCursor,
    ) -> impl Stream<Item = Result<Value, ApiError>> + '_ {
        paginator::paginate(&self.executor, template, cursor)
    }

    /// Release the HTTP session. Later requests open a new one.
    pub async fn close(&self) {
        self.executor.transport().close().await;
    }

    /// Whether an HTTP session is open.
    pub async fn is_open(&self) -> bool {
        self.executor.transport().is_open().await
    }

    /// Call records.
    pub fn calls(&self) -> Calls<'_> {
        Calls::new(self)
    }

    /// SMS and MMS messages.
    pub fn messages(&self) -> Messages<'_> {
        Messages::new(self)
    }

    /// Users and agents.
    pub fn users(&self) -> Users<'_> {
        Users::new(self)
    }

    /// JustCall phone numbers.
    pub fn phone_numbers(&self) -> PhoneNumbers<'_> {
        PhoneNumbers::new(self)
    }

    /// Contacts.
    pub fn contacts(&self) -> Contacts<'_> {
        Contacts::new(self)
    }

    /// Sales dialer campaigns.
    pub fn campaigns(&self) -> Campaigns<'_> {
        Campaigns::new(self)
    }

    /// Calls made by the sales dialer.
    pub fn campaign_calls(&self) -> CampaignCalls<'_> {
        CampaignCalls::new(self)
    }

    /// Contacts in sales dialer campaigns.
    pub fn campaign_contacts(&self) -> CampaignContacts<'_> {
        CampaignContacts::new(self)
    }
}
