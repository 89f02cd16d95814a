//! HTTP transport.
//!
//! The [`Transport`] trait is the seam between the request pipeline and the
//! network. [`HttpTransport`] is the reqwest implementation used in
//! production; tests substitute scripted transports.

use async_trait::async_trait;
use jcall_core::{Method, RequestDescriptor};
use jcall_error::{ApiError, ConfigError};
use jcall_rate_limit::HttpConfig;
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, error, info, instrument};

/// One request in wire format.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    /// HTTP method
    pub method: Method,
    /// Path relative to the base URL
    pub path: String,
    /// Query string pairs
    pub query: Vec<(String, String)>,
    /// JSON body
    pub body: Option<Value>,
}

impl HttpRequest {
    /// Normalise a descriptor into wire format.
    pub fn from_descriptor(descriptor: &RequestDescriptor) -> Self {
        Self {
            method: *descriptor.method(),
            path: descriptor.path().clone(),
            query: descriptor.normalized_query(),
            body: descriptor.normalized_body(),
        }
    }
}

/// One response as received, before classification.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Response headers, keys lower-cased
    pub headers: HashMap<String, String>,
    /// Raw body
    pub body: Vec<u8>,
}

impl HttpResponse {
    /// True for 2xx statuses.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends wire-format requests.
///
/// Implementations classify only network-level failures (as
/// [`ApiError::transport`]); any response that arrives, whatever its status,
/// is returned as an [`HttpResponse`].
#[async_trait]
pub trait Transport: Send + Sync + std::fmt::Debug {
    /// Send one request.
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError>;

    /// Release any open session. The next request opens a new one.
    async fn close(&self) {}

    /// Whether a session is currently open.
    async fn is_open(&self) -> bool {
        true
    }
}

/// reqwest transport with a lazily opened, reusable session.
#[derive(Debug)]
pub struct HttpTransport {
    base_url: String,
    auth: HeaderValue,
    timeout: Duration,
    session: RwLock<Option<Client>>,
}

impl HttpTransport {
    /// Create a transport for the given credentials.
    ///
    /// No connection is made until the first request.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials cannot be sent as a header value.
    pub fn new(
        api_key: &str,
        api_secret: &str,
        config: &HttpConfig,
    ) -> Result<Self, ConfigError> {
        let mut auth = HeaderValue::from_str(&format!("{}:{}", api_key, api_secret))
            .map_err(|e| ConfigError::invalid("credentials", format!("not a valid header value: {}", e)))?;
        auth.set_sensitive(true);

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth,
            timeout: config.timeout(),
            session: RwLock::new(None),
        })
    }

    /// Base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn build_client(&self) -> Result<Client, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, self.auth.clone());
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        Client::builder()
            .default_headers(headers)
            .timeout(self.timeout)
            .build()
            .map_err(|e| {
                error!(error = ?e, "Failed to build HTTP client");
                ApiError::transport(format!("Failed to build HTTP client: {}", e))
            })
    }

    async fn session(&self) -> Result<Client, ApiError> {
        {
            let session = self.session.read().await;
            if let Some(client) = session.as_ref() {
                return Ok(client.clone());
            }
        }

        let mut session = self.session.write().await;
        if let Some(client) = session.as_ref() {
            return Ok(client.clone());
        }
        debug!(base_url = %self.base_url, "Opening HTTP session");
        let client = self.build_client()?;
        *session = Some(client.clone());
        Ok(client)
    }
}

fn to_reqwest_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Patch => reqwest::Method::PATCH,
        Method::Delete => reqwest::Method::DELETE,
    }
}

#[async_trait]
impl Transport for HttpTransport {
    #[instrument(skip(self, request), fields(method = %request.method, path = %request.path))]
    async fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
        let client = self.session().await?;
        let url = format!("{}{}", self.base_url, request.path);

        let mut builder = client.request(to_reqwest_method(request.method), &url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        } else if request.method.is_write() {
            builder = builder.header(CONTENT_TYPE, "application/json");
        }

        let response = builder.send().await.map_err(|e| {
            error!(error = ?e, "Failed to send request to JustCall API");
            ApiError::transport(format!("Request failed: {}", e))
        })?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_ascii_lowercase(), value.to_string()))
            })
            .collect();
        let body = response.bytes().await.map_err(|e| {
            error!(error = ?e, status, "Failed to read response body");
            ApiError::transport(format!("Failed to read response body: {}", e))
        })?;

        debug!(status, bytes = body.len(), "Received response");
        Ok(HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }

    async fn close(&self) {
        if self.session.write().await.take().is_some() {
            info!("HTTP session closed");
        }
    }

    async fn is_open(&self) -> bool {
        self.session.read().await.is_some()
    }
}
