//! Request executor: admission, retry and response classification.

use crate::{HttpRequest, HttpResponse, Transport};
use arc_swap::ArcSwap;
use jcall_core::{ApiResponse, RequestDescriptor, ResponseKind};
use jcall_error::{ApiError, ApiErrorKind};
use jcall_rate_limit::{RateLimitHeaders, RateLimiter, RetryHandler, RetryPolicy};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Consecutive throttle events after which retries switch to the patient policy.
pub const SUSTAINED_THROTTLE_EVENTS: u32 = 3;

/// The single path from a [`RequestDescriptor`] to a response.
///
/// Every attempt, retries included, passes the rate limiter first. Quota
/// headers from successful responses are fed to the limiter here; those on
/// failures reach it through the retry handler.
#[derive(Debug)]
pub struct RequestExecutor {
    transport: Arc<dyn Transport>,
    limiter: Arc<RateLimiter>,
    retry: RetryHandler,
    base_policy: ArcSwap<RetryPolicy>,
}

impl RequestExecutor {
    /// Create an executor.
    pub fn new(transport: Arc<dyn Transport>, limiter: Arc<RateLimiter>, policy: RetryPolicy) -> Self {
        Self {
            transport,
            limiter,
            retry: RetryHandler::new(policy.clone()),
            base_policy: ArcSwap::from_pointee(policy),
        }
    }

    /// Shared rate limiter.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Transport requests are sent through.
    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Retry policy in effect for new requests.
    pub fn retry_policy(&self) -> Arc<RetryPolicy> {
        self.retry.policy()
    }

    /// Replace the configured retry policy.
    pub fn update_retry_policy(&self, policy: RetryPolicy) {
        self.base_policy.store(Arc::new(policy.clone()));
        self.retry.update_policy(policy);
    }

    /// Send a request, retrying transient failures.
    ///
    /// # Errors
    ///
    /// Returns the last classified failure once retries are exhausted, or the
    /// first failure that is not worth retrying.
    #[instrument(
        skip(self, descriptor),
        fields(method = %descriptor.method(), path = %descriptor.path())
    )]
    pub async fn send(&self, descriptor: &RequestDescriptor) -> Result<ApiResponse, ApiError> {
        let request = HttpRequest::from_descriptor(descriptor);
        let resource_key = descriptor.resource_key_or_path();
        let kind = *descriptor.response_kind();

        let result = self
            .retry
            .execute_with_retry(Some(&self.limiter), || {
                self.attempt(&request, resource_key, kind)
            })
            .await;

        self.adjust_retry_policy().await;
        result
    }

    async fn attempt(
        &self,
        request: &HttpRequest,
        resource_key: &str,
        kind: ResponseKind,
    ) -> Result<ApiResponse, ApiError> {
        self.limiter.acquire(Some(resource_key)).await;

        let response = self.transport.execute(request).await?;
        if !response.is_success() {
            return Err(classify_failure(response));
        }

        let quota = RateLimitHeaders::from_map(&response.headers);
        self.limiter.update_from_headers(&quota).await;
        if !quota.burst_exhausted() {
            self.limiter.record_success().await;
        }

        parse_success(response, kind)
    }

    async fn adjust_retry_policy(&self) {
        let throttles = self.limiter.consecutive_throttles().await;
        let base = self.base_policy.load_full();
        let current = self.retry.policy();

        if throttles >= SUSTAINED_THROTTLE_EVENTS && *current == *base {
            warn!(throttles, "Sustained throttling, switching to patient retry policy");
            self.retry.update_policy(base.patient());
        } else if throttles == 0 && *current != *base {
            info!("Throttling cleared, restoring configured retry policy");
            self.retry.update_policy((*base).clone());
        }
    }
}

/// Turn a non-2xx response into a classified error.
///
/// The message comes from a JSON `message` field when present, then the raw
/// body text, then `HTTP <status>`.
pub fn classify_failure(response: HttpResponse) -> ApiError {
    let message = error_message(&response);
    debug!(status = response.status, message = %message, "Request failed");
    ApiError::new(ApiErrorKind::from_status(response.status, message)).with_headers(response.headers)
}

fn error_message(response: &HttpResponse) -> String {
    if let Ok(Value::Object(body)) = serde_json::from_slice::<Value>(&response.body) {
        match body.get("message") {
            Some(Value::String(message)) if !message.is_empty() => return message.clone(),
            Some(Value::Null) | None => {}
            Some(other) => return other.to_string(),
        }
    }

    let text = String::from_utf8_lossy(&response.body);
    let text = text.trim();
    if text.is_empty() {
        format!("HTTP {}", response.status)
    } else {
        text.to_string()
    }
}

fn parse_success(response: HttpResponse, kind: ResponseKind) -> Result<ApiResponse, ApiError> {
    match kind {
        ResponseKind::Raw => Ok(ApiResponse::Raw {
            status: response.status,
            bytes: response.body,
        }),
        ResponseKind::Json if response.body.iter().all(u8::is_ascii_whitespace) => {
            Ok(ApiResponse::Json(Value::Null))
        }
        ResponseKind::Json => serde_json::from_slice(&response.body)
            .map(ApiResponse::Json)
            .map_err(|e| {
                warn!(status = response.status, error = %e, "Response body is not valid JSON");
                ApiError::new(ApiErrorKind::MalformedResponse {
                    status: response.status,
                    message: format!("Invalid JSON in response body: {}", e),
                })
            }),
    }
}
