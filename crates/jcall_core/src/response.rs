//! Response payloads.

use jcall_error::{ApiError, ApiErrorKind};
use serde_json::Value;

/// Body of a successful response.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiResponse {
    /// Parsed JSON document. An empty body is `Value::Null`.
    Json(Value),
    /// Raw payload, returned untouched, with the status it arrived with.
    Raw {
        /// HTTP status of the response
        status: u16,
        /// Payload bytes
        bytes: Vec<u8>,
    },
}

impl ApiResponse {
    /// Borrow the JSON document, if this is a structured response.
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            ApiResponse::Json(value) => Some(value),
            ApiResponse::Raw { .. } => None,
        }
    }

    /// Take the JSON document, failing for raw payloads.
    pub fn into_json(self) -> Result<Value, ApiError> {
        match self {
            ApiResponse::Json(value) => Ok(value),
            ApiResponse::Raw { status, .. } => Err(ApiError::new(ApiErrorKind::MalformedResponse {
                status,
                message: "Expected a JSON response but received a raw payload".to_string(),
            })),
        }
    }

    /// Take the payload bytes. JSON documents are re-serialised.
    pub fn into_bytes(self) -> Vec<u8> {
        match self {
            ApiResponse::Raw { bytes, .. } => bytes,
            ApiResponse::Json(value) => value.to_string().into_bytes(),
        }
    }

    /// True for raw payloads.
    pub fn is_raw(&self) -> bool {
        matches!(self, ApiResponse::Raw { .. })
    }
}
