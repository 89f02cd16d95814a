//! Request descriptors.

use crate::{ParamValue, Params};
use derive_getters::Getters;
use serde_json::Value;

/// HTTP method of a request.
///
/// The upper-case wire name comes from one place and backs both
/// [`Method::as_str`] and `Display`.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    strum::Display,
    strum::IntoStaticStr,
)]
#[strum(serialize_all = "UPPERCASE")]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl Method {
    /// Methods that carry a JSON body.
    pub fn is_write(&self) -> bool {
        matches!(self, Method::Post | Method::Put | Method::Patch)
    }

    /// Upper-case method name.
    pub fn as_str(&self) -> &'static str {
        (*self).into()
    }
}

/// What the caller expects back from a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ResponseKind {
    /// Structured JSON document
    #[default]
    Json,
    /// Opaque bytes (recordings, exports), never parsed
    Raw,
}

/// Where a parameter is placed on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamLocation {
    /// URL query string
    Query,
    /// JSON body field
    Body,
}

/// Everything needed to issue one API request.
///
/// Descriptors are built fresh per call. Parameter values are kept as
/// [`ParamValue`]s and normalised to wire format when the request is sent.
///
/// # Examples
///
/// ```
/// use jcall_core::{Method, RequestDescriptor};
///
/// let request = RequestDescriptor::get("/v2.1/calls")
///     .with_query("per_page", 50)
///     .with_query_opt("sort", None::<&str>)
///     .with_resource_key("calls");
///
/// assert_eq!(*request.method(), Method::Get);
/// assert_eq!(request.normalized_query(), vec![("per_page".to_string(), "50".to_string())]);
/// assert_eq!(request.resource_key_or_path(), "calls");
/// ```
#[derive(Debug, Clone, PartialEq, Getters)]
pub struct RequestDescriptor {
    /// HTTP method
    method: Method,
    /// Path relative to the base URL, starting with `/`
    path: String,
    /// Logical key used for per-endpoint rate limiting
    resource_key: Option<String>,
    /// Query parameters
    query: Params,
    /// Optional JSON body
    body: Option<Params>,
    /// Expected response kind
    response_kind: ResponseKind,
}

impl RequestDescriptor {
    /// Create a descriptor with no parameters.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            resource_key: None,
            query: Params::new(),
            body: None,
            response_kind: ResponseKind::Json,
        }
    }

    /// GET request.
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    /// POST request.
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// PUT request.
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    /// DELETE request.
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::Delete, path)
    }

    /// Add a query parameter.
    pub fn with_query(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.query.insert(key.into(), value.into());
        self
    }

    /// Add a query parameter when `value` is present.
    pub fn with_query_opt<V: Into<ParamValue>>(
        self,
        key: impl Into<String>,
        value: Option<V>,
    ) -> Self {
        match value {
            Some(value) => self.with_query(key, value),
            None => self,
        }
    }

    /// Add a body field, creating the body if needed.
    pub fn with_body_field(mut self, key: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.body
            .get_or_insert_with(Params::new)
            .insert(key.into(), value.into());
        self
    }

    /// Add a body field when `value` is present.
    pub fn with_body_field_opt<V: Into<ParamValue>>(
        self,
        key: impl Into<String>,
        value: Option<V>,
    ) -> Self {
        match value {
            Some(value) => self.with_body_field(key, value),
            None => self,
        }
    }

    /// Replace the whole body.
    pub fn with_body(mut self, body: Params) -> Self {
        self.body = Some(body);
        self
    }

    /// Set the logical resource key used for rate limiting.
    pub fn with_resource_key(mut self, key: impl Into<String>) -> Self {
        self.resource_key = Some(key.into());
        self
    }

    /// Expect a raw byte payload instead of JSON.
    pub fn raw(mut self) -> Self {
        self.response_kind = ResponseKind::Raw;
        self
    }

    /// Rate limiting key: the explicit resource key, or the path.
    pub fn resource_key_or_path(&self) -> &str {
        self.resource_key.as_deref().unwrap_or(&self.path)
    }

    /// Where a page number belongs for this request.
    ///
    /// Write-style paginated endpoints (for example the v1 contact list, which
    /// is a POST) take the page in the body.
    pub fn page_location(&self) -> ParamLocation {
        if self.body.is_some() || self.method.is_write() {
            ParamLocation::Body
        } else {
            ParamLocation::Query
        }
    }

    /// Set a parameter at the given location, replacing any existing value.
    pub fn set_param(
        &mut self,
        location: ParamLocation,
        key: impl Into<String>,
        value: impl Into<ParamValue>,
    ) {
        match location {
            ParamLocation::Query => {
                self.query.insert(key.into(), value.into());
            }
            ParamLocation::Body => {
                self.body
                    .get_or_insert_with(Params::new)
                    .insert(key.into(), value.into());
            }
        }
    }

    /// Query string pairs in wire format.
    pub fn normalized_query(&self) -> Vec<(String, String)> {
        self.query
            .iter()
            .flat_map(|(key, value)| value.query_pairs(key))
            .collect()
    }

    /// JSON body in wire format.
    pub fn normalized_body(&self) -> Option<Value> {
        self.body
            .as_ref()
            .map(|body| ParamValue::Map(body.clone()).normalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    #[test]
    fn test_method_names_agree() {
        for (method, name) in [
            (Method::Get, "GET"),
            (Method::Post, "POST"),
            (Method::Put, "PUT"),
            (Method::Patch, "PATCH"),
            (Method::Delete, "DELETE"),
        ] {
            assert_eq!(method.as_str(), name);
            assert_eq!(method.to_string(), name);
        }
    }

    #[test]
    fn test_query_normalisation() {
        let request = RequestDescriptor::get("/v2.1/calls")
            .with_query("fetch_ai_data", true)
            .with_query(
                "start_date",
                NaiveDate::from_ymd_opt(2023, 1, 5).unwrap(),
            );
        let query = request.normalized_query();
        assert!(query.contains(&("fetch_ai_data".to_string(), "1".to_string())));
        assert!(query.contains(&("start_date".to_string(), "2023-01-05".to_string())));
    }

    #[test]
    fn test_body_normalisation() {
        let request = RequestDescriptor::post("/v2.1/texts/new")
            .with_body_field("body", "hello")
            .with_body_field("restrict_once", false)
            .with_body_field_opt("media_url", None::<String>);
        assert_eq!(
            request.normalized_body(),
            Some(json!({ "body": "hello", "restrict_once": 0 }))
        );
    }

    #[test]
    fn test_page_location() {
        assert_eq!(
            RequestDescriptor::get("/v2.1/users").page_location(),
            ParamLocation::Query
        );
        assert_eq!(
            RequestDescriptor::post("/v1/contacts/list").page_location(),
            ParamLocation::Body
        );

        let mut request = RequestDescriptor::post("/v1/contacts/list");
        request.set_param(ParamLocation::Body, "page", 3);
        assert_eq!(request.normalized_body(), Some(json!({ "page": 3 })));
    }

    #[test]
    fn test_raw_and_method_display() {
        let request = RequestDescriptor::get("/v2.1/calls/1/recording/download").raw();
        assert_eq!(*request.response_kind(), ResponseKind::Raw);
        assert_eq!(Method::Patch.to_string(), "PATCH");
        assert!(Method::Put.is_write());
        assert!(!Method::Delete.is_write());
    }
}
