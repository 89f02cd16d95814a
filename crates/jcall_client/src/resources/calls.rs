//! Call records (v2.1).

use crate::JustCallClient;
use futures_util::Stream;
use jcall_core::{PageCursor, ParamValue, RequestDescriptor};
use jcall_error::ApiError;
use serde_json::Value;
use tracing::instrument;

const RESOURCE: &str = "calls";
const CALLS_PATH: &str = "/v2.1/calls";

/// Filters for listing calls.
///
/// Dates accept either a [`chrono::NaiveDate`] or a [`chrono::NaiveDateTime`].
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use jcall_client::ListCallsParams;
///
/// let params = ListCallsParams {
///     fetch_ai_data: true,
///     from_datetime: Some(NaiveDate::from_ymd_opt(2023, 1, 5).unwrap().into()),
///     ..Default::default()
/// };
/// assert_eq!(params.per_page, Some(20));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ListCallsParams {
    /// Include queue data (callback time, wait duration)
    pub fetch_queue_data: bool,
    /// Include AI coaching data
    pub fetch_ai_data: bool,
    /// Start of the period
    pub from_datetime: Option<ParamValue>,
    /// End of the period
    pub to_datetime: Option<ParamValue>,
    /// Contact number with country code
    pub contact_number: Option<String>,
    /// JustCall number
    pub justcall_number: Option<String>,
    /// Agent id
    pub agent_id: Option<i64>,
    /// IVR digit pressed
    pub ivr_digit: Option<i64>,
    /// `Incoming` or `Outgoing`
    pub call_direction: Option<String>,
    /// answered, unanswered, missed, voicemail or abandoned
    pub call_type: Option<String>,
    /// Call traits
    pub call_traits: Option<Vec<String>>,
    /// Page number (0-based)
    pub page: Option<u32>,
    /// Calls per page, 20 to 100
    pub per_page: Option<u32>,
    /// Sort field
    pub sort: Option<String>,
    /// `asc` or `desc`
    pub order: Option<String>,
    /// Id of the last call already fetched
    pub last_call_id_fetched: Option<i64>,
}

impl Default for ListCallsParams {
    fn default() -> Self {
        Self {
            fetch_queue_data: false,
            fetch_ai_data: false,
            from_datetime: None,
            to_datetime: None,
            contact_number: None,
            justcall_number: None,
            agent_id: None,
            ivr_digit: None,
            call_direction: None,
            call_type: None,
            call_traits: None,
            page: None,
            per_page: Some(20),
            sort: Some("id".to_string()),
            order: Some("desc".to_string()),
            last_call_id_fetched: None,
        }
    }
}

impl ListCallsParams {
    fn apply(&self, request: RequestDescriptor) -> RequestDescriptor {
        request
            .with_query("fetch_queue_data", self.fetch_queue_data)
            .with_query("fetch_ai_data", self.fetch_ai_data)
            .with_query_opt("from_datetime", self.from_datetime.clone())
            .with_query_opt("to_datetime", self.to_datetime.clone())
            .with_query_opt("contact_number", self.contact_number.clone())
            .with_query_opt("justcall_number", self.justcall_number.clone())
            .with_query_opt("agent_id", self.agent_id)
            .with_query_opt("ivr_digit", self.ivr_digit)
            .with_query_opt("call_direction", self.call_direction.clone())
            .with_query_opt("call_type", self.call_type.clone())
            .with_query_opt("call_traits", self.call_traits.clone())
            .with_query_opt("page", self.page)
            .with_query_opt("per_page", self.per_page)
            .with_query_opt("sort", self.sort.clone())
            .with_query_opt("order", self.order.clone())
            .with_query_opt("last_call_id_fetched", self.last_call_id_fetched)
    }
}

/// Fields to change on a call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateCall {
    /// Replacement notes
    pub notes: Option<String>,
    /// Disposition code from the account's configured options
    pub disposition_code: Option<String>,
    /// Rating from 0 to 5 in steps of 0.5
    pub rating: Option<f64>,
}

/// Call endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Calls<'a> {
    client: &'a JustCallClient,
}

impl<'a> Calls<'a> {
    pub(crate) fn new(client: &'a JustCallClient) -> Self {
        Self { client }
    }

    /// One page of calls.
    #[instrument(skip(self, params))]
    pub async fn list(&self, params: &ListCallsParams) -> Result<Value, ApiError> {
        let request = params.apply(RequestDescriptor::get(CALLS_PATH).with_resource_key(RESOURCE));
        self.client.send_json(&request).await
    }

    /// One call.
    #[instrument(skip(self))]
    pub async fn get(
        &self,
        call_id: i64,
        fetch_queue_data: bool,
        fetch_ai_data: bool,
    ) -> Result<Value, ApiError> {
        let request = RequestDescriptor::get(format!("{}/{}", CALLS_PATH, call_id))
            .with_resource_key(RESOURCE)
            .with_query("fetch_queue_data", fetch_queue_data)
            .with_query("fetch_ai_data", fetch_ai_data);
        self.client.send_json(&request).await
    }

    /// Update notes, disposition or rating of a call.
    #[instrument(skip(self, update))]
    pub async fn update(&self, call_id: i64, update: &UpdateCall) -> Result<Value, ApiError> {
        let request = RequestDescriptor::put(format!("{}/{}", CALLS_PATH, call_id))
            .with_resource_key(RESOURCE)
            .with_body(Default::default())
            .with_body_field_opt("notes", update.notes.clone())
            .with_body_field_opt("disposition_code", update.disposition_code.clone())
            .with_body_field_opt("rating", update.rating);
        self.client.send_json(&request).await
    }

    /// Journey of a call through IVRs, queues and agents.
    #[instrument(skip(self))]
    pub async fn journey(&self, call_id: i64) -> Result<Value, ApiError> {
        let request = RequestDescriptor::get(format!("{}/{}/journey", CALLS_PATH, call_id))
            .with_resource_key(RESOURCE);
        self.client.send_json(&request).await
    }

    /// Voice agent data of a call.
    #[instrument(skip(self))]
    pub async fn voice_agent_data(&self, call_id: i64) -> Result<Value, ApiError> {
        let request = RequestDescriptor::get(format!("{}/{}/voice-agent", CALLS_PATH, call_id))
            .with_resource_key(RESOURCE);
        self.client.send_json(&request).await
    }

    /// Recording audio, as returned by the server.
    #[instrument(skip(self))]
    pub async fn download_recording(&self, call_id: i64) -> Result<Vec<u8>, ApiError> {
        let request =
            RequestDescriptor::get(format!("{}/{}/recording/download", CALLS_PATH, call_id))
                .with_resource_key(RESOURCE)
                .raw();
        Ok(self.client.send(&request).await?.into_bytes())
    }

    /// Every call matching `params`, starting at page 0.
    ///
    /// Any page number in `params` is overridden.
    pub fn iter_all(
        &self,
        params: &ListCallsParams,
        max_items: Option<usize>,
    ) -> impl Stream<Item = Result<Value, ApiError>> + use<'a> {
        let template = params.apply(RequestDescriptor::get(CALLS_PATH).with_resource_key(RESOURCE));
        let cursor = PageCursor::starting_at(0).with_max_items(max_items);
        self.client.paginate(template, cursor)
    }
}
