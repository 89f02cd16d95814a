//! SMS and MMS messages (v2.1).

use crate::JustCallClient;
use futures_util::Stream;
use jcall_core::{PageCursor, ParamValue, RequestDescriptor};
use jcall_error::ApiError;
use serde_json::Value;
use tracing::instrument;

const RESOURCE: &str = "texts";
const TEXTS_PATH: &str = "/v2.1/texts";

/// Filters for listing messages.
#[derive(Debug, Clone, PartialEq)]
pub struct ListMessagesParams {
    /// Start of the period, date or datetime
    pub from_datetime: Option<ParamValue>,
    /// End of the period, date or datetime
    pub to_datetime: Option<ParamValue>,
    /// Id of the last message already fetched
    pub last_sms_id_fetched: Option<i64>,
    /// Contact number in E.164 format
    pub contact_number: Option<String>,
    /// JustCall number in E.164 format
    pub justcall_number: Option<String>,
    /// `Incoming` or `Outgoing`
    pub sms_direction: Option<String>,
    /// Keywords in the message body
    pub sms_content: Option<String>,
    /// Page number (0-based)
    pub page: Option<u32>,
    /// Messages per page, at most 100
    pub per_page: Option<u32>,
    /// Sort field
    pub sort: Option<String>,
    /// `asc` or `desc`
    pub order: Option<String>,
}

impl Default for ListMessagesParams {
    fn default() -> Self {
        Self {
            from_datetime: None,
            to_datetime: None,
            last_sms_id_fetched: None,
            contact_number: None,
            justcall_number: None,
            sms_direction: None,
            sms_content: None,
            page: None,
            per_page: Some(20),
            sort: Some("id".to_string()),
            order: Some("desc".to_string()),
        }
    }
}

impl ListMessagesParams {
    fn apply(&self, request: RequestDescriptor) -> RequestDescriptor {
        request
            .with_query_opt("from_datetime", self.from_datetime.clone())
            .with_query_opt("to_datetime", self.to_datetime.clone())
            .with_query_opt("last_sms_id_fetched", self.last_sms_id_fetched)
            .with_query_opt("contact_number", self.contact_number.clone())
            .with_query_opt("justcall_number", self.justcall_number.clone())
            .with_query_opt("sms_direction", self.sms_direction.clone())
            .with_query_opt("sms_content", self.sms_content.clone())
            .with_query_opt("page", self.page)
            .with_query_opt("per_page", self.per_page)
            .with_query_opt("sort", self.sort.clone())
            .with_query_opt("order", self.order.clone())
    }
}

/// Message endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Messages<'a> {
    client: &'a JustCallClient,
}

impl<'a> Messages<'a> {
    pub(crate) fn new(client: &'a JustCallClient) -> Self {
        Self { client }
    }

    /// One page of messages.
    #[instrument(skip(self, params))]
    pub async fn list(&self, params: &ListMessagesParams) -> Result<Value, ApiError> {
        let request = params.apply(RequestDescriptor::get(TEXTS_PATH).with_resource_key(RESOURCE));
        self.client.send_json(&request).await
    }

    /// One message.
    #[instrument(skip(self))]
    pub async fn get(&self, message_id: i64) -> Result<Value, ApiError> {
        let request = RequestDescriptor::get(format!("{}/{}", TEXTS_PATH, message_id))
            .with_resource_key(RESOURCE);
        self.client.send_json(&request).await
    }

    /// Send a message from a JustCall number.
    #[instrument(skip(self, body, media_url))]
    pub async fn send(
        &self,
        to: &str,
        from: &str,
        body: &str,
        media_url: Option<&str>,
    ) -> Result<Value, ApiError> {
        let request = RequestDescriptor::post(TEXTS_PATH)
            .with_resource_key(RESOURCE)
            .with_body_field("to", to)
            .with_body_field("from", from)
            .with_body_field("body", body)
            .with_body_field_opt("media_url", media_url);
        self.client.send_json(&request).await
    }

    /// Whether a contact has replied to a JustCall number.
    #[instrument(skip(self))]
    pub async fn check_reply(
        &self,
        contact_number: &str,
        justcall_number: Option<&str>,
    ) -> Result<Value, ApiError> {
        let request = RequestDescriptor::post(format!("{}/checkreply", TEXTS_PATH))
            .with_resource_key(RESOURCE)
            .with_body_field("contact_number", contact_number)
            .with_body_field_opt("justcall_number", justcall_number);
        self.client.send_json(&request).await
    }

    /// Send a message. With `restrict_once`, the server drops duplicates sent
    /// to the same contact within 24 hours.
    #[instrument(skip(self, body, media_url))]
    pub async fn send_new(
        &self,
        justcall_number: &str,
        contact_number: &str,
        body: &str,
        media_url: Option<&str>,
        restrict_once: bool,
    ) -> Result<Value, ApiError> {
        let request = RequestDescriptor::post(format!("{}/new", TEXTS_PATH))
            .with_resource_key(RESOURCE)
            .with_body_field("justcall_number", justcall_number)
            .with_body_field("contact_number", contact_number)
            .with_body_field("body", body)
            .with_body_field_opt("media_url", media_url)
            .with_body_field_opt("restrict_once", restrict_once.then_some("Yes"));
        self.client.send_json(&request).await
    }

    /// Every message matching `params`, starting at page 0.
    pub fn iter_all(
        &self,
        params: &ListMessagesParams,
        max_items: Option<usize>,
    ) -> impl Stream<Item = Result<Value, ApiError>> + use<'a> {
        let template = params.apply(RequestDescriptor::get(TEXTS_PATH).with_resource_key(RESOURCE));
        let cursor = PageCursor::starting_at(0).with_max_items(max_items);
        self.client.paginate(template, cursor)
    }
}
