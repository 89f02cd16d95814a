//! JustCall phone numbers (v2.1).

use crate::JustCallClient;
use jcall_core::RequestDescriptor;
use jcall_error::ApiError;
use serde_json::Value;
use tracing::instrument;

const RESOURCE: &str = "phone-numbers";
const NUMBERS_PATH: &str = "/v2.1/phone-numbers";

/// Filters for listing phone numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListPhoneNumbersParams {
    /// Phone line name
    pub justcall_line_name: Option<String>,
    /// Business hours setting (Always Open, Always Closed, Custom Hours)
    pub availability_setting: Option<String>,
    /// local, mobile or toll_free
    pub number_type: Option<String>,
    /// Owning agent
    pub number_owner_id: Option<i64>,
    /// Agent the number is shared with
    pub shared_agent_id: Option<i64>,
    /// Group the number is shared with
    pub shared_group_id: Option<i64>,
    /// call, sms or mms
    pub capabilities: Option<String>,
    /// Numbers per page, at most 100
    pub per_page: Option<u32>,
    /// Page number (0-based)
    pub page: Option<u32>,
    /// `asc` or `desc`
    pub order: Option<String>,
}

impl Default for ListPhoneNumbersParams {
    fn default() -> Self {
        Self {
            justcall_line_name: None,
            availability_setting: None,
            number_type: None,
            number_owner_id: None,
            shared_agent_id: None,
            shared_group_id: None,
            capabilities: None,
            per_page: Some(30),
            page: None,
            order: None,
        }
    }
}

/// Phone number endpoints.
#[derive(Debug, Clone, Copy)]
pub struct PhoneNumbers<'a> {
    client: &'a JustCallClient,
}

impl<'a> PhoneNumbers<'a> {
    pub(crate) fn new(client: &'a JustCallClient) -> Self {
        Self { client }
    }

    /// One page of phone numbers.
    #[instrument(skip(self, params))]
    pub async fn list(&self, params: &ListPhoneNumbersParams) -> Result<Value, ApiError> {
        let request = RequestDescriptor::get(NUMBERS_PATH)
            .with_resource_key(RESOURCE)
            .with_query_opt("justcall_line_name", params.justcall_line_name.clone())
            .with_query_opt("availability_setting", params.availability_setting.clone())
            .with_query_opt("number_type", params.number_type.clone())
            .with_query_opt("number_owner_id", params.number_owner_id)
            .with_query_opt("shared_agent_id", params.shared_agent_id)
            .with_query_opt("shared_group_id", params.shared_group_id)
            .with_query_opt("capabilities", params.capabilities.clone())
            .with_query_opt("per_page", params.per_page)
            .with_query_opt("page", params.page)
            .with_query_opt("order", params.order.clone());
        self.client.send_json(&request).await
    }

    /// One phone number.
    #[instrument(skip(self))]
    pub async fn get(&self, number_id: i64) -> Result<Value, ApiError> {
        let request = RequestDescriptor::get(format!("{}/{}", NUMBERS_PATH, number_id))
            .with_resource_key(RESOURCE);
        self.client.send_json(&request).await
    }
}
