//! Sales dialer campaigns, their calls and their contacts (v1).

use crate::JustCallClient;
use chrono::NaiveDate;
use futures_util::Stream;
use jcall_core::{PageCursor, Params, RequestDescriptor};
use jcall_error::ApiError;
use serde_json::Value;
use tracing::instrument;

const RESOURCE: &str = "autodialer";
const CAMPAIGNS_LIST_PATH: &str = "/v1/autodialer/campaigns/list";
const CAMPAIGN_CALLS_PATH: &str = "/v1/autodialer/calls/list";
const MAX_PER_PAGE: u32 = 100;

/// Campaign dialing mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::IntoStaticStr)]
#[strum(serialize_all = "snake_case")]
pub enum CampaignType {
    /// Dial one contact after another
    Autodial,
    /// Dial ahead of agent availability
    Predictive,
    /// Dial several contacts at once
    Dynamic,
}

/// Campaign endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Campaigns<'a> {
    client: &'a JustCallClient,
}

impl<'a> Campaigns<'a> {
    pub(crate) fn new(client: &'a JustCallClient) -> Self {
        Self { client }
    }

    /// One page of campaigns.
    #[instrument(skip(self))]
    pub async fn list(&self, page: u32, per_page: u32) -> Result<Value, ApiError> {
        let request = RequestDescriptor::post(CAMPAIGNS_LIST_PATH)
            .with_resource_key(RESOURCE)
            .with_body_field("page", page)
            .with_body_field("per_page", per_page);
        self.client.send_json(&request).await
    }

    /// Create a campaign.
    ///
    /// `country_code` is ISO 3166-1 alpha-2.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        name: &str,
        campaign_type: CampaignType,
        default_number: Option<&str>,
        country_code: Option<&str>,
    ) -> Result<Value, ApiError> {
        let type_name: &'static str = campaign_type.into();
        let request = RequestDescriptor::post("/v1/autodialer/campaigns/create")
            .with_resource_key(RESOURCE)
            .with_body_field("name", name)
            .with_body_field("type", type_name)
            .with_body_field_opt("default_number", default_number)
            .with_body_field_opt("country_code", country_code);
        self.client.send_json(&request).await
    }

    /// Every campaign, starting at page 1.
    pub fn iter_all(
        &self,
        max_items: Option<usize>,
    ) -> impl Stream<Item = Result<Value, ApiError>> + use<'a> {
        let template = RequestDescriptor::post(CAMPAIGNS_LIST_PATH)
            .with_resource_key(RESOURCE)
            .with_body_field("per_page", MAX_PER_PAGE);
        let cursor = PageCursor::new("page", "data", 1).with_max_items(max_items);
        self.client.paginate(template, cursor)
    }
}

/// Filters for calls made by the sales dialer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CampaignCallFilter {
    /// Campaign to fetch calls from; all campaigns when unset
    pub campaign_id: Option<String>,
    /// First day of the period
    pub start_date: Option<NaiveDate>,
    /// Last day of the period
    pub end_date: Option<NaiveDate>,
    /// Oldest first
    pub ascending: Option<bool>,
}

impl CampaignCallFilter {
    fn apply(&self, request: RequestDescriptor) -> RequestDescriptor {
        request
            .with_body(Params::new())
            .with_body_field_opt("campaign_id", self.campaign_id.clone())
            .with_body_field_opt("start_date", self.start_date)
            .with_body_field_opt("end_date", self.end_date)
            .with_body_field_opt("order", self.ascending.map(|asc| if asc { "0" } else { "1" }))
    }
}

/// Sales dialer call endpoints.
#[derive(Debug, Clone, Copy)]
pub struct CampaignCalls<'a> {
    client: &'a JustCallClient,
}

impl<'a> CampaignCalls<'a> {
    pub(crate) fn new(client: &'a JustCallClient) -> Self {
        Self { client }
    }

    /// One page of dialer calls.
    #[instrument(skip(self, filter))]
    pub async fn list(
        &self,
        filter: &CampaignCallFilter,
        page: u32,
        per_page: u32,
    ) -> Result<Value, ApiError> {
        let request = filter
            .apply(RequestDescriptor::post(CAMPAIGN_CALLS_PATH).with_resource_key(RESOURCE))
            .with_body_field("page", page)
            .with_body_field("per_page", per_page);
        self.client.send_json(&request).await
    }

    /// Every dialer call matching `filter`, starting at page 1.
    pub fn iter_all(
        &self,
        filter: &CampaignCallFilter,
        max_items: Option<usize>,
    ) -> impl Stream<Item = Result<Value, ApiError>> + use<'a> {
        let template = filter
            .apply(RequestDescriptor::post(CAMPAIGN_CALLS_PATH).with_resource_key(RESOURCE))
            .with_body_field("per_page", MAX_PER_PAGE);
        let cursor = PageCursor::new("page", "data", 1).with_max_items(max_items);
        self.client.paginate(template, cursor)
    }
}

/// Campaign membership endpoints.
#[derive(Debug, Clone, Copy)]
pub struct CampaignContacts<'a> {
    client: &'a JustCallClient,
}

impl<'a> CampaignContacts<'a> {
    pub(crate) fn new(client: &'a JustCallClient) -> Self {
        Self { client }
    }

    /// Custom contact fields defined for the dialer.
    #[instrument(skip(self))]
    pub async fn custom_fields(&self) -> Result<Value, ApiError> {
        let request = RequestDescriptor::post("/v1/autodialer/contacts/customfields")
            .with_resource_key(RESOURCE)
            .with_body(Params::new());
        self.client.send_json(&request).await
    }

    /// Every contact in a campaign. The endpoint is not paginated.
    #[instrument(skip(self))]
    pub async fn list(&self, campaign_id: &str) -> Result<Value, ApiError> {
        let request = RequestDescriptor::post("/v1/autodialer/campaigns/campaign-contacts")
            .with_resource_key(RESOURCE)
            .with_body_field("campaign_id", campaign_id);
        self.client.send_json(&request).await
    }

    /// Add a contact to a campaign.
    #[instrument(skip(self, custom_props))]
    pub async fn add(
        &self,
        campaign_id: &str,
        phone: &str,
        first_name: Option<&str>,
        last_name: Option<&str>,
        custom_props: Option<Params>,
    ) -> Result<Value, ApiError> {
        let request = RequestDescriptor::post("/v1/autodialer/campaigns/add")
            .with_resource_key(RESOURCE)
            .with_body_field("campaign_id", campaign_id)
            .with_body_field("phone", phone)
            .with_body_field_opt("first_name", first_name)
            .with_body_field_opt("last_name", last_name)
            .with_body_field_opt("custom_props", custom_props);
        self.client.send_json(&request).await
    }

    /// Remove a contact from one campaign, or from every campaign when
    /// `campaign_id` is unset. With `all`, empties the campaign.
    #[instrument(skip(self))]
    pub async fn remove(
        &self,
        campaign_id: Option<&str>,
        phone: Option<&str>,
        all: bool,
    ) -> Result<Value, ApiError> {
        let request = RequestDescriptor::post("/v1/autodialer/contacts/remove")
            .with_resource_key(RESOURCE)
            .with_body(Params::new())
            .with_body_field_opt("campaign_id", campaign_id)
            .with_body_field_opt("phone", phone)
            .with_body_field_opt("all", all.then_some(true));
        self.client.send_json(&request).await
    }
}
