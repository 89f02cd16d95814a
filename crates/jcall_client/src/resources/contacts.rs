//! Contacts (v1).
//!
//! The v1 contact endpoints are all POST with a JSON body, including the
//! listings, so page numbers travel in the body. Pages start at 1.

use crate::JustCallClient;
use futures_util::Stream;
use jcall_core::{PageCursor, RequestDescriptor};
use jcall_error::ApiError;
use serde_json::Value;
use tracing::instrument;

const RESOURCE: &str = "contacts";

/// Search fields for a contact query. Unset fields are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactQuery {
    /// Contact id
    pub id: Option<i64>,
    /// First name
    pub firstname: Option<String>,
    /// Last name
    pub lastname: Option<String>,
    /// Phone number
    pub phone: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// Company name
    pub company: Option<String>,
    /// Notes
    pub notes: Option<String>,
}

impl ContactQuery {
    fn apply(&self, request: RequestDescriptor) -> RequestDescriptor {
        request
            .with_body_field_opt("id", self.id)
            .with_body_field_opt("firstname", self.firstname.clone())
            .with_body_field_opt("lastname", self.lastname.clone())
            .with_body_field_opt("phone", self.phone.clone())
            .with_body_field_opt("email", self.email.clone())
            .with_body_field_opt("company", self.company.clone())
            .with_body_field_opt("notes", self.notes.clone())
    }
}

/// Details of a contact to create or update.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContactDetails {
    /// First name
    pub firstname: String,
    /// Phone number
    pub phone: String,
    /// Last name
    pub lastname: Option<String>,
    /// Email address
    pub email: Option<String>,
    /// Company name
    pub company: Option<String>,
    /// Notes
    pub notes: Option<String>,
}

impl ContactDetails {
    fn apply(&self, request: RequestDescriptor) -> RequestDescriptor {
        request
            .with_body_field("firstname", self.firstname.as_str())
            .with_body_field("phone", self.phone.as_str())
            .with_body_field_opt("lastname", self.lastname.clone())
            .with_body_field_opt("email", self.email.clone())
            .with_body_field_opt("company", self.company.clone())
            .with_body_field_opt("notes", self.notes.clone())
    }
}

/// List a number can be placed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContactList {
    /// Blacklist
    Blacklist,
    /// Do not disturb
    DoNotDisturb,
    /// Do not message
    DoNotMessage,
}

impl ContactList {
    fn code(&self) -> &'static str {
        match self {
            ContactList::Blacklist => "0",
            ContactList::DoNotDisturb => "1",
            ContactList::DoNotMessage => "2",
        }
    }
}

/// Contact endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Contacts<'a> {
    client: &'a JustCallClient,
}

impl<'a> Contacts<'a> {
    pub(crate) fn new(client: &'a JustCallClient) -> Self {
        Self { client }
    }

    /// One page of contacts.
    #[instrument(skip(self))]
    pub async fn list(&self, page: u32, per_page: u32) -> Result<Value, ApiError> {
        let request = RequestDescriptor::post("/v1/contacts/list")
            .with_resource_key(RESOURCE)
            .with_body_field("page", page)
            .with_body_field("per_page", per_page);
        self.client.send_json(&request).await
    }

    /// Every contact, starting at page 1.
    pub fn iter_all(
        &self,
        per_page: u32,
        max_items: Option<usize>,
    ) -> impl Stream<Item = Result<Value, ApiError>> + use<'a> {
        let template = RequestDescriptor::post("/v1/contacts/list")
            .with_resource_key(RESOURCE)
            .with_body_field("per_page", per_page);
        let cursor = PageCursor::new("page", "data", 1).with_max_items(max_items);
        self.client.paginate(template, cursor)
    }

    /// One page of contacts matching `query`.
    #[instrument(skip(self, query))]
    pub async fn query(
        &self,
        query: &ContactQuery,
        page: u32,
        per_page: u32,
    ) -> Result<Value, ApiError> {
        let request = query
            .apply(RequestDescriptor::post("/v1/contacts/query").with_resource_key(RESOURCE))
            .with_body_field("page", page)
            .with_body_field("per_page", per_page);
        self.client.send_json(&request).await
    }

    /// Every contact matching `query`, starting at page 1.
    ///
    /// Query results are returned under `contacts` rather than `data`.
    pub fn iter_query(
        &self,
        query: &ContactQuery,
        max_items: Option<usize>,
    ) -> impl Stream<Item = Result<Value, ApiError>> + use<'a> {
        let template = query
            .apply(RequestDescriptor::post("/v1/contacts/query").with_resource_key(RESOURCE))
            .with_body_field("per_page", 100u32);
        let cursor = PageCursor::new("page", "contacts", 1).with_max_items(max_items);
        self.client.paginate(template, cursor)
    }

    /// Create a contact.
    ///
    /// `across_team` makes the contact visible to the whole team; `agent_id`
    /// creates it for one agent.
    #[instrument(skip(self, details))]
    pub async fn create(
        &self,
        details: &ContactDetails,
        across_team: Option<bool>,
        agent_id: Option<i64>,
    ) -> Result<Value, ApiError> {
        let request = details
            .apply(RequestDescriptor::post("/v1/contacts/new").with_resource_key(RESOURCE))
            .with_body_field_opt("acrossteam", across_team)
            .with_body_field_opt("agentid", agent_id);
        self.client.send_json(&request).await
    }

    /// Replace the details of an existing contact.
    #[instrument(skip(self, details))]
    pub async fn update(&self, id: i64, details: &ContactDetails) -> Result<Value, ApiError> {
        let request = details
            .apply(RequestDescriptor::post("/v1/contacts/update").with_resource_key(RESOURCE))
            .with_body_field("id", id);
        self.client.send_json(&request).await
    }

    /// Delete a contact.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<Value, ApiError> {
        let request = RequestDescriptor::post("/v1/contacts/delete")
            .with_resource_key(RESOURCE)
            .with_body_field("id", id);
        self.client.send_json(&request).await
    }

    /// Add a number to, or remove it from, a blocking list.
    #[instrument(skip(self))]
    pub async fn set_listed(
        &self,
        number: &str,
        list: ContactList,
        listed: bool,
        across_team: bool,
    ) -> Result<Value, ApiError> {
        let request = RequestDescriptor::post("/v1/contacts/action")
            .with_resource_key(RESOURCE)
            .with_body_field("number", number)
            .with_body_field("type", list.code())
            .with_body_field("action", if listed { "1" } else { "0" })
            .with_body_field("acrossteam", if across_team { "1" } else { "0" });
        self.client.send_json(&request).await
    }
}
