//! Users and agents (v2.1).

use crate::JustCallClient;
use futures_util::Stream;
use jcall_core::{PageCursor, RequestDescriptor};
use jcall_error::ApiError;
use serde_json::Value;
use tracing::instrument;

const RESOURCE: &str = "users";
const USERS_PATH: &str = "/v2.1/users";

/// Filters for listing users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListUsersParams {
    /// Only agents currently available
    pub available: bool,
    /// User group id
    pub group_id: Option<i64>,
    /// Role name
    pub role: Option<String>,
    /// Page number (0-based)
    pub page: Option<u32>,
    /// Users per page, at most 100
    pub per_page: Option<u32>,
    /// `asc` or `desc`
    pub order: Option<String>,
}

impl Default for ListUsersParams {
    fn default() -> Self {
        Self {
            available: false,
            group_id: None,
            role: None,
            page: Some(0),
            per_page: Some(50),
            order: Some("desc".to_string()),
        }
    }
}

impl ListUsersParams {
    fn apply(&self, request: RequestDescriptor) -> RequestDescriptor {
        request
            .with_query("available", self.available)
            .with_query_opt("group_id", self.group_id)
            .with_query_opt("role", self.role.clone())
            .with_query_opt("page", self.page)
            .with_query_opt("per_page", self.per_page)
            .with_query_opt("order", self.order.clone())
    }
}

/// User endpoints.
#[derive(Debug, Clone, Copy)]
pub struct Users<'a> {
    client: &'a JustCallClient,
}

impl<'a> Users<'a> {
    pub(crate) fn new(client: &'a JustCallClient) -> Self {
        Self { client }
    }

    /// One page of users.
    #[instrument(skip(self, params))]
    pub async fn list(&self, params: &ListUsersParams) -> Result<Value, ApiError> {
        let request = params.apply(RequestDescriptor::get(USERS_PATH).with_resource_key(RESOURCE));
        self.client.send_json(&request).await
    }

    /// One user.
    #[instrument(skip(self))]
    pub async fn get(&self, user_id: i64) -> Result<Value, ApiError> {
        let request = RequestDescriptor::get(format!("{}/{}", USERS_PATH, user_id))
            .with_resource_key(RESOURCE);
        self.client.send_json(&request).await
    }

    /// Every user matching `params`, starting at page 0.
    pub fn iter_all(
        &self,
        params: &ListUsersParams,
        max_items: Option<usize>,
    ) -> impl Stream<Item = Result<Value, ApiError>> + use<'a> {
        let template = params.apply(RequestDescriptor::get(USERS_PATH).with_resource_key(RESOURCE));
        let cursor = PageCursor::starting_at(0).with_max_items(max_items);
        self.client.paginate(template, cursor)
    }
}
