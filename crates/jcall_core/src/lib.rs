//! Core data types for the jcall JustCall API client.
//!
//! This crate provides the request model shared by every layer of the request
//! pipeline: parameter values and their wire normalisation, request descriptors,
//! response payloads and the page cursor used by pagination.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod page;
mod params;
mod request;
mod response;
mod telemetry;

pub use page::{DEFAULT_ITEMS_FIELD, DEFAULT_PAGE_FIELD, PageCursor};
pub use params::{
    API_DATE_FORMAT, API_DATETIME_FORMAT, ParamValue, Params, from_api_date, from_api_datetime,
    normalize_json, to_api_date, to_api_datetime,
};
pub use request::{Method, ParamLocation, RequestDescriptor, ResponseKind};
pub use response::ApiResponse;
pub use telemetry::{init_tracing, init_tracing_json};
