//! Thin wrappers over the JustCall endpoints.
//!
//! Each wrapper borrows a [`JustCallClient`](crate::JustCallClient) and turns
//! typed arguments into a [`RequestDescriptor`](jcall_core::RequestDescriptor).
//! Responses are returned as JSON documents.

mod calls;
mod campaigns;
mod contacts;
mod messages;
mod phone_numbers;
mod users;

pub use calls::{Calls, ListCallsParams, UpdateCall};
pub use campaigns::{CampaignCallFilter, CampaignCalls, CampaignContacts, CampaignType, Campaigns};
pub use contacts::{ContactDetails, ContactList, ContactQuery, Contacts};
pub use messages::{ListMessagesParams, Messages};
pub use phone_numbers::{ListPhoneNumbersParams, PhoneNumbers};
pub use users::{ListUsersParams, Users};
