//! Resource wrappers build the expected requests.

mod test_utils;

use chrono::NaiveDate;
use futures::TryStreamExt;
use jcall_client::{
    CampaignCallFilter, CampaignType, ContactDetails, ContactList, JustCallClient,
    ListMessagesParams, ListUsersParams,
};
use jcall_core::Method;
use serde_json::{Value, json};
use std::sync::Arc;
use test_utils::{MockResponse, MockTransport, fast_settings};

fn ok_client() -> (MockTransport, JustCallClient) {
    let mock = MockTransport::new_always(MockResponse::json(200, json!({"status": "success"})));
    let client = JustCallClient::with_transport(Arc::new(mock.clone()), &fast_settings());
    (mock, client)
}

fn has_query(query: &[(String, String)], key: &str, value: &str) -> bool {
    query.iter().any(|(k, v)| k == key && v == value)
}

#[tokio::test]
async fn test_send_message() -> anyhow::Result<()> {
    let (mock, client) = ok_client();

    client
        .messages()
        .send("+15550001111", "+15552223333", "Hello", None)
        .await?;

    let sent = &mock.requests()[0];
    assert_eq!(sent.method, Method::Post);
    assert_eq!(sent.path, "/v2.1/texts");
    assert_eq!(
        sent.body,
        Some(json!({"to": "+15550001111", "from": "+15552223333", "body": "Hello"}))
    );
    Ok(())
}

#[tokio::test]
async fn test_send_new_restrict_once() -> anyhow::Result<()> {
    let (mock, client) = ok_client();

    client
        .messages()
        .send_new("+15552223333", "+15550001111", "Hi", None, true)
        .await?;
    client
        .messages()
        .send_new("+15552223333", "+15550001111", "Hi", None, false)
        .await?;

    let requests = mock.requests();
    assert_eq!(requests[0].path, "/v2.1/texts/new");
    assert_eq!(requests[0].body.as_ref().unwrap()["restrict_once"], json!("Yes"));
    assert!(requests[1].body.as_ref().unwrap().get("restrict_once").is_none());
    Ok(())
}

#[tokio::test]
async fn test_list_messages_defaults() -> anyhow::Result<()> {
    let (mock, client) = ok_client();

    let params = ListMessagesParams {
        contact_number: Some("+15550001111".to_string()),
        ..Default::default()
    };
    client.messages().list(&params).await?;

    let query = &mock.requests()[0].query;
    assert!(has_query(query, "contact_number", "+15550001111"));
    assert!(has_query(query, "per_page", "20"));
    assert!(has_query(query, "order", "desc"));
    assert!(!query.iter().any(|(k, _)| k == "page"));
    Ok(())
}

#[tokio::test]
async fn test_list_users_sends_available_flag() -> anyhow::Result<()> {
    let (mock, client) = ok_client();

    let params = ListUsersParams {
        available: true,
        ..Default::default()
    };
    client.users().list(&params).await?;

    let query = &mock.requests()[0].query;
    assert!(has_query(query, "available", "1"));
    assert!(has_query(query, "page", "0"));
    assert!(has_query(query, "per_page", "50"));
    Ok(())
}

#[tokio::test]
async fn test_contact_create_and_action() -> anyhow::Result<()> {
    let (mock, client) = ok_client();

    let details = ContactDetails {
        firstname: "Ada".to_string(),
        phone: "+15550001111".to_string(),
        email: Some("ada@example.com".to_string()),
        ..Default::default()
    };
    client.contacts().create(&details, Some(true), None).await?;
    client
        .contacts()
        .set_listed("+15550001111", ContactList::DoNotDisturb, true, false)
        .await?;

    let requests = mock.requests();
    assert_eq!(requests[0].path, "/v1/contacts/new");
    assert_eq!(
        requests[0].body,
        Some(json!({
            "firstname": "Ada",
            "phone": "+15550001111",
            "email": "ada@example.com",
            "acrossteam": 1
        }))
    );
    assert_eq!(requests[1].path, "/v1/contacts/action");
    assert_eq!(
        requests[1].body,
        Some(json!({"number": "+15550001111", "type": "1", "action": "1", "acrossteam": "0"}))
    );
    Ok(())
}

#[tokio::test]
async fn test_campaign_create() -> anyhow::Result<()> {
    let (mock, client) = ok_client();

    client
        .campaigns()
        .create("Spring outreach", CampaignType::Predictive, None, Some("US"))
        .await?;

    assert_eq!(
        mock.requests()[0].body,
        Some(json!({"name": "Spring outreach", "type": "predictive", "country_code": "US"}))
    );
    Ok(())
}

#[tokio::test]
async fn test_campaign_calls_iterate_from_page_one() -> anyhow::Result<()> {
    let mock = MockTransport::new_sequence(vec![
        MockResponse::json(200, json!({"data": [{"id": 1}]})),
        MockResponse::json(200, json!({"data": []})),
    ]);
    let client = JustCallClient::with_transport(Arc::new(mock.clone()), &fast_settings());

    let filter = CampaignCallFilter {
        campaign_id: Some("c-1".to_string()),
        start_date: NaiveDate::from_ymd_opt(2024, 3, 1),
        ascending: Some(true),
        ..Default::default()
    };
    let items: Vec<Value> = client
        .campaign_calls()
        .iter_all(&filter, None)
        .try_collect()
        .await?;

    assert_eq!(items, vec![json!({"id": 1})]);
    let first = mock.requests()[0].body.clone().unwrap();
    assert_eq!(
        first,
        json!({
            "campaign_id": "c-1",
            "start_date": "2024-03-01",
            "order": "0",
            "page": 1,
            "per_page": 100
        })
    );
    Ok(())
}

#[tokio::test]
async fn test_campaign_contact_remove_all() -> anyhow::Result<()> {
    let (mock, client) = ok_client();

    client
        .campaign_contacts()
        .remove(Some("c-1"), None, true)
        .await?;

    let sent = &mock.requests()[0];
    assert_eq!(sent.path, "/v1/autodialer/contacts/remove");
    assert_eq!(sent.body, Some(json!({"campaign_id": "c-1", "all": 1})));
    Ok(())
}

#[tokio::test]
async fn test_resource_keys_drive_limiter_counts() -> anyhow::Result<()> {
    let (_mock, client) = ok_client();

    client.calls().journey(1).await?;
    client.calls().voice_agent_data(1).await?;
    client.messages().get(2).await?;

    let metrics = client.limiter().metrics().await;
    assert_eq!(metrics.endpoint_counts.get("calls"), Some(&2));
    assert_eq!(metrics.endpoint_counts.get("texts"), Some(&1));
    Ok(())
}
