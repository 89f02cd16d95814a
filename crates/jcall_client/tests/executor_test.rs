//! Request executor behaviour over a scripted transport.

mod test_utils;

use chrono::NaiveDate;
use jcall_client::{JustCallClient, SUSTAINED_THROTTLE_EVENTS};
use jcall_core::{ApiResponse, Method, RequestDescriptor};
use jcall_error::ApiErrorKind;
use jcall_rate_limit::RetryPolicy;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use test_utils::{MockResponse, MockTransport, fast_settings};
use tokio::time::Instant;

fn client_over(mock: &MockTransport) -> JustCallClient {
    JustCallClient::with_transport(Arc::new(mock.clone()), &fast_settings())
}

#[tokio::test]
async fn test_send_returns_json_and_normalises_params() -> anyhow::Result<()> {
    let mock = MockTransport::new_always(MockResponse::json(200, json!({"data": [{"id": 7}]})));
    let client = client_over(&mock);

    let request = RequestDescriptor::get("/v2.1/calls")
        .with_query("fetch_ai_data", true)
        .with_query("start_date", NaiveDate::from_ymd_opt(2023, 1, 5).unwrap());
    let body = client.send_json(&request).await?;

    assert_eq!(body, json!({"data": [{"id": 7}]}));
    let sent = mock.requests();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].method, Method::Get);
    assert!(sent[0].query.contains(&("fetch_ai_data".to_string(), "1".to_string())));
    assert!(sent[0].query.contains(&("start_date".to_string(), "2023-01-05".to_string())));
    Ok(())
}

#[tokio::test]
async fn test_body_is_normalised() -> anyhow::Result<()> {
    let mock = MockTransport::new_always(MockResponse::json(200, json!({"status": "success"})));
    let client = client_over(&mock);

    let request = RequestDescriptor::post("/v1/contacts/new")
        .with_body_field("firstname", "Ada")
        .with_body_field("acrossteam", false);
    client.send_json(&request).await?;

    assert_eq!(
        mock.requests()[0].body,
        Some(json!({"firstname": "Ada", "acrossteam": 0}))
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_retryable_status_exhausts_attempts() {
    let mock = MockTransport::new_always(MockResponse::json(503, json!({"message": "down"})));
    let client = client_over(&mock);

    let err = client
        .send(&RequestDescriptor::get("/v2.1/users"))
        .await
        .unwrap_err();

    assert_eq!(mock.call_count(), 4);
    assert_eq!(err.attempts(), 4);
    assert!(err.retries_exhausted());
    assert_eq!(err.status(), 503);
    assert_eq!(err.message(), "down");
}

#[tokio::test(start_paused = true)]
async fn test_not_found_fails_immediately() {
    let mock = MockTransport::new_always(MockResponse::json(404, json!({"message": "No call"})));
    let client = client_over(&mock);

    let start = Instant::now();
    let err = client
        .send(&RequestDescriptor::get("/v2.1/calls/1"))
        .await
        .unwrap_err();

    assert_eq!(mock.call_count(), 1);
    assert!(start.elapsed() < Duration::from_millis(10));
    assert!(matches!(err.kind(), ApiErrorKind::Client { status: 404, .. }));
    assert_eq!(err.attempts(), 1);
    assert!(!err.retries_exhausted());
}

#[tokio::test(start_paused = true)]
async fn test_transport_error_is_retried() -> anyhow::Result<()> {
    let mock = MockTransport::new_sequence(vec![
        MockResponse::transport_error("connection reset"),
        MockResponse::json(200, json!({"id": 1})),
    ]);
    let client = client_over(&mock);

    let body = client.send_json(&RequestDescriptor::get("/v2.1/users/1")).await?;

    assert_eq!(body, json!({"id": 1}));
    assert_eq!(mock.call_count(), 2);
    Ok(())
}

#[tokio::test]
async fn test_malformed_json_is_not_retried() {
    let mock = MockTransport::new_always(MockResponse::bytes(200, b"<html>oops</html>"));
    let client = client_over(&mock);

    let err = client
        .send(&RequestDescriptor::get("/v2.1/texts"))
        .await
        .unwrap_err();

    assert_eq!(mock.call_count(), 1);
    assert!(matches!(err.kind(), ApiErrorKind::MalformedResponse { status: 200, .. }));
}

#[tokio::test]
async fn test_raw_payload_is_untouched() -> anyhow::Result<()> {
    let audio = [0x49, 0x44, 0x33, 0x04, 0x00, 0xff];
    let mock = MockTransport::new_always(MockResponse::bytes(200, &audio));
    let client = client_over(&mock);

    let response = client
        .send(&RequestDescriptor::get("/v2.1/calls/9/recording/download").raw())
        .await?;

    assert_eq!(
        response,
        ApiResponse::Raw {
            status: 200,
            bytes: audio.to_vec(),
        }
    );
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_throttled_then_success_waits_for_reset() -> anyhow::Result<()> {
    let mock = MockTransport::new_sequence(vec![
        MockResponse::json_with_headers(
            429,
            json!({"message": "Too many requests"}),
            &[("X-Rate-Limit-Burst-Remaining", "0"), ("X-Rate-Limit-Burst-Reset", "5")],
        ),
        MockResponse::json(200, json!({"ok": true})),
    ]);
    let client = client_over(&mock);
    let rate_before = client.limiter().rate().await;

    let start = Instant::now();
    let body = client.send_json(&RequestDescriptor::get("/v2.1/calls")).await?;

    assert_eq!(body, json!({"ok": true}));
    assert_eq!(mock.call_count(), 2);
    assert!(start.elapsed() >= Duration::from_secs(6));
    assert!(client.limiter().rate().await < rate_before);
    assert_eq!(client.limiter().consecutive_throttles().await, 0);
    Ok(())
}

#[tokio::test]
async fn test_success_headers_feed_limiter() -> anyhow::Result<()> {
    let mock = MockTransport::new_always(MockResponse::json_with_headers(
        200,
        json!({"ok": true}),
        &[
            ("x-rate-limit-burst-remaining", "0"),
            ("x-rate-limit-burst-reset", "0"),
            ("x-rate-limit-limit", "1000"),
            ("x-rate-limit-remaining", "500"),
        ],
    ));
    let client = client_over(&mock);
    let tokens_before = client.limiter().max_tokens().await;

    client.send_json(&RequestDescriptor::get("/v2.1/users")).await?;

    assert_eq!(mock.call_count(), 1);
    assert_eq!(client.limiter().consecutive_throttles().await, 1);
    assert!(client.limiter().max_tokens().await < tokens_before);
    let metrics = client.limiter().metrics().await;
    assert_eq!(metrics.last_quota.remaining, Some(500));
    Ok(())
}

#[tokio::test]
async fn test_sustained_throttling_switches_retry_policy() -> anyhow::Result<()> {
    let throttled = MockResponse::json_with_headers(
        200,
        json!({"ok": true}),
        &[("x-rate-limit-burst-remaining", "0"), ("x-rate-limit-burst-reset", "0")],
    );
    let mut script = vec![throttled; SUSTAINED_THROTTLE_EVENTS as usize];
    script.push(MockResponse::json(200, json!({"ok": true})));
    let mock = MockTransport::new_sequence(script);
    let client = client_over(&mock);
    let base = RetryPolicy::from_config(&fast_settings().retry);
    let request = RequestDescriptor::get("/v2.1/users");

    for _ in 0..SUSTAINED_THROTTLE_EVENTS {
        client.send_json(&request).await?;
    }
    assert_eq!(*client.executor().retry_policy(), base.patient());

    client.send_json(&request).await?;
    assert_eq!(*client.executor().retry_policy(), base);
    Ok(())
}

#[tokio::test]
async fn test_every_attempt_passes_the_limiter() {
    let mock = MockTransport::new_always(MockResponse::json(500, json!({})));
    let client = client_over(&mock);

    let request = RequestDescriptor::get("/v2.1/calls").with_resource_key("calls");
    let _ = client.send(&request).await;

    let metrics = client.limiter().metrics().await;
    assert_eq!(metrics.total_requests, 4);
    assert_eq!(metrics.endpoint_counts.get("calls"), Some(&4));
}

#[tokio::test]
async fn test_close_and_reopen() -> anyhow::Result<()> {
    let mock = MockTransport::new_always(MockResponse::json(200, json!({})));
    let client = client_over(&mock);

    client.send_json(&RequestDescriptor::get("/v2.1/users")).await?;
    assert!(client.is_open().await);

    client.close().await;
    assert!(!client.is_open().await);

    client.send_json(&RequestDescriptor::get("/v2.1/users")).await?;
    assert!(client.is_open().await);
    assert_eq!(mock.call_count(), 2);
    Ok(())
}
