//! Integration tests for the wire contract: signature, headers, and
//! response capture.

mod common;

use common::*;
use oeo_db::{DeliveryStore, DispatchScope};
use oeo_webhooks::EventType;
use serde_json::json;
use wiremock::matchers::method;
use wiremock::{Mock, MockServer, ResponseTemplate};

/// The signature header verifies against the exact transmitted bytes.
#[tokio::test]
async fn test_signature_covers_transmitted_bytes() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness();
    register(
        &h.store,
        webhook_input(&format!("{}/hook", server.uri()), &["talk.accepted"]),
    )
    .await;

    h.dispatcher
        .dispatch(
            EventType::TalkAccepted,
            json!({"talkId": "t-1", "track": "systems"}),
            &DispatchScope::default(),
        )
        .await
        .unwrap();

    let request = server.received_requests().await.unwrap().remove(0);
    let signature = request
        .headers
        .get("X-OEO-Signature")
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    assert!(signature.starts_with("sha256="));
    assert!(signature_matches(&signature, &request.body));

    // Any change to the bytes must break verification.
    let mut tampered = request.body.clone();
    tampered[0] ^= 0x01;
    assert!(!signature_matches(&signature, &tampered));
}

/// The timestamp header and the body timestamp are byte-identical, so
/// receivers can bind the signature to a point in time.
#[tokio::test]
async fn test_timestamp_header_matches_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness();
    register(
        &h.store,
        webhook_input(&format!("{}/hook", server.uri()), &["edition.created"]),
    )
    .await;

    h.dispatcher
        .dispatch(
            EventType::EditionCreated,
            json!({}),
            &DispatchScope::default(),
        )
        .await
        .unwrap();

    let request = server.received_requests().await.unwrap().remove(0);
    let header_ts = request
        .headers
        .get("X-OEO-Timestamp")
        .unwrap()
        .to_str()
        .unwrap();
    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();
    assert_eq!(body["timestamp"].as_str().unwrap(), header_ts);
    assert_eq!(
        request.headers.get("Content-Type").unwrap().to_str().unwrap(),
        "application/json"
    );
}

/// Oversized response bodies are stored truncated with a marker.
#[tokio::test]
async fn test_response_body_truncated() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("x".repeat(10_050)))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness();
    register(
        &h.store,
        webhook_input(&format!("{}/hook", server.uri()), &["order.completed"]),
    )
    .await;

    let results = h
        .dispatcher
        .dispatch(
            EventType::OrderCompleted,
            json!({}),
            &DispatchScope::default(),
        )
        .await
        .unwrap();

    let delivery = DeliveryStore::find_by_id(h.store.as_ref(), results[0].delivery_id)
        .await
        .unwrap()
        .unwrap();
    let stored = delivery.response_body.unwrap();
    assert!(stored.ends_with("... (truncated)"));
    assert_eq!(stored.chars().count(), 10_000 + "... (truncated)".len());
}

/// Non-2xx responses record a status-line error and keep the captured
/// body for diagnosis.
#[tokio::test]
async fn test_non_2xx_error_format() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(502).set_body_string("upstream sad"))
        .expect(1)
        .mount(&server)
        .await;

    let h = harness();
    register(
        &h.store,
        webhook_input(&format!("{}/hook", server.uri()), &["order.refunded"]),
    )
    .await;

    let results = h
        .dispatcher
        .dispatch(
            EventType::OrderRefunded,
            json!({}),
            &DispatchScope::default(),
        )
        .await
        .unwrap();

    assert!(!results[0].success);
    assert_eq!(results[0].status_code, Some(502));
    assert_eq!(results[0].error.as_deref(), Some("HTTP 502: Bad Gateway"));

    let delivery = DeliveryStore::find_by_id(h.store.as_ref(), results[0].delivery_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(delivery.response_body.as_deref(), Some("upstream sad"));
}

/// A connection failure is recovered into a transport error result.
#[tokio::test]
async fn test_transport_error_recovered() {
    // Reserve a port the OS considers free, then release it so nothing
    // is listening there.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    let unreachable = format!("http://127.0.0.1:{port}/hook");

    let h = harness();
    register(&h.store, webhook_input(&unreachable, &["order.completed"])).await;

    let results = h
        .dispatcher
        .dispatch(
            EventType::OrderCompleted,
            json!({}),
            &DispatchScope::default(),
        )
        .await
        .unwrap();

    assert!(!results[0].success);
    assert_eq!(results[0].status_code, None);
    assert!(results[0].error.is_some());
}
