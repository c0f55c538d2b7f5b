//! Shared fixtures for webhook dispatch integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use oeo_db::{CreateWebhook, MemoryStore, Webhook, WebhookStore};
use oeo_webhooks::crypto;
use oeo_webhooks::{Dispatcher, Sender};

/// Signing secret used by every registered test webhook.
pub const TEST_SECRET: &str = "integration-test-signing-secret-0123456789";

/// At-rest encryption key shared by fixtures and assertions.
pub fn test_key() -> Vec<u8> {
    vec![7u8; 32]
}

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub dispatcher: Dispatcher,
}

/// Dispatcher wired to a fresh in-memory store.
pub fn harness() -> Harness {
    let store = Arc::new(MemoryStore::new());
    let dispatcher = Dispatcher::new(
        store.clone(),
        store.clone(),
        Sender::new().expect("sender"),
        test_key(),
    );
    Harness { store, dispatcher }
}

/// Registration input pointing at a mock server, with the shared
/// secret already encrypted. Tests adjust fields before creating.
pub fn webhook_input(url: &str, event_types: &[&str]) -> CreateWebhook {
    CreateWebhook {
        name: "test webhook".to_string(),
        url: url.to_string(),
        secret_encrypted: crypto::encrypt_secret(TEST_SECRET, &test_key()).expect("encrypt"),
        event_types: event_types.iter().map(ToString::to_string).collect(),
        organization_id: None,
        event_id: None,
        edition_id: None,
        retry_count: 3,
        custom_headers: None,
        created_by: None,
    }
}

/// Register a webhook directly against the store, bypassing the CRUD
/// service so mock-server loopback URLs are usable.
pub async fn register(store: &Arc<MemoryStore>, input: CreateWebhook) -> Webhook {
    WebhookStore::create(store.as_ref(), input)
        .await
        .expect("create webhook")
}

/// Verify an `X-OEO-Signature` header value against the raw body bytes.
pub fn signature_matches(header_value: &str, body: &[u8]) -> bool {
    let Some(hex) = header_value.strip_prefix("sha256=") else {
        return false;
    };
    crypto::verify_signature(hex, TEST_SECRET, body)
}
