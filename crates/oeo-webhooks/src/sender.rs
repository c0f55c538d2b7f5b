//! HTTP delivery of signed webhook payloads.

use std::time::{Duration, Instant};

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;

use oeo_db::Webhook;

use crate::crypto;
use crate::error::WebhookError;
use crate::models::WebhookEnvelope;

/// Hard per-request timeout.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Captured response bodies are cut off at this many characters.
const MAX_RESPONSE_BODY_CHARS: usize = 10_000;

const TRUNCATION_MARKER: &str = "... (truncated)";

/// Headers custom headers may never override. Convenience headers like
/// Content-Type are not reserved; a custom header of the same name wins.
const RESERVED_HEADERS: [&str; 3] = [
    "x-oeo-signature",
    "x-oeo-event",
    "x-oeo-timestamp",
];

/// Outcome of a single HTTP POST attempt.
#[derive(Debug, Clone)]
pub struct SendOutcome {
    pub success: bool,
    pub status_code: Option<i16>,
    pub response_body: Option<String>,
    pub error: Option<String>,
}

/// Executes webhook HTTP requests over a shared client.
#[derive(Clone)]
pub struct Sender {
    http_client: Client,
}

impl Sender {
    /// Create a sender with a shared HTTP client.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Internal` if the HTTP client cannot be built.
    pub fn new() -> Result<Self, WebhookError> {
        let http_client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent("oeo-webhooks/1.0")
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| WebhookError::Internal(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self { http_client })
    }

    /// POST the envelope to the webhook's URL, signing the exact bytes
    /// placed on the wire.
    ///
    /// Transport errors and non-2xx responses are both reported through
    /// `SendOutcome`; only payload serialization failure surfaces as an
    /// error to the caller.
    pub async fn send(
        &self,
        webhook: &Webhook,
        secret: &str,
        envelope: &WebhookEnvelope,
    ) -> Result<SendOutcome, WebhookError> {
        let body = serde_json::to_vec(envelope)
            .map_err(|e| WebhookError::Internal(format!("Failed to serialize payload: {e}")))?;

        let signature = crypto::sign_payload(secret, &body);
        let headers = build_headers(webhook, envelope, &signature);

        let start = Instant::now();
        let result = self
            .http_client
            .post(&webhook.url)
            .headers(headers)
            .body(body)
            .send()
            .await;
        let latency_ms = start.elapsed().as_millis() as u64;

        match result {
            Ok(response) => {
                let status = response.status();
                let status_code = status.as_u16() as i16;
                let response_body =
                    truncate_response_body(&response.text().await.unwrap_or_default());

                if status.is_success() {
                    tracing::debug!(
                        target: "webhook_delivery",
                        webhook_id = %webhook.id,
                        status_code,
                        latency_ms,
                        "Webhook endpoint accepted delivery"
                    );
                    Ok(SendOutcome {
                        success: true,
                        status_code: Some(status_code),
                        response_body: Some(response_body),
                        error: None,
                    })
                } else {
                    let status_text = status.canonical_reason().unwrap_or("Unknown");
                    Ok(SendOutcome {
                        success: false,
                        status_code: Some(status_code),
                        response_body: Some(response_body),
                        error: Some(format!("HTTP {status_code}: {status_text}")),
                    })
                }
            }
            Err(e) => {
                let error = if e.is_timeout() {
                    format!("Request timeout ({REQUEST_TIMEOUT_SECS}s)")
                } else if e.is_connect() {
                    format!("Connection failed: {e}")
                } else {
                    format!("Request error: {e}")
                };
                Ok(SendOutcome {
                    success: false,
                    status_code: None,
                    response_body: None,
                    error: Some(error),
                })
            }
        }
    }
}

/// Assemble request headers: the reserved delivery headers plus any
/// custom headers the webhook carries. Custom entries matching a
/// reserved name (case-insensitively) are dropped.
fn build_headers(webhook: &Webhook, envelope: &WebhookEnvelope, signature: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    if let Ok(v) = HeaderValue::from_str("application/json") {
        headers.insert("Content-Type", v);
    }
    if let Ok(v) = HeaderValue::from_str(&format!("sha256={signature}")) {
        headers.insert("X-OEO-Signature", v);
    }
    if let Ok(v) = HeaderValue::from_str(&envelope.event) {
        headers.insert("X-OEO-Event", v);
    }
    if let Ok(v) = HeaderValue::from_str(&envelope.timestamp) {
        headers.insert("X-OEO-Timestamp", v);
    }

    if let Some(serde_json::Value::Object(custom)) = &webhook.custom_headers {
        for (name, value) in custom {
            if RESERVED_HEADERS.contains(&name.to_ascii_lowercase().as_str()) {
                tracing::warn!(
                    target: "webhook_delivery",
                    webhook_id = %webhook.id,
                    header = %name,
                    "Ignoring custom header that shadows a reserved delivery header"
                );
                continue;
            }
            let Some(value) = value.as_str() else {
                continue;
            };
            if let (Ok(n), Ok(v)) = (
                HeaderName::from_bytes(name.as_bytes()),
                HeaderValue::from_str(value),
            ) {
                headers.insert(n, v);
            }
        }
    }

    headers
}

/// Cut the body off at the capture limit and append the marker.
fn truncate_response_body(body: &str) -> String {
    if body.chars().count() <= MAX_RESPONSE_BODY_CHARS {
        return body.to_string();
    }
    let mut truncated: String = body.chars().take(MAX_RESPONSE_BODY_CHARS).collect();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    fn webhook_with_headers(custom_headers: Option<serde_json::Value>) -> Webhook {
        Webhook {
            id: Uuid::new_v4(),
            name: "test".to_string(),
            url: "https://example.com/hook".to_string(),
            secret_encrypted: String::new(),
            event_types: vec!["order.completed".to_string()],
            organization_id: None,
            event_id: None,
            edition_id: None,
            is_active: true,
            retry_count: 3,
            custom_headers,
            created_by: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn envelope() -> WebhookEnvelope {
        WebhookEnvelope {
            event: "order.completed".to_string(),
            timestamp: "2026-01-15T12:00:00+00:00".to_string(),
            data: json!({"orderId": "abc"}),
        }
    }

    #[test]
    fn test_build_headers_sets_reserved_set() {
        let headers = build_headers(&webhook_with_headers(None), &envelope(), "deadbeef");
        assert_eq!(headers.get("Content-Type").unwrap(), "application/json");
        assert_eq!(headers.get("X-OEO-Signature").unwrap(), "sha256=deadbeef");
        assert_eq!(headers.get("X-OEO-Event").unwrap(), "order.completed");
        assert_eq!(
            headers.get("X-OEO-Timestamp").unwrap(),
            "2026-01-15T12:00:00+00:00"
        );
    }

    #[test]
    fn test_build_headers_includes_custom() {
        let webhook = webhook_with_headers(Some(json!({"X-Api-Key": "k123"})));
        let headers = build_headers(&webhook, &envelope(), "deadbeef");
        assert_eq!(headers.get("X-Api-Key").unwrap(), "k123");
    }

    #[test]
    fn test_build_headers_custom_cannot_clobber_reserved() {
        let webhook = webhook_with_headers(Some(json!({
            "x-oeo-signature": "sha256=forged",
            "X-OEO-Event": "forged.event",
        })));
        let headers = build_headers(&webhook, &envelope(), "deadbeef");
        assert_eq!(headers.get("X-OEO-Signature").unwrap(), "sha256=deadbeef");
        assert_eq!(headers.get("X-OEO-Event").unwrap(), "order.completed");
    }

    #[test]
    fn test_build_headers_custom_overrides_content_type() {
        let webhook = webhook_with_headers(Some(json!({
            "Content-Type": "application/cloudevents+json",
        })));
        let headers = build_headers(&webhook, &envelope(), "deadbeef");
        assert_eq!(
            headers.get("Content-Type").unwrap(),
            "application/cloudevents+json"
        );
    }

    #[test]
    fn test_truncate_short_body_untouched() {
        assert_eq!(truncate_response_body("ok"), "ok");
        let exact = "a".repeat(MAX_RESPONSE_BODY_CHARS);
        assert_eq!(truncate_response_body(&exact), exact);
    }

    #[test]
    fn test_truncate_long_body_appends_marker() {
        let long = "b".repeat(MAX_RESPONSE_BODY_CHARS + 1);
        let truncated = truncate_response_body(&long);
        assert!(truncated.ends_with(TRUNCATION_MARKER));
        assert_eq!(
            truncated.chars().count(),
            MAX_RESPONSE_BODY_CHARS + TRUNCATION_MARKER.len()
        );
    }

    #[test]
    fn test_truncate_counts_chars_not_bytes() {
        let long = "é".repeat(MAX_RESPONSE_BODY_CHARS + 50);
        let truncated = truncate_response_body(&long);
        assert!(truncated.ends_with(TRUNCATION_MARKER));
        assert_eq!(
            truncated.chars().count(),
            MAX_RESPONSE_BODY_CHARS + TRUNCATION_MARKER.len()
        );
    }
}
