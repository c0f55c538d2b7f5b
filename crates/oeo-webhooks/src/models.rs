//! Wire and result types for webhook delivery.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The JSON body POSTed to a webhook endpoint.
///
/// The timestamp is carried as a string so the `X-OEO-Timestamp` header
/// and the body field are byte-identical; the signature covers the
/// serialized body exactly as transmitted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WebhookEnvelope {
    pub event: String,
    pub timestamp: String,
    pub data: serde_json::Value,
}

impl WebhookEnvelope {
    /// Rebuilds the envelope for a stored delivery, reusing the payload
    /// persisted at dispatch time but stamping the current time.
    pub fn for_redelivery(event_type: &str, data: serde_json::Value) -> Self {
        Self {
            event: event_type.to_string(),
            timestamp: Utc::now().to_rfc3339(),
            data,
        }
    }
}

/// Outcome of one delivery attempt, as reported to callers.
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryResult {
    pub delivery_id: Uuid,
    pub webhook_id: Uuid,
    pub success: bool,
    pub status_code: Option<i16>,
    pub error: Option<String>,
}

/// Tally of one pending-retries sweep.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SweepOutcome {
    pub processed: usize,
    pub delivered: usize,
    pub failed: usize,
}
