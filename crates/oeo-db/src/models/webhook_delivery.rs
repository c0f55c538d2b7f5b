//! `WebhookDelivery` model: one record per logical delivery attempt chain.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// One logical delivery of a single event occurrence to a single
/// webhook, mutated in place across attempts.
///
/// State is carried implicitly by the fields:
/// - `delivered_at` set: terminal success.
/// - `next_retry_at` set (and not delivered): awaiting retry.
/// - neither set, `error` set: terminal failure.
///
/// `delivered_at` and `next_retry_at` are never both set.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct WebhookDelivery {
    /// Primary key.
    pub id: Uuid,
    /// Owning webhook.
    pub webhook_id: Uuid,
    /// Event type this delivery carries (e.g. "talk.accepted").
    pub event_type: String,
    /// JSON payload, immutable once created.
    pub payload: serde_json::Value,
    /// 1-based attempt counter; after a failure it already names the
    /// attempt that would run next.
    pub attempt: i32,
    /// HTTP status of the most recent attempt, if a response was received.
    pub status_code: Option<i16>,
    /// Truncated response body of the most recent attempt.
    pub response_body: Option<String>,
    /// Error message of the most recent failed attempt.
    pub error: Option<String>,
    /// When the next automatic retry is due; set only while retrying.
    pub next_retry_at: Option<DateTime<Utc>>,
    /// Set exactly once, marks terminal success.
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WebhookDelivery {
    /// Whether this delivery reached its endpoint.
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        self.delivered_at.is_some()
    }
}

/// Data needed to create a new delivery record.
#[derive(Debug, Clone)]
pub struct CreateWebhookDelivery {
    pub webhook_id: Uuid,
    pub event_type: String,
    pub payload: serde_json::Value,
    pub attempt: i32,
    pub next_retry_at: Option<DateTime<Utc>>,
}

/// Aggregate delivery counts for one webhook.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryStats {
    /// All delivery records.
    pub total: i64,
    /// Records with `delivered_at` set.
    pub delivered: i64,
    /// Terminal failures: not delivered and no retry pending.
    pub failed: i64,
}
