//! `Webhook` model: a tenant-configured HTTP subscription to domain events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A long-lived webhook subscription.
///
/// Scope fields (`organization_id`, `event_id`, `edition_id`) act as
/// wildcards when unset: an absent dimension matches every value of
/// that dimension at dispatch time.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Webhook {
    /// Primary key.
    pub id: Uuid,
    /// Human-readable label chosen by the tenant admin.
    pub name: String,
    /// Target URL receiving HTTP POST deliveries.
    pub url: String,
    /// Signing secret, encrypted at rest. Never transmitted.
    pub secret_encrypted: String,
    /// Non-empty set of subscribed event types (e.g. "order.completed").
    pub event_types: Vec<String>,
    pub organization_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    pub edition_id: Option<Uuid>,
    /// Soft-disable flag; inactive webhooks receive no deliveries.
    pub is_active: bool,
    /// Maximum delivery attempts per event (0-10).
    pub retry_count: i32,
    /// Extra headers merged into every request, stored as a JSON object
    /// of string values.
    pub custom_headers: Option<serde_json::Value>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// The (organization, event, edition) triple identifying the tenant
/// context of a dispatch. Unset fields are wildcards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchScope {
    pub organization_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    pub edition_id: Option<Uuid>,
}

impl DispatchScope {
    /// Scope constrained to a single organization.
    #[must_use]
    pub fn organization(organization_id: Uuid) -> Self {
        Self {
            organization_id: Some(organization_id),
            ..Self::default()
        }
    }
}

/// Data needed to create a new webhook.
#[derive(Debug, Clone)]
pub struct CreateWebhook {
    pub name: String,
    pub url: String,
    pub secret_encrypted: String,
    pub event_types: Vec<String>,
    pub organization_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    pub edition_id: Option<Uuid>,
    pub retry_count: i32,
    pub custom_headers: Option<serde_json::Value>,
    pub created_by: Option<Uuid>,
}

/// Partial update of a webhook. `None` fields are left unchanged;
/// id, created_by and timestamps are never updatable.
#[derive(Debug, Clone, Default)]
pub struct UpdateWebhook {
    pub name: Option<String>,
    pub url: Option<String>,
    pub secret_encrypted: Option<String>,
    pub event_types: Option<Vec<String>>,
    pub organization_id: Option<Option<Uuid>>,
    pub event_id: Option<Option<Uuid>>,
    pub edition_id: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
    pub retry_count: Option<i32>,
    pub custom_headers: Option<Option<serde_json::Value>>,
}
