//! Store traits consumed by the dispatch subsystem.
//!
//! The dispatcher depends only on these traits; concrete adapters live
//! in [`memory`] and [`postgres`].

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    CreateWebhook, CreateWebhookDelivery, DeliveryStats, DispatchScope, UpdateWebhook, Webhook,
    WebhookDelivery,
};

/// Persistence contract for webhook subscriptions.
#[async_trait]
pub trait WebhookStore: Send + Sync {
    /// Create a new webhook.
    async fn create(&self, input: CreateWebhook) -> Result<Webhook, StoreError>;

    /// Look up a webhook by id, regardless of active state.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Webhook>, StoreError>;

    /// Active webhooks whose scope dimensions are each either unset or
    /// equal to the corresponding dimension of `scope`.
    async fn find_by_scope(&self, scope: &DispatchScope) -> Result<Vec<Webhook>, StoreError>;

    /// List webhooks, optionally filtered to one organization.
    async fn list(
        &self,
        organization_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Webhook>, StoreError>;

    /// Count webhooks, optionally filtered to one organization.
    async fn count(&self, organization_id: Option<Uuid>) -> Result<i64, StoreError>;

    /// Apply a partial update. Returns the updated webhook, or `None`
    /// if it does not exist.
    async fn update(&self, id: Uuid, input: UpdateWebhook) -> Result<Option<Webhook>, StoreError>;

    /// Hard-delete a webhook and, transitively, its delivery history.
    /// Returns whether a row was removed.
    async fn delete(&self, id: Uuid) -> Result<bool, StoreError>;
}

/// Persistence contract for delivery records.
#[async_trait]
pub trait DeliveryStore: Send + Sync {
    /// Create a new delivery record.
    async fn create(
        &self,
        input: CreateWebhookDelivery,
    ) -> Result<WebhookDelivery, StoreError>;

    /// Look up a delivery by id.
    async fn find_by_id(&self, id: Uuid) -> Result<Option<WebhookDelivery>, StoreError>;

    /// Record terminal success: sets `delivered_at`, stores the response,
    /// and clears any pending retry timer.
    async fn mark_delivered(
        &self,
        id: Uuid,
        status_code: i16,
        response_body: Option<&str>,
    ) -> Result<(), StoreError>;

    /// Record a failed attempt. `next_retry_at = None` leaves the record
    /// in terminal failure.
    async fn mark_failed(
        &self,
        id: Uuid,
        attempt: i32,
        error: &str,
        status_code: Option<i16>,
        response_body: Option<&str>,
        next_retry_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError>;

    /// Manual-retry reset: attempt back to 1, error and retry timer
    /// cleared. `delivered_at` is never touched. Returns the refreshed
    /// record, or `None` if it does not exist.
    async fn reset_for_retry(&self, id: Uuid) -> Result<Option<WebhookDelivery>, StoreError>;

    /// Deliveries due for retry: `next_retry_at <= now` and not yet
    /// delivered, oldest timer first, at most `limit` rows.
    async fn find_pending_retries(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<WebhookDelivery>, StoreError>;

    /// Delivery history for one webhook, newest first. `page` is 1-based.
    async fn list_by_webhook(
        &self,
        webhook_id: Uuid,
        page: i64,
        per_page: i64,
    ) -> Result<Vec<WebhookDelivery>, StoreError>;

    /// Aggregate counts for one webhook.
    async fn count_by_webhook(&self, webhook_id: Uuid) -> Result<DeliveryStats, StoreError>;
}
