//! In-memory store adapter for tests and embedded use.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    CreateWebhook, CreateWebhookDelivery, DeliveryStats, DispatchScope, UpdateWebhook, Webhook,
    WebhookDelivery,
};
use crate::store::{DeliveryStore, WebhookStore};

#[derive(Default)]
struct Inner {
    webhooks: HashMap<Uuid, Webhook>,
    deliveries: HashMap<Uuid, WebhookDelivery>,
}

/// Store adapter holding all records in process memory.
///
/// Provides the same atomic read-modify-write semantics per record as
/// the Postgres adapter (a single `RwLock` around the maps), so the
/// retry sweep can safely overlap with itself.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

/// A scope dimension constrains only when set on both sides.
fn dimension_matches(webhook_dim: Option<Uuid>, scope_dim: Option<Uuid>) -> bool {
    match (webhook_dim, scope_dim) {
        (Some(w), Some(s)) => w == s,
        _ => true,
    }
}

fn scope_matches(webhook: &Webhook, scope: &DispatchScope) -> bool {
    dimension_matches(webhook.organization_id, scope.organization_id)
        && dimension_matches(webhook.event_id, scope.event_id)
        && dimension_matches(webhook.edition_id, scope.edition_id)
}

#[async_trait]
impl WebhookStore for MemoryStore {
    async fn create(&self, input: CreateWebhook) -> Result<Webhook, StoreError> {
        let now = Utc::now();
        let webhook = Webhook {
            id: Uuid::new_v4(),
            name: input.name,
            url: input.url,
            secret_encrypted: input.secret_encrypted,
            event_types: input.event_types,
            organization_id: input.organization_id,
            event_id: input.event_id,
            edition_id: input.edition_id,
            is_active: true,
            retry_count: input.retry_count,
            custom_headers: input.custom_headers,
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
        };
        self.inner
            .write()
            .await
            .webhooks
            .insert(webhook.id, webhook.clone());
        Ok(webhook)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Webhook>, StoreError> {
        Ok(self.inner.read().await.webhooks.get(&id).cloned())
    }

    async fn find_by_scope(&self, scope: &DispatchScope) -> Result<Vec<Webhook>, StoreError> {
        let guard = self.inner.read().await;
        let mut matches: Vec<Webhook> = guard
            .webhooks
            .values()
            .filter(|w| w.is_active && scope_matches(w, scope))
            .cloned()
            .collect();
        matches.sort_by_key(|w| w.created_at);
        Ok(matches)
    }

    async fn list(
        &self,
        organization_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Webhook>, StoreError> {
        let guard = self.inner.read().await;
        let mut webhooks: Vec<Webhook> = guard
            .webhooks
            .values()
            .filter(|w| organization_id.is_none() || w.organization_id == organization_id)
            .cloned()
            .collect();
        webhooks.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(webhooks
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn count(&self, organization_id: Option<Uuid>) -> Result<i64, StoreError> {
        let guard = self.inner.read().await;
        Ok(guard
            .webhooks
            .values()
            .filter(|w| organization_id.is_none() || w.organization_id == organization_id)
            .count() as i64)
    }

    async fn update(&self, id: Uuid, input: UpdateWebhook) -> Result<Option<Webhook>, StoreError> {
        let mut guard = self.inner.write().await;
        let Some(webhook) = guard.webhooks.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(name) = input.name {
            webhook.name = name;
        }
        if let Some(url) = input.url {
            webhook.url = url;
        }
        if let Some(secret_encrypted) = input.secret_encrypted {
            webhook.secret_encrypted = secret_encrypted;
        }
        if let Some(event_types) = input.event_types {
            webhook.event_types = event_types;
        }
        if let Some(organization_id) = input.organization_id {
            webhook.organization_id = organization_id;
        }
        if let Some(event_id) = input.event_id {
            webhook.event_id = event_id;
        }
        if let Some(edition_id) = input.edition_id {
            webhook.edition_id = edition_id;
        }
        if let Some(is_active) = input.is_active {
            webhook.is_active = is_active;
        }
        if let Some(retry_count) = input.retry_count {
            webhook.retry_count = retry_count;
        }
        if let Some(custom_headers) = input.custom_headers {
            webhook.custom_headers = custom_headers;
        }
        webhook.updated_at = Utc::now();
        Ok(Some(webhook.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut guard = self.inner.write().await;
        let removed = guard.webhooks.remove(&id).is_some();
        if removed {
            guard.deliveries.retain(|_, d| d.webhook_id != id);
        }
        Ok(removed)
    }
}

#[async_trait]
impl DeliveryStore for MemoryStore {
    async fn create(
        &self,
        input: CreateWebhookDelivery,
    ) -> Result<WebhookDelivery, StoreError> {
        let now = Utc::now();
        let delivery = WebhookDelivery {
            id: Uuid::new_v4(),
            webhook_id: input.webhook_id,
            event_type: input.event_type,
            payload: input.payload,
            attempt: input.attempt,
            status_code: None,
            response_body: None,
            error: None,
            next_retry_at: input.next_retry_at,
            delivered_at: None,
            created_at: now,
            updated_at: now,
        };
        self.inner
            .write()
            .await
            .deliveries
            .insert(delivery.id, delivery.clone());
        Ok(delivery)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WebhookDelivery>, StoreError> {
        Ok(self.inner.read().await.deliveries.get(&id).cloned())
    }

    async fn mark_delivered(
        &self,
        id: Uuid,
        status_code: i16,
        response_body: Option<&str>,
    ) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let delivery = guard
            .deliveries
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("delivery {id}")))?;
        delivery.status_code = Some(status_code);
        delivery.response_body = response_body.map(ToString::to_string);
        delivery.error = None;
        delivery.next_retry_at = None;
        delivery.delivered_at = Some(Utc::now());
        delivery.updated_at = Utc::now();
        Ok(())
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        attempt: i32,
        error: &str,
        status_code: Option<i16>,
        response_body: Option<&str>,
        next_retry_at: Option<DateTime<Utc>>,
    ) -> Result<(), StoreError> {
        let mut guard = self.inner.write().await;
        let delivery = guard
            .deliveries
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("delivery {id}")))?;
        delivery.attempt = attempt;
        delivery.error = Some(error.to_string());
        delivery.status_code = status_code;
        delivery.response_body = response_body.map(ToString::to_string);
        delivery.next_retry_at = next_retry_at;
        delivery.updated_at = Utc::now();
        Ok(())
    }

    async fn reset_for_retry(&self, id: Uuid) -> Result<Option<WebhookDelivery>, StoreError> {
        let mut guard = self.inner.write().await;
        let Some(delivery) = guard.deliveries.get_mut(&id) else {
            return Ok(None);
        };
        delivery.attempt = 1;
        delivery.error = None;
        delivery.next_retry_at = None;
        delivery.updated_at = Utc::now();
        Ok(Some(delivery.clone()))
    }

    async fn find_pending_retries(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<WebhookDelivery>, StoreError> {
        let guard = self.inner.read().await;
        let mut due: Vec<WebhookDelivery> = guard
            .deliveries
            .values()
            .filter(|d| {
                d.delivered_at.is_none() && d.next_retry_at.is_some_and(|at| at <= now)
            })
            .cloned()
            .collect();
        due.sort_by_key(|d| d.next_retry_at);
        due.truncate(limit.max(0) as usize);
        Ok(due)
    }

    async fn list_by_webhook(
        &self,
        webhook_id: Uuid,
        page: i64,
        per_page: i64,
    ) -> Result<Vec<WebhookDelivery>, StoreError> {
        let guard = self.inner.read().await;
        let mut deliveries: Vec<WebhookDelivery> = guard
            .deliveries
            .values()
            .filter(|d| d.webhook_id == webhook_id)
            .cloned()
            .collect();
        deliveries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let per_page = per_page.clamp(1, 100);
        let offset = (page.max(1) - 1) * per_page;
        Ok(deliveries
            .into_iter()
            .skip(offset as usize)
            .take(per_page as usize)
            .collect())
    }

    async fn count_by_webhook(&self, webhook_id: Uuid) -> Result<DeliveryStats, StoreError> {
        let guard = self.inner.read().await;
        let mut stats = DeliveryStats::default();
        for delivery in guard.deliveries.values() {
            if delivery.webhook_id != webhook_id {
                continue;
            }
            stats.total += 1;
            if delivery.delivered_at.is_some() {
                stats.delivered += 1;
            } else if delivery.next_retry_at.is_none() && delivery.error.is_some() {
                stats.failed += 1;
            }
        }
        Ok(stats)
    }
}
