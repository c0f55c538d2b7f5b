//! Postgres store adapter backed by sqlx.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{
    CreateWebhook, CreateWebhookDelivery, DeliveryStats, DispatchScope, UpdateWebhook, Webhook,
    WebhookDelivery,
};
use crate::store::{DeliveryStore, WebhookStore};

/// Store adapter over a shared Postgres connection pool.
///
/// Row-level updates are single statements, so records get the atomic
/// read-modify-write semantics the retry sweep relies on.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl WebhookStore for PgStore {
    async fn create(&self, input: CreateWebhook) -> Result<Webhook, StoreError> {
        let webhook = sqlx::query_as::<_, Webhook>(
            r"
            INSERT INTO webhooks (
                name, url, secret_encrypted, event_types,
                organization_id, event_id, edition_id,
                retry_count, custom_headers, created_by
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *
            ",
        )
        .bind(&input.name)
        .bind(&input.url)
        .bind(&input.secret_encrypted)
        .bind(&input.event_types)
        .bind(input.organization_id)
        .bind(input.event_id)
        .bind(input.edition_id)
        .bind(input.retry_count)
        .bind(&input.custom_headers)
        .bind(input.created_by)
        .fetch_one(&self.pool)
        .await?;

        Ok(webhook)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Webhook>, StoreError> {
        let webhook = sqlx::query_as::<_, Webhook>("SELECT * FROM webhooks WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(webhook)
    }

    async fn find_by_scope(&self, scope: &DispatchScope) -> Result<Vec<Webhook>, StoreError> {
        // A dimension constrains only when set on both the webhook and
        // the dispatch scope.
        let webhooks = sqlx::query_as::<_, Webhook>(
            r"
            SELECT * FROM webhooks
            WHERE is_active
              AND (organization_id IS NULL OR $1::uuid IS NULL OR organization_id = $1)
              AND (event_id IS NULL OR $2::uuid IS NULL OR event_id = $2)
              AND (edition_id IS NULL OR $3::uuid IS NULL OR edition_id = $3)
            ORDER BY created_at
            ",
        )
        .bind(scope.organization_id)
        .bind(scope.event_id)
        .bind(scope.edition_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(webhooks)
    }

    async fn list(
        &self,
        organization_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Webhook>, StoreError> {
        let webhooks = sqlx::query_as::<_, Webhook>(
            r"
            SELECT * FROM webhooks
            WHERE ($1::uuid IS NULL OR organization_id = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(organization_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(webhooks)
    }

    async fn count(&self, organization_id: Option<Uuid>) -> Result<i64, StoreError> {
        let count: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM webhooks WHERE ($1::uuid IS NULL OR organization_id = $1)",
        )
        .bind(organization_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.0)
    }

    async fn update(&self, id: Uuid, input: UpdateWebhook) -> Result<Option<Webhook>, StoreError> {
        // Partial update with set-to-null support for the scope fields,
        // done as read-merge-write inside one transaction.
        let mut tx = self.pool.begin().await?;

        let Some(mut webhook) =
            sqlx::query_as::<_, Webhook>("SELECT * FROM webhooks WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?
        else {
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

        let updated = sqlx::query_as::<_, Webhook>(
            r"
            UPDATE webhooks
            SET name = $2, url = $3, secret_encrypted = $4, event_types = $5,
                organization_id = $6, event_id = $7, edition_id = $8,
                is_active = $9, retry_count = $10, custom_headers = $11,
                updated_at = now()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .bind(&webhook.name)
        .bind(&webhook.url)
        .bind(&webhook.secret_encrypted)
        .bind(&webhook.event_types)
        .bind(webhook.organization_id)
        .bind(webhook.event_id)
        .bind(webhook.edition_id)
        .bind(webhook.is_active)
        .bind(webhook.retry_count)
        .bind(&webhook.custom_headers)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(Some(updated))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, StoreError> {
        // Delivery rows cascade via the foreign key.
        let result = sqlx::query("DELETE FROM webhooks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl DeliveryStore for PgStore {
    async fn create(
        &self,
        input: CreateWebhookDelivery,
    ) -> Result<WebhookDelivery, StoreError> {
        let delivery = sqlx::query_as::<_, WebhookDelivery>(
            r"
            INSERT INTO webhook_deliveries (webhook_id, event_type, payload, attempt, next_retry_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            ",
        )
        .bind(input.webhook_id)
        .bind(&input.event_type)
        .bind(&input.payload)
        .bind(input.attempt)
        .bind(input.next_retry_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(delivery)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<WebhookDelivery>, StoreError> {
        let delivery =
            sqlx::query_as::<_, WebhookDelivery>("SELECT * FROM webhook_deliveries WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;
        Ok(delivery)
    }

    async fn mark_delivered(
        &self,
        id: Uuid,
        status_code: i16,
        response_body: Option<&str>,
    ) -> Result<(), StoreError> {
        let result = sqlx::query(
            r"
            UPDATE webhook_deliveries
            SET status_code = $2, response_body = $3, error = NULL,
                next_retry_at = NULL, delivered_at = now(), updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(status_code)
        .bind(response_body)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("delivery {id}")));
        }
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
        let result = sqlx::query(
            r"
            UPDATE webhook_deliveries
            SET attempt = $2, error = $3, status_code = $4, response_body = $5,
                next_retry_at = $6, updated_at = now()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(attempt)
        .bind(error)
        .bind(status_code)
        .bind(response_body)
        .bind(next_retry_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("delivery {id}")));
        }
        Ok(())
    }

    async fn reset_for_retry(&self, id: Uuid) -> Result<Option<WebhookDelivery>, StoreError> {
        let delivery = sqlx::query_as::<_, WebhookDelivery>(
            r"
            UPDATE webhook_deliveries
            SET attempt = 1, error = NULL, next_retry_at = NULL, updated_at = now()
            WHERE id = $1
            RETURNING *
            ",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(delivery)
    }

    async fn find_pending_retries(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> Result<Vec<WebhookDelivery>, StoreError> {
        let deliveries = sqlx::query_as::<_, WebhookDelivery>(
            r"
            SELECT * FROM webhook_deliveries
            WHERE next_retry_at IS NOT NULL
              AND next_retry_at <= $1
              AND delivered_at IS NULL
            ORDER BY next_retry_at
            LIMIT $2
            ",
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(deliveries)
    }

    async fn list_by_webhook(
        &self,
        webhook_id: Uuid,
        page: i64,
        per_page: i64,
    ) -> Result<Vec<WebhookDelivery>, StoreError> {
        let per_page = per_page.clamp(1, 100);
        let offset = (page.max(1) - 1) * per_page;

        let deliveries = sqlx::query_as::<_, WebhookDelivery>(
            r"
            SELECT * FROM webhook_deliveries
            WHERE webhook_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            ",
        )
        .bind(webhook_id)
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(deliveries)
    }

    async fn count_by_webhook(&self, webhook_id: Uuid) -> Result<DeliveryStats, StoreError> {
        let row: (i64, i64, i64) = sqlx::query_as(
            r"
            SELECT
                COUNT(*),
                COUNT(*) FILTER (WHERE delivered_at IS NOT NULL),
                COUNT(*) FILTER (
                    WHERE delivered_at IS NULL
                      AND next_retry_at IS NULL
                      AND error IS NOT NULL
                )
            FROM webhook_deliveries
            WHERE webhook_id = $1
            ",
        )
        .bind(webhook_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(DeliveryStats {
            total: row.0,
            delivered: row.1,
            failed: row.2,
        })
    }
}
