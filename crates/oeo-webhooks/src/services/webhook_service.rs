//! Webhook registration CRUD service.
//!
//! Business logic for creating, listing, updating, and deleting
//! webhooks: URL validation with SSRF protection, secret strength
//! checks and encryption at rest, per-organization limits, and event
//! type validation.

use std::sync::Arc;

use uuid::Uuid;

use oeo_db::{CreateWebhook, UpdateWebhook, Webhook, WebhookStore};

use crate::crypto;
use crate::error::{Result, WebhookError};
use crate::validation;

/// Default maximum registered webhooks per organization.
pub const DEFAULT_MAX_WEBHOOKS: i64 = 25;

/// Default maximum delivery attempts per dispatched event.
pub const DEFAULT_RETRY_COUNT: i32 = 3;

/// Registration payload for a new webhook.
#[derive(Debug, Clone)]
pub struct CreateWebhookRequest {
    pub name: String,
    pub url: String,
    pub secret: String,
    pub event_types: Vec<String>,
    pub organization_id: Option<Uuid>,
    pub event_id: Option<Uuid>,
    pub edition_id: Option<Uuid>,
    pub retry_count: Option<i32>,
    pub custom_headers: Option<serde_json::Value>,
}

/// Partial update payload. `None` fields are left unchanged; scope
/// fields and custom headers use a nested option so that unsetting a
/// value is expressible.
#[derive(Debug, Clone, Default)]
pub struct UpdateWebhookRequest {
    pub name: Option<String>,
    pub url: Option<String>,
    pub secret: Option<String>,
    pub event_types: Option<Vec<String>>,
    pub organization_id: Option<Option<Uuid>>,
    pub event_id: Option<Option<Uuid>>,
    pub edition_id: Option<Option<Uuid>>,
    pub is_active: Option<bool>,
    pub retry_count: Option<i32>,
    pub custom_headers: Option<Option<serde_json::Value>>,
}

/// Service for webhook registration operations.
#[derive(Clone)]
pub struct WebhookService {
    store: Arc<dyn WebhookStore>,
    encryption_key: Vec<u8>,
    max_webhooks: i64,
    default_retry_count: i32,
    allow_http: bool,
}

impl WebhookService {
    /// Create a new webhook service.
    #[must_use]
    pub fn new(store: Arc<dyn WebhookStore>, encryption_key: Vec<u8>) -> Self {
        Self {
            store,
            encryption_key,
            max_webhooks: DEFAULT_MAX_WEBHOOKS,
            default_retry_count: DEFAULT_RETRY_COUNT,
            allow_http: false,
        }
    }

    /// Set the maximum webhooks per organization.
    #[must_use]
    pub fn with_max_webhooks(mut self, max: i64) -> Self {
        self.max_webhooks = max;
        self
    }

    /// Set the retry count applied when a registration omits one.
    #[must_use]
    pub fn with_default_retry_count(mut self, retry_count: i32) -> Self {
        self.default_retry_count = retry_count;
        self
    }

    /// Allow HTTP URLs (for development/testing).
    #[must_use]
    pub fn with_allow_http(mut self, allow: bool) -> Self {
        self.allow_http = allow;
        self
    }

    /// Register a new webhook.
    pub async fn create_webhook(
        &self,
        created_by: Option<Uuid>,
        request: CreateWebhookRequest,
    ) -> Result<Webhook> {
        validation::validate_webhook_url(&request.url, self.allow_http)?;
        validation::validate_event_types(&request.event_types)?;
        validation::validate_secret(&request.secret)?;

        let retry_count = request.retry_count.unwrap_or(self.default_retry_count);
        validation::validate_retry_count(retry_count)?;

        if let Some(ref headers) = request.custom_headers {
            validation::validate_custom_headers(headers)?;
        }

        let count = self.store.count(request.organization_id).await?;
        if count >= self.max_webhooks {
            return Err(WebhookError::WebhookLimitExceeded {
                limit: self.max_webhooks,
            });
        }

        let secret_encrypted = crypto::encrypt_secret(&request.secret, &self.encryption_key)?;

        let webhook = self
            .store
            .create(CreateWebhook {
                name: request.name,
                url: request.url,
                secret_encrypted,
                event_types: request.event_types,
                organization_id: request.organization_id,
                event_id: request.event_id,
                edition_id: request.edition_id,
                retry_count,
                custom_headers: request.custom_headers,
                created_by,
            })
            .await?;

        tracing::info!(
            target: "webhook_delivery",
            webhook_id = %webhook.id,
            url = %webhook.url,
            "Webhook registered"
        );

        Ok(webhook)
    }

    /// Get a single webhook.
    pub async fn get_webhook(&self, id: Uuid) -> Result<Webhook> {
        self.store
            .find_by_id(id)
            .await?
            .ok_or(WebhookError::WebhookNotFound)
    }

    /// List webhooks, optionally filtered to one organization.
    pub async fn list_webhooks(
        &self,
        organization_id: Option<Uuid>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Webhook>> {
        let limit = limit.clamp(1, 100);
        let offset = offset.max(0);
        Ok(self.store.list(organization_id, limit, offset).await?)
    }

    /// Update a webhook.
    pub async fn update_webhook(&self, id: Uuid, request: UpdateWebhookRequest) -> Result<Webhook> {
        if let Some(ref url) = request.url {
            validation::validate_webhook_url(url, self.allow_http)?;
        }
        if let Some(ref event_types) = request.event_types {
            validation::validate_event_types(event_types)?;
        }
        if let Some(retry_count) = request.retry_count {
            validation::validate_retry_count(retry_count)?;
        }
        if let Some(Some(ref headers)) = request.custom_headers {
            validation::validate_custom_headers(headers)?;
        }

        let secret_encrypted = match &request.secret {
            Some(secret) => {
                validation::validate_secret(secret)?;
                Some(crypto::encrypt_secret(secret, &self.encryption_key)?)
            }
            None => None,
        };

        let input = UpdateWebhook {
            name: request.name,
            url: request.url,
            secret_encrypted,
            event_types: request.event_types,
            organization_id: request.organization_id,
            event_id: request.event_id,
            edition_id: request.edition_id,
            is_active: request.is_active,
            retry_count: request.retry_count,
            custom_headers: request.custom_headers,
        };

        self.store
            .update(id, input)
            .await?
            .ok_or(WebhookError::WebhookNotFound)
    }

    /// Delete a webhook and its delivery history.
    pub async fn delete_webhook(&self, id: Uuid) -> Result<()> {
        let deleted = self.store.delete(id).await?;
        if !deleted {
            return Err(WebhookError::WebhookNotFound);
        }
        tracing::info!(target: "webhook_delivery", webhook_id = %id, "Webhook deleted");
        Ok(())
    }
}
