//! Delivery orchestration: fan-out, attempt execution, and retry state.
//!
//! The dispatcher owns the delivery state machine
//! (`created -> delivered` or `created -> retry-scheduled -> ... ->
//! failed-terminal`) and drives it through three entry points:
//! [`Dispatcher::dispatch`] for fresh domain events,
//! [`Dispatcher::process_delivery`] for single-record re-entry, and
//! [`Dispatcher::process_pending_retries`] for the externally scheduled
//! sweep. It holds no timers of its own.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use oeo_db::{
    CreateWebhookDelivery, DeliveryStats, DeliveryStore, DispatchScope, StoreError, Webhook,
    WebhookDelivery, WebhookStore,
};

use crate::crypto;
use crate::error::{Result, WebhookError};
use crate::events::EventType;
use crate::matcher;
use crate::models::{DeliveryResult, SweepOutcome, WebhookEnvelope};
use crate::retry;
use crate::sender::{SendOutcome, Sender};

/// Retries pulled per sweep unless overridden.
const DEFAULT_SWEEP_BATCH_SIZE: i64 = 100;

/// Orchestrates webhook deliveries against the persistence traits.
#[derive(Clone)]
pub struct Dispatcher {
    webhooks: Arc<dyn WebhookStore>,
    deliveries: Arc<dyn DeliveryStore>,
    sender: Sender,
    encryption_key: Vec<u8>,
    sweep_batch_size: i64,
}

impl Dispatcher {
    /// Create a new dispatcher.
    #[must_use]
    pub fn new(
        webhooks: Arc<dyn WebhookStore>,
        deliveries: Arc<dyn DeliveryStore>,
        sender: Sender,
        encryption_key: Vec<u8>,
    ) -> Self {
        Self {
            webhooks,
            deliveries,
            sender,
            encryption_key,
            sweep_batch_size: DEFAULT_SWEEP_BATCH_SIZE,
        }
    }

    /// Cap the number of due retries pulled per sweep.
    #[must_use]
    pub fn with_sweep_batch_size(mut self, batch_size: i64) -> Self {
        self.sweep_batch_size = batch_size;
        self
    }

    /// Deliver an event to every eligible webhook in scope.
    ///
    /// Creates one delivery record per match and attempts each
    /// sequentially. Endpoint failures are recovered into the returned
    /// results; only store errors surface as `Err`.
    pub async fn dispatch(
        &self,
        event_type: EventType,
        data: serde_json::Value,
        scope: &DispatchScope,
    ) -> Result<Vec<DeliveryResult>> {
        let candidates = self.webhooks.find_by_scope(scope).await?;
        let eligible: Vec<Webhook> = candidates
            .into_iter()
            .filter(|w| matcher::matches_event(w, event_type))
            .collect();

        if eligible.is_empty() {
            tracing::debug!(
                target: "webhook_delivery",
                event_type = %event_type,
                "No eligible webhooks for event"
            );
            return Ok(Vec::new());
        }

        tracing::info!(
            target: "webhook_delivery",
            event_type = %event_type,
            webhook_count = eligible.len(),
            "Dispatching event to eligible webhooks"
        );

        let mut results = Vec::with_capacity(eligible.len());
        for webhook in eligible {
            let delivery = self
                .deliveries
                .create(CreateWebhookDelivery {
                    webhook_id: webhook.id,
                    event_type: event_type.as_str().to_string(),
                    payload: data.clone(),
                    attempt: 1,
                    next_retry_at: None,
                })
                .await?;

            results.push(self.execute_attempt(&delivery, &webhook).await?);
        }

        Ok(results)
    }

    /// Idempotent re-entry point for one delivery.
    ///
    /// Already-delivered records return their success result without
    /// any HTTP call. Deliveries whose webhook is gone or inactive are
    /// terminally failed without HTTP I/O. Everything else gets exactly
    /// one attempt at the persisted attempt counter.
    pub async fn process_delivery(&self, delivery_id: Uuid) -> Result<DeliveryResult> {
        let delivery = self
            .deliveries
            .find_by_id(delivery_id)
            .await?
            .ok_or(WebhookError::DeliveryNotFound)?;

        if delivery.is_delivered() {
            return Ok(DeliveryResult {
                delivery_id: delivery.id,
                webhook_id: delivery.webhook_id,
                success: true,
                status_code: delivery.status_code,
                error: None,
            });
        }

        match self.webhooks.find_by_id(delivery.webhook_id).await? {
            Some(webhook) if webhook.is_active => self.execute_attempt(&delivery, &webhook).await,
            Some(_) => self.fail_terminal(&delivery, "Webhook is inactive").await,
            None => self.fail_terminal(&delivery, "Webhook not found").await,
        }
    }

    /// Process every delivery whose retry is due, sequentially.
    ///
    /// The only entry point meant for an external scheduler; safe to
    /// overlap with itself because `process_delivery` is idempotent.
    pub async fn process_pending_retries(&self) -> Result<SweepOutcome> {
        let due = self
            .deliveries
            .find_pending_retries(Utc::now(), self.sweep_batch_size)
            .await?;
        let mut outcome = SweepOutcome::default();

        for delivery in due {
            match self.process_delivery(delivery.id).await {
                Ok(result) => {
                    outcome.processed += 1;
                    if result.success {
                        outcome.delivered += 1;
                    } else {
                        outcome.failed += 1;
                    }
                }
                // The record vanished between the query and the retry,
                // which cascading webhook deletion makes routine. The
                // store variant covers a delete racing the mark phase.
                Err(WebhookError::DeliveryNotFound)
                | Err(WebhookError::Store(StoreError::NotFound(_))) => {}
                Err(e) => return Err(e),
            }
        }

        if outcome.processed > 0 {
            tracing::info!(
                target: "webhook_delivery",
                processed = outcome.processed,
                delivered = outcome.delivered,
                failed = outcome.failed,
                "Retry sweep completed"
            );
        }

        Ok(outcome)
    }

    /// Administrative manual retry: reset the attempt counter and retry
    /// timer, then re-process. Bypasses the backoff ladder.
    pub async fn retry_delivery(&self, delivery_id: Uuid) -> Result<DeliveryResult> {
        self.deliveries
            .reset_for_retry(delivery_id)
            .await?
            .ok_or(WebhookError::DeliveryNotFound)?;

        tracing::info!(
            target: "webhook_delivery",
            delivery_id = %delivery_id,
            "Manual retry requested"
        );

        self.process_delivery(delivery_id).await
    }

    /// Delivery history for one webhook, newest first. `page` is 1-based.
    pub async fn delivery_history(
        &self,
        webhook_id: Uuid,
        page: i64,
        per_page: i64,
    ) -> Result<Vec<WebhookDelivery>> {
        Ok(self
            .deliveries
            .list_by_webhook(webhook_id, page, per_page)
            .await?)
    }

    /// Aggregate delivery counts for one webhook.
    pub async fn delivery_stats(&self, webhook_id: Uuid) -> Result<DeliveryStats> {
        Ok(self.deliveries.count_by_webhook(webhook_id).await?)
    }

    /// Run one attempt at the delivery's persisted attempt counter and
    /// apply the success/retry-or-terminal transition.
    async fn execute_attempt(
        &self,
        delivery: &WebhookDelivery,
        webhook: &Webhook,
    ) -> Result<DeliveryResult> {
        let envelope = WebhookEnvelope::for_redelivery(&delivery.event_type, delivery.payload.clone());

        let outcome = match crypto::decrypt_secret(&webhook.secret_encrypted, &self.encryption_key)
        {
            Ok(secret) => self.sender.send(webhook, &secret, &envelope).await?,
            Err(e) => SendOutcome {
                success: false,
                status_code: None,
                response_body: None,
                error: Some(format!("Failed to decrypt signing secret: {e}")),
            },
        };

        if outcome.success {
            self.deliveries
                .mark_delivered(
                    delivery.id,
                    outcome.status_code.unwrap_or(0),
                    outcome.response_body.as_deref(),
                )
                .await?;

            tracing::info!(
                target: "webhook_delivery",
                delivery_id = %delivery.id,
                webhook_id = %webhook.id,
                event_type = %delivery.event_type,
                status_code = outcome.status_code.unwrap_or(0),
                attempt = delivery.attempt,
                "Webhook delivery succeeded"
            );

            return Ok(DeliveryResult {
                delivery_id: delivery.id,
                webhook_id: webhook.id,
                success: true,
                status_code: outcome.status_code,
                error: None,
            });
        }

        let error = outcome
            .error
            .unwrap_or_else(|| "Delivery failed".to_string());
        let next_attempt = delivery.attempt + 1;

        let mut advanced = delivery.clone();
        advanced.attempt = next_attempt;
        let next_retry_at = retry::should_retry(&advanced, webhook.retry_count)
            .then(|| retry::next_retry_time(delivery.attempt));

        self.deliveries
            .mark_failed(
                delivery.id,
                next_attempt,
                &error,
                outcome.status_code,
                outcome.response_body.as_deref(),
                next_retry_at,
            )
            .await?;

        tracing::warn!(
            target: "webhook_delivery",
            delivery_id = %delivery.id,
            webhook_id = %webhook.id,
            event_type = %delivery.event_type,
            error = %error,
            attempt = delivery.attempt,
            has_next_retry = next_retry_at.is_some(),
            "Webhook delivery failed"
        );

        Ok(DeliveryResult {
            delivery_id: delivery.id,
            webhook_id: webhook.id,
            success: false,
            status_code: outcome.status_code,
            error: Some(error),
        })
    }

    /// Terminal failure without an HTTP attempt: the webhook backing
    /// the delivery will never become valid again.
    async fn fail_terminal(
        &self,
        delivery: &WebhookDelivery,
        error: &str,
    ) -> Result<DeliveryResult> {
        self.deliveries
            .mark_failed(delivery.id, delivery.attempt, error, None, None, None)
            .await?;

        tracing::warn!(
            target: "webhook_delivery",
            delivery_id = %delivery.id,
            webhook_id = %delivery.webhook_id,
            error = %error,
            "Webhook delivery terminally failed without attempt"
        );

        Ok(DeliveryResult {
            delivery_id: delivery.id,
            webhook_id: delivery.webhook_id,
            success: false,
            status_code: None,
            error: Some(error.to_string()),
        })
    }
}
