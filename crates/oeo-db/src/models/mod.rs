//! Typed persistence models.

pub mod webhook;
pub mod webhook_delivery;

pub use webhook::{CreateWebhook, DispatchScope, UpdateWebhook, Webhook};
pub use webhook_delivery::{CreateWebhookDelivery, DeliveryStats, WebhookDelivery};
