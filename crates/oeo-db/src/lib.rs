//! Persistence layer for the OEO webhook subsystem.
//!
//! Exposes typed models for webhooks and their delivery records, the
//! store traits the dispatcher depends on, and one concrete adapter per
//! backend: an in-memory store for tests/embedded use and a Postgres
//! store backed by sqlx.

pub mod error;
pub mod migrations;
pub mod models;
pub mod store;

pub use error::StoreError;
pub use models::{
    CreateWebhook, CreateWebhookDelivery, DeliveryStats, DispatchScope, UpdateWebhook, Webhook,
    WebhookDelivery,
};
pub use store::memory::MemoryStore;
pub use store::postgres::PgStore;
pub use store::{DeliveryStore, WebhookStore};
