//! Outbound webhook dispatch for organization/event/edition domain events.
//!
//! Provides scoped webhook subscription management, HTTP POST delivery
//! with HMAC-SHA256 signing, bounded timeouts, truncated response
//! capture, and a persisted exponential-backoff retry state machine
//! that survives process restarts.

pub mod config;
pub mod crypto;
pub mod error;
pub mod events;
pub mod matcher;
pub mod models;
pub mod retry;
pub mod sender;
pub mod services;
pub mod validation;
pub mod worker;

pub use config::WebhooksConfig;
pub use error::WebhookError;
pub use events::EventType;
pub use models::{DeliveryResult, SweepOutcome, WebhookEnvelope};
pub use sender::Sender;
pub use services::dispatcher::Dispatcher;
pub use services::event_publisher::{DomainEvent, EventPublisher};
pub use services::webhook_service::WebhookService;
pub use worker::RetryWorker;
