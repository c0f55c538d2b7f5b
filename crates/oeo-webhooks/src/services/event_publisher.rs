//! Domain event publishing over a tokio broadcast channel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use oeo_db::DispatchScope;

use crate::events::EventType;

/// A domain event emitted by back office operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DomainEvent {
    pub id: Uuid,
    pub event_type: EventType,
    pub scope: DispatchScope,
    pub occurred_at: DateTime<Utc>,
    pub data: serde_json::Value,
}

impl DomainEvent {
    pub fn new(event_type: EventType, scope: DispatchScope, data: serde_json::Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            event_type,
            scope,
            occurred_at: Utc::now(),
            data,
        }
    }
}

/// Publisher that fans domain events out to dispatch subscribers.
#[derive(Clone)]
pub struct EventPublisher {
    sender: tokio::sync::broadcast::Sender<DomainEvent>,
}

impl EventPublisher {
    /// Create a new event publisher with the given channel capacity.
    pub fn new(capacity: usize) -> (Self, tokio::sync::broadcast::Receiver<DomainEvent>) {
        let (sender, receiver) = tokio::sync::broadcast::channel(capacity);
        (Self { sender }, receiver)
    }

    /// Publish an event to all subscribers. Fire-and-forget; a missing
    /// subscriber is logged, not propagated.
    pub fn publish(&self, event: DomainEvent) {
        if let Err(e) = self.sender.send(event) {
            tracing::warn!(
                target: "webhook_delivery",
                error = %e,
                "No active webhook subscribers to receive event"
            );
        }
    }

    /// Get a new receiver for the broadcast channel.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<DomainEvent> {
        self.sender.subscribe()
    }
}
