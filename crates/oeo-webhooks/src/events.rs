//! The fixed set of domain event types webhooks can subscribe to.

use serde::{Deserialize, Serialize};

/// A domain event type, serialized in dotted form (e.g. "order.completed").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "order.placed")]
    OrderPlaced,
    #[serde(rename = "order.completed")]
    OrderCompleted,
    #[serde(rename = "order.cancelled")]
    OrderCancelled,
    #[serde(rename = "order.refunded")]
    OrderRefunded,
    #[serde(rename = "attendee.checked_in")]
    AttendeeCheckedIn,
    #[serde(rename = "talk.submitted")]
    TalkSubmitted,
    #[serde(rename = "talk.accepted")]
    TalkAccepted,
    #[serde(rename = "talk.rejected")]
    TalkRejected,
    #[serde(rename = "event.published")]
    EventPublished,
    #[serde(rename = "edition.created")]
    EditionCreated,
}

impl EventType {
    /// The wire representation of this event type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::OrderPlaced => "order.placed",
            EventType::OrderCompleted => "order.completed",
            EventType::OrderCancelled => "order.cancelled",
            EventType::OrderRefunded => "order.refunded",
            EventType::AttendeeCheckedIn => "attendee.checked_in",
            EventType::TalkSubmitted => "talk.submitted",
            EventType::TalkAccepted => "talk.accepted",
            EventType::TalkRejected => "talk.rejected",
            EventType::EventPublished => "event.published",
            EventType::EditionCreated => "edition.created",
        }
    }

    /// Parse a dotted event type string. Returns `None` for unknown types.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::all().iter().find(|et| et.as_str() == s).copied()
    }

    /// All known event types.
    #[must_use]
    pub fn all() -> &'static [EventType] {
        &[
            EventType::OrderPlaced,
            EventType::OrderCompleted,
            EventType::OrderCancelled,
            EventType::OrderRefunded,
            EventType::AttendeeCheckedIn,
            EventType::TalkSubmitted,
            EventType::TalkAccepted,
            EventType::TalkRejected,
            EventType::EventPublished,
            EventType::EditionCreated,
        ]
    }
}

impl std::fmt::Display for EventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
