//! Eligibility predicates: does a webhook receive a given dispatch?

use oeo_db::{DispatchScope, Webhook};

use crate::events::EventType;

/// True iff the webhook's subscription set contains `event_type`.
#[must_use]
pub fn matches_event(webhook: &Webhook, event_type: EventType) -> bool {
    webhook
        .event_types
        .iter()
        .any(|et| et == event_type.as_str())
}

/// Scope matching with wildcard semantics.
///
/// For each of {organization, event, edition}: the dimension constrains
/// only when set on BOTH the webhook and the dispatch scope, in which
/// case the values must be equal. A webhook with no scope fields set
/// matches every dispatch scope.
#[must_use]
pub fn matches_scope(webhook: &Webhook, scope: &DispatchScope) -> bool {
    dimension_matches(webhook.organization_id, scope.organization_id)
        && dimension_matches(webhook.event_id, scope.event_id)
        && dimension_matches(webhook.edition_id, scope.edition_id)
}

fn dimension_matches(webhook_dim: Option<uuid::Uuid>, scope_dim: Option<uuid::Uuid>) -> bool {
    match (webhook_dim, scope_dim) {
        (Some(w), Some(s)) => w == s,
        _ => true,
    }
}

/// A webhook is eligible for a dispatch iff it is active, subscribed to
/// the event type, and its scope applies.
#[must_use]
pub fn is_eligible(webhook: &Webhook, event_type: EventType, scope: &DispatchScope) -> bool {
    webhook.is_active && matches_event(webhook, event_type) && matches_scope(webhook, scope)
}
