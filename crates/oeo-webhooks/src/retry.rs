//! Retry scheduling: the fixed backoff ladder and the retry policy.

use chrono::{DateTime, Duration, Utc};
use oeo_db::WebhookDelivery;

/// Backoff ladder (in milliseconds): 1 min, 5 min, then 30 min capped.
const BACKOFF_LADDER_MS: [i64; 3] = [60_000, 300_000, 1_800_000];

/// Delay before the retry that follows the given failed attempt.
///
/// `attempt` is 1-based and counts completed attempts: the retry after
/// the first failure waits 60 s, after the second 5 min, and every
/// later retry waits the 30 min cap. Monotonically non-decreasing.
#[must_use]
pub fn next_delay(attempt: i32) -> i64 {
    let idx = (attempt - 1).clamp(0, BACKOFF_LADDER_MS.len() as i32 - 1) as usize;
    BACKOFF_LADDER_MS[idx]
}

/// Timestamp of the retry that follows the given failed attempt.
#[must_use]
pub fn next_retry_time(attempt: i32) -> DateTime<Utc> {
    Utc::now() + Duration::milliseconds(next_delay(attempt))
}

/// Whether another attempt is allowed.
///
/// The caller passes the record with the attempt counter already
/// advanced to the attempt that would run next; retries continue while
/// that counter stays below `max_retries` and the delivery has not
/// succeeded.
#[must_use]
pub fn should_retry(delivery: &WebhookDelivery, max_retries: i32) -> bool {
    delivery.attempt < max_retries && !delivery.is_delivered()
}
