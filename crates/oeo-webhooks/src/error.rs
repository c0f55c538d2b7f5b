//! Error types for the webhook system.

use oeo_db::StoreError;

/// Webhook system error variants.
///
/// Endpoint-level failures (timeouts, non-2xx responses, missing
/// webhooks) are recovered into delivery results and never surface
/// here; these variants cover the cases where the caller itself is at
/// fault or durable state cannot be trusted.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("SSRF protection: {0}")]
    SsrfDetected(String),

    #[error("Webhook limit ({limit}) reached for organization")]
    WebhookLimitExceeded { limit: i64 },

    #[error("Webhook not found")]
    WebhookNotFound,

    #[error("Delivery not found")]
    DeliveryNotFound,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, WebhookError>;
