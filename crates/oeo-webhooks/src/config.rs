//! Webhook subsystem configuration loading and types.

use std::path::Path;

use serde::Deserialize;

use crate::error::{Result, WebhookError};

/// Root webhook subsystem configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhooksConfig {
    /// Key used to encrypt signing secrets at rest. Base64, decodes to
    /// 32 bytes.
    pub encryption_key: String,
    #[serde(default = "default_default_retry_count")]
    pub default_retry_count: i32,
    #[serde(default = "default_max_webhooks_per_org")]
    pub max_webhooks_per_org: i64,
    #[serde(default)]
    pub allow_http_urls: bool,
    #[serde(default)]
    pub worker: WorkerConfig,
}

fn default_default_retry_count() -> i32 {
    3
}

fn default_max_webhooks_per_org() -> i64 {
    25
}

/// Retry sweep worker configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerConfig {
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
    #[serde(default = "default_sweep_batch_size")]
    pub sweep_batch_size: usize,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
            sweep_batch_size: default_sweep_batch_size(),
        }
    }
}

fn default_sweep_interval() -> u64 {
    30
}

fn default_sweep_batch_size() -> usize {
    100
}

impl WebhooksConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            WebhookError::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;

        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content)
            .map_err(|e| WebhookError::Config(format!("Failed to parse config: {e}")))
    }

    /// Get the configuration file path from environment or default.
    #[must_use]
    pub fn config_path() -> String {
        std::env::var("OEO_WEBHOOKS_CONFIG").unwrap_or_else(|_| "./config/webhooks.yaml".to_string())
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("OEO_WEBHOOK_ENCRYPTION_KEY") {
            self.encryption_key = key;
        }
        if let Ok(interval) = std::env::var("OEO_WEBHOOK_SWEEP_INTERVAL_SECS") {
            if let Ok(interval) = interval.parse() {
                self.worker.sweep_interval_secs = interval;
            }
        }
    }

    /// Decode the at-rest encryption key.
    ///
    /// # Errors
    ///
    /// Returns `WebhookError::Config` if the key is not valid base64 or
    /// does not decode to exactly 32 bytes.
    pub fn decoded_encryption_key(&self) -> Result<Vec<u8>> {
        use base64::Engine;

        let key = base64::engine::general_purpose::STANDARD
            .decode(&self.encryption_key)
            .map_err(|e| WebhookError::Config(format!("Encryption key is not valid base64: {e}")))?;
        if key.len() != 32 {
            return Err(WebhookError::Config(format!(
                "Encryption key must decode to 32 bytes, got {}",
                key.len()
            )));
        }
        Ok(key)
    }
}
