//! Input validation for webhook registration.
//!
//! Covers delivery URL checks (scheme, SSRF protection against private
//! and internal addresses), event type validity, secret strength, and
//! the shape of custom header maps.

use std::net::IpAddr;

use crate::error::WebhookError;
use crate::events::EventType;

/// Minimum accepted signing secret length, in bytes.
pub const MIN_SECRET_LEN: usize = 32;

/// Upper bound on configured retry attempts per delivery.
pub const MAX_RETRY_COUNT: i32 = 10;

// ---------------------------------------------------------------------------
// URL validation
// ---------------------------------------------------------------------------

/// Validate a webhook delivery URL.
///
/// Checks:
/// 1. URL is parseable
/// 2. Scheme is HTTPS (or HTTP if `allow_http` is true for dev/test)
/// 3. Host is not a private/internal address (SSRF protection)
pub fn validate_webhook_url(url: &str, allow_http: bool) -> Result<(), WebhookError> {
    let parsed = url::Url::parse(url)
        .map_err(|e| WebhookError::InvalidUrl(format!("Invalid URL format: {e}")))?;

    match parsed.scheme() {
        "https" => {}
        "http" if allow_http => {}
        "http" => {
            return Err(WebhookError::InvalidUrl(
                "Webhook URLs must use HTTPS".to_string(),
            ));
        }
        scheme => {
            return Err(WebhookError::InvalidUrl(format!(
                "Unsupported URL scheme: {scheme}"
            )));
        }
    }

    let host = parsed
        .host_str()
        .ok_or_else(|| WebhookError::InvalidUrl("URL must have a host".to_string()))?;

    validate_host_not_internal(host)
}

/// Validate that a host is not a private/internal address.
///
/// Blocks loopback, RFC 1918 private ranges, link-local (cloud metadata
/// endpoints live at 169.254.169.254), CGNAT, IPv6 loopback/unspecified,
/// and well-known internal hostname suffixes.
pub fn validate_host_not_internal(host: &str) -> Result<(), WebhookError> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        if is_internal_ip(&ip) {
            return Err(WebhookError::SsrfDetected(format!(
                "Destination host {host} is a private/internal address"
            )));
        }
    }

    let lower = host.to_ascii_lowercase();
    if lower == "localhost"
        || lower == "metadata.google.internal"
        || lower.ends_with(".internal")
        || lower.ends_with(".local")
    {
        return Err(WebhookError::SsrfDetected(format!(
            "Destination host {host} is a restricted internal hostname"
        )));
    }

    Ok(())
}

fn is_internal_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()                // 127.0.0.0/8
                || v4.is_private()          // 10.0.0.0/8, 172.16.0.0/12, 192.168.0.0/16
                || v4.is_link_local()       // 169.254.0.0/16
                || v4.is_broadcast()
                || v4.is_unspecified()
                || (v4.octets()[0] == 100 && (v4.octets()[1] & 0xC0) == 64) // 100.64.0.0/10 (CGNAT)
        }
        IpAddr::V6(v6) => v6.is_loopback() || v6.is_unspecified(),
    }
}

// ---------------------------------------------------------------------------
// Registration field validation
// ---------------------------------------------------------------------------

/// Validate that every event type string names a known [`EventType`].
///
/// An empty set never matches anything, so it is rejected too.
pub fn validate_event_types(event_types: &[String]) -> Result<(), WebhookError> {
    if event_types.is_empty() {
        return Err(WebhookError::Validation(
            "At least one event type is required".to_string(),
        ));
    }
    for et in event_types {
        if EventType::parse(et).is_none() {
            return Err(WebhookError::Validation(format!(
                "Unknown event type: {et}"
            )));
        }
    }
    Ok(())
}

/// Validate signing secret strength.
pub fn validate_secret(secret: &str) -> Result<(), WebhookError> {
    if secret.len() < MIN_SECRET_LEN {
        return Err(WebhookError::Validation(format!(
            "Signing secret must be at least {MIN_SECRET_LEN} bytes"
        )));
    }
    Ok(())
}

/// Validate the configured retry count.
pub fn validate_retry_count(retry_count: i32) -> Result<(), WebhookError> {
    if !(0..=MAX_RETRY_COUNT).contains(&retry_count) {
        return Err(WebhookError::Validation(format!(
            "Retry count must be between 0 and {MAX_RETRY_COUNT}"
        )));
    }
    Ok(())
}

/// Validate a custom header map: must be a JSON object whose values are
/// all strings. Reserved delivery headers are filtered at send time,
/// not rejected here.
pub fn validate_custom_headers(headers: &serde_json::Value) -> Result<(), WebhookError> {
    let serde_json::Value::Object(map) = headers else {
        return Err(WebhookError::Validation(
            "Custom headers must be an object".to_string(),
        ));
    };
    for (name, value) in map {
        if !value.is_string() {
            return Err(WebhookError::Validation(format!(
                "Custom header {name} must have a string value"
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // --- URL validation ---

    #[test]
    fn test_valid_https_url() {
        assert!(validate_webhook_url("https://example.com/webhooks", false).is_ok());
    }

    #[test]
    fn test_valid_https_url_with_port() {
        assert!(validate_webhook_url("https://hooks.example.com:8443/callback", false).is_ok());
    }

    #[test]
    fn test_http_url_rejected_in_production() {
        let result = validate_webhook_url("http://example.com/webhooks", false);
        assert!(matches!(result.unwrap_err(), WebhookError::InvalidUrl(_)));
    }

    #[test]
    fn test_http_url_allowed_in_dev() {
        assert!(validate_webhook_url("http://example.com/webhooks", true).is_ok());
    }

    #[test]
    fn test_invalid_url_format() {
        assert!(validate_webhook_url("not-a-url", false).is_err());
    }

    #[test]
    fn test_unsupported_scheme() {
        assert!(validate_webhook_url("ftp://example.com/webhooks", false).is_err());
    }

    // --- SSRF protection ---

    #[test]
    fn test_ssrf_blocks_loopback() {
        assert!(validate_host_not_internal("127.0.0.1").is_err());
        assert!(validate_host_not_internal("127.0.0.2").is_err());
    }

    #[test]
    fn test_ssrf_blocks_private_ranges() {
        assert!(validate_host_not_internal("10.0.0.1").is_err());
        assert!(validate_host_not_internal("172.16.0.1").is_err());
        assert!(validate_host_not_internal("192.168.0.1").is_err());
    }

    #[test]
    fn test_ssrf_blocks_link_local_metadata() {
        assert!(validate_host_not_internal("169.254.169.254").is_err());
        assert!(validate_host_not_internal("169.254.0.1").is_err());
    }

    #[test]
    fn test_ssrf_blocks_cgnat() {
        assert!(validate_host_not_internal("100.64.0.1").is_err());
        assert!(validate_host_not_internal("100.127.255.255").is_err());
    }

    #[test]
    fn test_ssrf_blocks_ipv6_loopback_and_unspecified() {
        assert!(validate_host_not_internal("::1").is_err());
        assert!(validate_host_not_internal("::").is_err());
    }

    #[test]
    fn test_ssrf_blocks_localhost() {
        assert!(validate_host_not_internal("localhost").is_err());
        assert!(validate_host_not_internal("LOCALHOST").is_err());
    }

    #[test]
    fn test_ssrf_blocks_internal_hostnames() {
        assert!(validate_host_not_internal("metadata.google.internal").is_err());
        assert!(validate_host_not_internal("service.internal").is_err());
        assert!(validate_host_not_internal("myhost.local").is_err());
    }

    #[test]
    fn test_ssrf_allows_public_hosts() {
        assert!(validate_host_not_internal("8.8.8.8").is_ok());
        assert!(validate_host_not_internal("203.0.113.50").is_ok());
        assert!(validate_host_not_internal("hooks.myapp.io").is_ok());
    }

    #[test]
    fn test_ssrf_url_integration() {
        assert!(matches!(
            validate_webhook_url("https://10.0.0.1/webhook", false).unwrap_err(),
            WebhookError::SsrfDetected(_)
        ));
        assert!(matches!(
            validate_webhook_url("https://localhost/webhook", false).unwrap_err(),
            WebhookError::SsrfDetected(_)
        ));
    }

    // --- Registration fields ---

    #[test]
    fn test_valid_event_types() {
        let types = vec![
            "order.placed".to_string(),
            "talk.accepted".to_string(),
            "attendee.checked_in".to_string(),
        ];
        assert!(validate_event_types(&types).is_ok());
    }

    #[test]
    fn test_invalid_event_type() {
        let types = vec!["order.placed".to_string(), "invalid.event.type".to_string()];
        let err = validate_event_types(&types).unwrap_err();
        assert!(err.to_string().contains("invalid.event.type"));
    }

    #[test]
    fn test_empty_event_types_rejected() {
        assert!(validate_event_types(&[]).is_err());
    }

    #[test]
    fn test_all_event_types_valid() {
        let types: Vec<String> = EventType::all()
            .iter()
            .map(|et| et.as_str().to_string())
            .collect();
        assert!(validate_event_types(&types).is_ok());
    }

    #[test]
    fn test_secret_length() {
        assert!(validate_secret("short").is_err());
        assert!(validate_secret(&"s".repeat(31)).is_err());
        assert!(validate_secret(&"s".repeat(32)).is_ok());
    }

    #[test]
    fn test_retry_count_bounds() {
        assert!(validate_retry_count(0).is_ok());
        assert!(validate_retry_count(3).is_ok());
        assert!(validate_retry_count(10).is_ok());
        assert!(validate_retry_count(-1).is_err());
        assert!(validate_retry_count(11).is_err());
    }

    #[test]
    fn test_custom_headers_shape() {
        assert!(validate_custom_headers(&json!({"X-Api-Key": "k"})).is_ok());
        assert!(validate_custom_headers(&json!({})).is_ok());
        assert!(validate_custom_headers(&json!({"X-Count": 3})).is_err());
        assert!(validate_custom_headers(&json!(["not", "a", "map"])).is_err());
    }
}
