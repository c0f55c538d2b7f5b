//! Cryptographic operations for webhook secrets and payload signing.
//!
//! - HMAC-SHA256 computation for webhook payload signatures
//! - AES-256-GCM encryption/decryption for signing secrets at rest

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::WebhookError;

/// Nonce size for AES-GCM (96 bits / 12 bytes).
const NONCE_SIZE: usize = 12;

type HmacSha256 = Hmac<Sha256>;

// ---------------------------------------------------------------------------
// HMAC-SHA256 payload signing
// ---------------------------------------------------------------------------

/// Compute the HMAC-SHA256 signature for a webhook payload.
///
/// The signature covers exactly the byte sequence that is transmitted;
/// receivers recompute the digest over the request body with the shared
/// secret. Returns a hex-encoded digest.
pub fn sign_payload(secret: &str, body: &[u8]) -> String {
    let mut mac = <HmacSha256 as Mac>::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");

    mac.update(body);

    hex::encode(mac.finalize().into_bytes())
}

/// Verify an HMAC-SHA256 signature using constant-time comparison.
pub fn verify_signature(expected_hex: &str, secret: &str, body: &[u8]) -> bool {
    let computed = sign_payload(secret, body);
    constant_time_eq(expected_hex.as_bytes(), computed.as_bytes())
}

/// Constant-time byte comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;
    a.ct_eq(b).into()
}

// ---------------------------------------------------------------------------
// AES-256-GCM encryption/decryption (for secrets at rest)
// ---------------------------------------------------------------------------

/// Encrypt a plaintext secret to a base64-encoded string for storage.
///
/// Format: base64(nonce || ciphertext || auth_tag)
pub fn encrypt_secret(plaintext: &str, key: &[u8]) -> Result<String, WebhookError> {
    if key.len() != 32 {
        return Err(WebhookError::EncryptionFailed(format!(
            "Invalid key length: expected 32 bytes, got {}",
            key.len()
        )));
    }

    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| WebhookError::EncryptionFailed(e.to_string()))?;

    use rand::rngs::OsRng;
    use rand::RngCore;
    let mut nonce_bytes = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|e| WebhookError::EncryptionFailed(e.to_string()))?;

    let mut result = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
    result.extend_from_slice(&nonce_bytes);
    result.extend_from_slice(&ciphertext);

    Ok(BASE64.encode(&result))
}

/// Decrypt a base64-encoded secret from storage back to plaintext.
pub fn decrypt_secret(encoded: &str, key: &[u8]) -> Result<String, WebhookError> {
    if key.len() != 32 {
        return Err(WebhookError::EncryptionFailed(format!(
            "Invalid key length: expected 32 bytes, got {}",
            key.len()
        )));
    }

    let encrypted = BASE64
        .decode(encoded)
        .map_err(|e| WebhookError::EncryptionFailed(format!("Base64 decode failed: {e}")))?;

    if encrypted.len() < NONCE_SIZE + 1 {
        return Err(WebhookError::EncryptionFailed(
            "Invalid encrypted data format".to_string(),
        ));
    }

    let cipher = Aes256Gcm::new_from_slice(key)
        .map_err(|e| WebhookError::EncryptionFailed(e.to_string()))?;

    let nonce = Nonce::from_slice(&encrypted[..NONCE_SIZE]);
    let ciphertext = &encrypted[NONCE_SIZE..];

    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|e| WebhookError::EncryptionFailed(e.to_string()))?;

    String::from_utf8(plaintext).map_err(|e| WebhookError::EncryptionFailed(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn test_key() -> [u8; 32] {
        [0x42u8; 32]
    }

    // --- HMAC-SHA256 tests ---

    #[test]
    fn test_signature_deterministic() {
        let sig1 = sign_payload("secret", b"payload");
        let sig2 = sign_payload("secret", b"payload");
        assert_eq!(sig1, sig2);
    }

    #[test]
    fn test_signature_changes_with_different_secret() {
        let sig1 = sign_payload("secret1", b"payload");
        let sig2 = sign_payload("secret2", b"payload");
        assert_ne!(sig1, sig2);
    }

    #[test]
    fn test_signature_changes_with_different_body() {
        let sig1 = sign_payload("secret", b"payload1");
        let sig2 = sign_payload("secret", b"payload2");
        assert_ne!(sig1, sig2);
    }

    #[test]
    fn test_signature_is_hex_encoded() {
        let sig = sign_payload("secret", b"payload");
        // SHA256 = 32 bytes = 64 hex chars
        assert_eq!(sig.len(), 64);
        assert!(sig.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_no_collisions_across_distinct_secrets() {
        let body = b"{\"event\":\"order.completed\"}";
        let mut seen = HashSet::new();
        for i in 0..120 {
            let secret = format!("whsec_distinct_secret_number_{i:04}");
            assert!(
                seen.insert(sign_payload(&secret, body)),
                "digest collision for secret {i}"
            );
        }
    }

    #[test]
    fn test_verify_signature_valid() {
        let secret = "my-webhook-secret";
        let body = b"test-body";

        let sig = sign_payload(secret, body);
        assert!(verify_signature(&sig, secret, body));
    }

    #[test]
    fn test_verify_signature_invalid() {
        assert!(!verify_signature("invalid-hex", "secret", b"payload"));
    }

    #[test]
    fn test_constant_time_eq_different_length() {
        assert!(!constant_time_eq(b"hello", b"hi"));
    }

    // --- AES-GCM tests ---

    #[test]
    fn test_encrypt_decrypt_roundtrip() {
        let key = test_key();
        let plaintext = "my-webhook-secret-key-1234567890abc";

        let encrypted = encrypt_secret(plaintext, &key).expect("encryption failed");
        let decrypted = decrypt_secret(&encrypted, &key).expect("decryption failed");

        assert_eq!(decrypted, plaintext);
    }

    #[test]
    fn test_different_encryptions_produce_different_ciphertext() {
        let key = test_key();
        let plaintext = "same-secret";

        let enc1 = encrypt_secret(plaintext, &key).expect("encryption failed");
        let enc2 = encrypt_secret(plaintext, &key).expect("encryption failed");

        // Random nonce makes ciphertexts differ
        assert_ne!(enc1, enc2);
    }

    #[test]
    fn test_invalid_key_length() {
        let short_key = [0u8; 16];
        let result = encrypt_secret("test", &short_key);
        assert!(result.is_err());
    }

    #[test]
    fn test_decrypt_with_wrong_key() {
        let key1 = [0x42u8; 32];
        let key2 = [0x43u8; 32];

        let encrypted = encrypt_secret("secret", &key1).expect("encryption failed");
        assert!(decrypt_secret(&encrypted, &key2).is_err());
    }

    #[test]
    fn test_decrypt_invalid_base64() {
        let key = test_key();
        assert!(decrypt_secret("not-valid-base64!!!", &key).is_err());
    }
}
