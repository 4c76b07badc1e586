//! Webhook signature verification
//!
//! Connect signs each delivery with HMAC-SHA256 over the raw request body
//! and sends the base64 digest in `X-DocuSign-Signature-1`. Verification
//! must run against the exact bytes received, before any JSON parsing.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use tracing::warn;

type HmacSha256 = Hmac<Sha256>;

/// Verifies Connect delivery signatures
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    hmac_key: Option<String>,
}

impl SignatureVerifier {
    pub fn new(hmac_key: &str) -> Self {
        Self {
            hmac_key: Some(hmac_key.to_string()),
        }
    }

    /// Verification disabled: every payload is accepted and each check
    /// logs a warning. Only acceptable where the endpoint is not reachable
    /// from the open internet.
    pub fn disabled() -> Self {
        Self { hmac_key: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.hmac_key.is_some()
    }

    /// Check `signature` against the raw body.
    ///
    /// The comparison is constant-time. With a key configured, an empty or
    /// undecodable signature fails closed.
    pub fn verify(&self, payload: &[u8], signature: &str) -> bool {
        let Some(key) = &self.hmac_key else {
            warn!("Webhook signature verification is disabled; accepting payload unchecked");
            return true;
        };

        if signature.is_empty() {
            return false;
        }
        let expected = match BASE64.decode(signature) {
            Ok(bytes) => bytes,
            Err(_) => return false,
        };

        let mut mac = match HmacSha256::new_from_slice(key.as_bytes()) {
            Ok(mac) => mac,
            Err(_) => return false,
        };
        mac.update(payload);
        mac.verify_slice(&expected).is_ok()
    }

    /// Compute the digest DocuSign would send for `payload`. Used to sign
    /// fixtures in tests and to debug delivery mismatches.
    pub fn sign(key: &str, payload: &[u8]) -> String {
        let mut mac = match HmacSha256::new_from_slice(key.as_bytes()) {
            Ok(mac) => mac,
            // HMAC accepts keys of any length.
            Err(_) => return String::new(),
        };
        mac.update(payload);
        BASE64.encode(mac.finalize().into_bytes())
    }
}
