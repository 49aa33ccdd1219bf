//! HMAC-SHA256 signing for outbound webhook payloads.
//!
//! The signature scheme:
//! - Signature is computed over: `{timestamp}.{payload}`
//! - The digest is hex-encoded HMAC-SHA256 keyed with the registration secret
//! - The token carried in the `webhook-signature` header is
//!   `t={timestamp},v1={hex-digest}`
//!
//! Verification tolerates a bounded clock skew between signer and verifier
//! and degrades to "untrusted" (returns `false`) on any malformed input.

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::config::DispatchConfig;

type HmacSha256 = Hmac<Sha256>;

/// Prefix for webhook secrets
pub const SECRET_PREFIX: &str = "whsec_";

/// Default replay tolerance window in seconds.
pub const DEFAULT_TOLERANCE_SECS: i64 = 300;

/// Generate a new webhook secret.
///
/// Returns a `whsec_` prefixed hex-encoded 32-byte random secret drawn from
/// the OS-backed CSPRNG.
pub fn generate_secret() -> String {
    use rand::RngCore;

    let mut secret_bytes = [0u8; 32];
    rand::rng().fill_bytes(&mut secret_bytes);

    format!("{}{}", SECRET_PREFIX, hex::encode(secret_bytes))
}

/// Sign a webhook payload.
///
/// The signature is computed over `{timestamp}.{payload}` and returned as
/// the token `t={timestamp},v1={hex-hmac-sha256}`.
///
/// # Panics
///
/// Panics if `secret` is empty. Secrets are always generated by
/// [`generate_secret`]; an empty one is a programming error, not a
/// recoverable condition.
pub fn sign(payload: &str, secret: &str, timestamp: i64) -> String {
    assert!(!secret.is_empty(), "webhook secret must not be empty");

    format!("t={},v1={}", timestamp, hmac_hex(payload, secret, timestamp))
}

/// Verify a webhook signature token against a payload.
///
/// Parses the `t=` and `v1=` fields from the token, rejects timestamps more
/// than `tolerance_secs` away from `now`, recomputes the HMAC and compares
/// in constant time.
///
/// Returns `false` on any parse or mismatch condition; never panics on
/// malformed input. Callers must treat `false` as "reject", not as an
/// exceptional condition.
pub fn verify(payload: &str, token: &str, secret: &str, now: i64, tolerance_secs: i64) -> bool {
    if secret.is_empty() {
        return false;
    }

    let mut timestamp: Option<i64> = None;
    let mut signature: Option<&str> = None;
    for field in token.split(',') {
        if let Some(value) = field.strip_prefix("t=") {
            timestamp = value.parse().ok();
        } else if let Some(value) = field.strip_prefix("v1=") {
            signature = Some(value);
        }
    }

    let (Some(timestamp), Some(signature)) = (timestamp, signature) else {
        return false;
    };

    // Replay / clock-skew protection. Checked arithmetic so absurd
    // timestamps reject instead of overflowing.
    match now.checked_sub(timestamp).and_then(i64::checked_abs) {
        Some(skew) if skew <= tolerance_secs => {}
        _ => return false,
    }

    let expected = hmac_hex(payload, secret, timestamp);

    // Constant-time comparison to prevent timing attacks
    constant_time_eq(signature.as_bytes(), expected.as_bytes())
}

/// Verifier carrying the configured replay tolerance.
///
/// For callers validating inbound callback signatures with the same scheme
/// used on outbound deliveries; wraps [`verify`] with the wall clock and the
/// tolerance from [`DispatchConfig`].
#[derive(Debug, Clone)]
pub struct SignatureVerifier {
    tolerance_secs: i64,
}

impl SignatureVerifier {
    pub fn new(tolerance_secs: i64) -> Self {
        Self { tolerance_secs }
    }

    pub fn from_config(config: &DispatchConfig) -> Self {
        Self::new(config.tolerance_secs)
    }

    /// Verify a token against the current wall clock.
    pub fn verify(&self, payload: &str, token: &str, secret: &str) -> bool {
        verify(payload, token, secret, chrono::Utc::now().timestamp(), self.tolerance_secs)
    }
}

impl Default for SignatureVerifier {
    fn default() -> Self {
        Self::new(DEFAULT_TOLERANCE_SECS)
    }
}

fn hmac_hex(payload: &str, secret: &str, timestamp: i64) -> String {
    let signed_input = format!("{}.{}", timestamp, payload);

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC-SHA256 accepts keys of any length");
    mac.update(signed_input.as_bytes());

    hex::encode(mac.finalize().into_bytes())
}

/// Constant-time byte comparison.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}
