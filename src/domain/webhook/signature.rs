//! HMAC-SHA256 signing and constant-time secret comparison.
//!
//! Used both for verifying inbound Kiwify signatures and for signing outbound
//! deliveries to subscribers.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Prefix of the outbound `X-Webhook-Signature` header value.
pub const SIGNATURE_PREFIX: &str = "sha256=";

/// Computes the hex-encoded HMAC-SHA256 of `body` under `secret`.
pub fn sign_hex(secret: &[u8], body: &[u8]) -> String {
    hex::encode(compute_hmac(secret, body))
}

/// Signature header value for outbound deliveries: `sha256=<hex>`.
pub fn signature_header_value(secret: &[u8], body: &[u8]) -> String {
    format!("{}{}", SIGNATURE_PREFIX, sign_hex(secret, body))
}

/// Verifies a hex signature over `body`.
///
/// Accepts an optional `sha256=` prefix and either letter case. Malformed hex
/// is treated as a mismatch.
pub fn verify_hex_signature(secret: &[u8], body: &[u8], provided: &str) -> bool {
    let provided = provided.trim();
    let provided = provided.strip_prefix(SIGNATURE_PREFIX).unwrap_or(provided);

    let Ok(provided_bytes) = hex::decode(provided) else {
        return false;
    };

    let expected = compute_hmac(secret, body);
    constant_time_compare(&expected, &provided_bytes)
}

/// Compares two shared secrets without leaking timing information.
pub fn secrets_match(expected: &[u8], provided: &[u8]) -> bool {
    constant_time_compare(expected, provided)
}

fn compute_hmac(secret: &[u8], body: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length, new_from_slice cannot fail here.
    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(mac) => mac,
        Err(_) => return Vec::new(),
    };
    mac.update(body);
    mac.finalize().into_bytes().to_vec()
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.is_empty() || a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
