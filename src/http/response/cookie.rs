//! Cookie signing.
//!
//! A signed value is `"<base64(HMAC-SHA256(secret, value))>.<value>"`.
//! Standard base64 never contains `.`, so verification splits on the first
//! one.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::ResponseError;

type HmacSha256 = Hmac<Sha256>;

fn digest(value: &str, secret: &str) -> Result<Vec<u8>, ResponseError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| ResponseError::InvalidCookieSecret(e.to_string()))?;
    mac.update(value.as_bytes());
    Ok(mac.finalize().into_bytes().to_vec())
}

/// Sign `value` with `secret`.
pub fn sign_value(value: &str, secret: &str) -> Result<String, ResponseError> {
    Ok(format!("{}.{}", STANDARD.encode(digest(value, secret)?), value))
}

/// Verify a signed value, returning the original value when the signature
/// matches. The comparison runs in constant time.
pub fn verify_signed_value(signed: &str, secret: &str) -> Option<String> {
    let (signature, value) = signed.split_once('.')?;
    let provided = STANDARD.decode(signature).ok()?;
    let expected = digest(value, secret).ok()?;
    if bool::from(provided.ct_eq(&expected)) {
        Some(value.to_string())
    } else {
        None
    }
}
