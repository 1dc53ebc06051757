//! `X-Hub-Signature-256` computation and verification.

use hmac::digest::InvalidLength;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";
const SIGNATURE_PREFIX: &str = "sha256=";

/// `sha256=` followed by the lowercase hex HMAC-SHA256 of `body`.
pub fn sign(secret: &str, body: &[u8]) -> Result<String, InvalidLength> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())?;
    mac.update(body);
    Ok(format!("{SIGNATURE_PREFIX}{:x}", mac.finalize().into_bytes()))
}

/// Constant-time comparison of `signature` against the expected value.
/// The header must match the digest byte for byte.
pub fn verify(secret: &str, body: &[u8], signature: &str) -> Result<bool, InvalidLength> {
    let expected = sign(secret, body)?;
    Ok(expected.as_bytes().ct_eq(signature.as_bytes()).unwrap_u8() == 1)
}
