//! Wire format of license codes and public keys.
//!
//! A code is `base64(JSON{payload, signature})` where `payload` is
//! `base64(JSON{emailHash, exp})` and `signature` is a base64 Ed25519
//! signature over the decoded payload bytes.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Standard alphabet, padding optional on decode.
pub(crate) const BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// DER prefix of an Ed25519 SubjectPublicKeyInfo; the raw key follows it.
const ED25519_SPKI_PREFIX: [u8; 12] = [
    0x30, 0x2a, 0x30, 0x05, 0x06, 0x03, 0x2b, 0x65, 0x70, 0x03, 0x21, 0x00,
];

/// The signed content of a license.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicensePayload {
    #[serde(rename = "emailHash")]
    pub email_hash: String,
    /// Expiry, Unix seconds.
    pub exp: i64,
}

/// Outer envelope of a license code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedLicense {
    #[serde(default)]
    pub payload: String,
    #[serde(default)]
    pub signature: String,
}

/// Base64 decode after dropping ASCII whitespace.
pub(crate) fn decode_base64(input: &str) -> Option<Vec<u8>> {
    let compact: String = input.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    BASE64.decode(compact).ok()
}

pub(crate) fn encode_base64(bytes: &[u8]) -> String {
    BASE64.encode(bytes)
}

/// Normalize a configured public key (raw base64 or PEM) to its 32 key bytes.
///
/// PEM armor lines are stripped; a DER SPKI wrapper around an Ed25519 key
/// is unwrapped. Returns `None` for empty or undecodable input.
pub fn decode_public_key(key: &str) -> Option<Vec<u8>> {
    let body: String = key
        .lines()
        .filter(|l| !l.trim_start().starts_with("-----"))
        .collect();
    if body.trim().is_empty() {
        return None;
    }
    let bytes = decode_base64(&body)?;
    match bytes.strip_prefix(&ED25519_SPKI_PREFIX[..]) {
        Some(raw) if raw.len() == 32 => Some(raw.to_vec()),
        _ => Some(bytes),
    }
}

/// Decode the outer envelope; both fields must be present and non-empty.
pub(crate) fn decode_license(code: &str) -> Option<EncodedLicense> {
    let json = decode_base64(code)?;
    let decoded: EncodedLicense = serde_json::from_slice(&json).ok()?;
    if decoded.payload.is_empty() || decoded.signature.is_empty() {
        return None;
    }
    Some(decoded)
}

/// Decode the inner payload, returning it with the raw signed bytes.
pub(crate) fn decode_payload(encoded: &str) -> Option<(LicensePayload, Vec<u8>)> {
    let bytes = decode_base64(encoded)?;
    let payload: LicensePayload = serde_json::from_slice(&bytes).ok()?;
    Some((payload, bytes))
}
