//! License code verification.
//!
//! Verification never fails: every malformed input resolves to an
//! `invalid` [`LicenseState`], so it is safe to run on arbitrary user input.

mod codec;
mod issue;
mod persist;

pub use codec::{decode_public_key, EncodedLicense, LicensePayload};
pub use issue::{
    email_hash, encode_public_key, generate_keypair, issue, signing_key_from_base64, Keypair,
};

use ed25519_dalek::{Signature, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::config::LicenseConfig;

/// Developer/support unlock code. Only honored when enabled in config.
pub const DEV_UNLOCK_CODE: &str = "DEV-UNLOCK";

const DEV_UNLOCK_VALIDITY_MS: i64 = 1000 * 60 * 60 * 24 * 365;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LicenseStatus {
    Valid,
    Invalid,
    Expired,
}

/// Result of one verification. Timestamps are Unix milliseconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicenseState {
    pub code: String,
    pub status: LicenseStatus,
    pub last_checked: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature_valid: Option<bool>,
}

impl LicenseState {
    fn invalid(code: &str, now_ms: i64, signature_valid: Option<bool>) -> Self {
        Self {
            code: code.to_string(),
            status: LicenseStatus::Invalid,
            last_checked: now_ms,
            expires_at: None,
            signature_valid,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.status == LicenseStatus::Valid
    }
}

/// Verifier bound to one public key.
#[derive(Debug, Clone, Default)]
pub struct LicenseVerifier {
    public_key: Option<Vec<u8>>,
    allow_dev_unlock: bool,
}

impl LicenseVerifier {
    pub fn new(public_key: Option<Vec<u8>>) -> Self {
        Self {
            public_key,
            allow_dev_unlock: false,
        }
    }

    pub fn from_config(cfg: &LicenseConfig) -> Self {
        let public_key = cfg.public_key.as_deref().and_then(decode_public_key);
        if cfg.public_key.is_some() && public_key.is_none() {
            tracing::warn!("configured license public key could not be decoded");
        }
        Self::new(public_key).with_dev_unlock(cfg.allow_dev_unlock)
    }

    pub fn with_dev_unlock(mut self, allow: bool) -> Self {
        self.allow_dev_unlock = allow;
        self
    }

    pub fn verify(&self, code: &str, now_ms: i64) -> LicenseState {
        if code.is_empty() {
            return LicenseState::invalid(code, now_ms, None);
        }
        if self.allow_dev_unlock && code == DEV_UNLOCK_CODE {
            tracing::info!("license accepted via developer unlock code");
            return LicenseState {
                code: code.to_string(),
                status: LicenseStatus::Valid,
                last_checked: now_ms,
                expires_at: Some(now_ms + DEV_UNLOCK_VALIDITY_MS),
                signature_valid: Some(true),
            };
        }
        verify(code, self.public_key.as_deref(), now_ms)
    }

    pub fn verify_now(&self, code: &str) -> LicenseState {
        self.verify(code, now_millis())
    }
}

/// Verify `code` against `public_key` (raw 32 bytes) at `now_ms`.
pub fn verify(code: &str, public_key: Option<&[u8]>, now_ms: i64) -> LicenseState {
    if code.is_empty() {
        return LicenseState::invalid(code, now_ms, None);
    }
    let Some(public_key) = public_key else {
        return LicenseState::invalid(code, now_ms, Some(false));
    };
    let Some(encoded) = codec::decode_license(code) else {
        return LicenseState::invalid(code, now_ms, Some(false));
    };
    let Some((payload, message)) = codec::decode_payload(&encoded.payload) else {
        return LicenseState::invalid(code, now_ms, Some(false));
    };

    if !signature_matches(public_key, &message, &encoded.signature) {
        tracing::debug!("license signature rejected");
        return LicenseState::invalid(code, now_ms, Some(false));
    }

    let expires_at = payload.exp.saturating_mul(1000);
    let status = if expires_at < now_ms {
        LicenseStatus::Expired
    } else {
        LicenseStatus::Valid
    };
    LicenseState {
        code: code.to_string(),
        status,
        last_checked: now_ms,
        expires_at: Some(expires_at),
        signature_valid: Some(true),
    }
}

fn signature_matches(public_key: &[u8], message: &[u8], signature_b64: &str) -> bool {
    let Ok(key_bytes): Result<[u8; 32], _> = public_key.try_into() else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&key_bytes) else {
        return false;
    };
    let Some(sig_bytes) = codec::decode_base64(signature_b64) else {
        return false;
    };
    let Ok(sig_array): Result<[u8; 64], _> = sig_bytes.as_slice().try_into() else {
        return false;
    };
    verifying_key
        .verify(message, &Signature::from_bytes(&sig_array))
        .is_ok()
}

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}
