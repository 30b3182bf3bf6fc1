//! License issuing (vendor/support tooling). Not needed for verification.

use anyhow::{Context, Result};
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};

use super::codec::{decode_base64, encode_base64, EncodedLicense, LicensePayload};

/// Base64-encoded Ed25519 keypair.
#[derive(Debug, Clone)]
pub struct Keypair {
    pub secret_key: String,
    pub public_key: String,
}

/// Generate a fresh signing keypair from the OS RNG.
pub fn generate_keypair() -> Keypair {
    let mut secret = [0u8; 32];
    OsRng.fill_bytes(&mut secret);
    let signing_key = SigningKey::from_bytes(&secret);
    Keypair {
        secret_key: encode_base64(signing_key.as_bytes()),
        public_key: encode_public_key(&signing_key.verifying_key()),
    }
}

/// Raw base64 form accepted by `license.public_key` in config.toml.
pub fn encode_public_key(key: &VerifyingKey) -> String {
    encode_base64(key.as_bytes())
}

pub fn signing_key_from_base64(secret: &str) -> Result<SigningKey> {
    let bytes = decode_base64(secret).context("secret key is not valid base64")?;
    let array: [u8; 32] = bytes
        .as_slice()
        .try_into()
        .map_err(|_| anyhow::anyhow!("secret key must be 32 bytes, got {}", bytes.len()))?;
    Ok(SigningKey::from_bytes(&array))
}

/// Lowercase hex SHA-256 of the trimmed, lowercased email.
pub fn email_hash(email: &str) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    hex::encode(digest)
}

/// Produce a license code for `email` expiring at `exp` (Unix seconds).
pub fn issue(signing_key: &SigningKey, email: &str, exp: i64) -> Result<String> {
    let payload = LicensePayload {
        email_hash: email_hash(email),
        exp,
    };
    let payload_json = serde_json::to_vec(&payload).context("serialize license payload")?;
    let signature = signing_key.sign(&payload_json);
    let envelope = EncodedLicense {
        payload: encode_base64(&payload_json),
        signature: encode_base64(&signature.to_bytes()),
    };
    let envelope_json = serde_json::to_vec(&envelope).context("serialize license envelope")?;
    Ok(encode_base64(&envelope_json))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_hash_normalizes() {
        assert_eq!(email_hash(" User@Example.com "), email_hash("user@example.com"));
        assert_eq!(email_hash("a").len(), 64);
    }

    #[test]
    fn keypair_roundtrips_through_base64() {
        let pair = generate_keypair();
        let sk = signing_key_from_base64(&pair.secret_key).unwrap();
        assert_eq!(encode_base64(sk.verifying_key().as_bytes()), pair.public_key);
    }

    #[test]
    fn signing_key_rejects_wrong_length() {
        assert!(signing_key_from_base64(&encode_base64(&[1u8; 16])).is_err());
        assert!(signing_key_from_base64("***").is_err());
    }
}
