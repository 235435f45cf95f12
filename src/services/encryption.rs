// src/services/encryption.rs
//! AES-256-GCM sealing for provider secrets stored in `system_settings`.
//!
//! Sealed values are `v1:` followed by base64(nonce || ciphertext).

use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use rand::RngCore;
use std::env;
use thiserror::Error;

const SEALED_PREFIX: &str = "v1:";
const NONCE_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum EncryptionError {
    #[error("Encryption key not configured")]
    KeyNotConfigured,

    #[error("Invalid encryption key format")]
    InvalidKeyFormat,

    #[error("Encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("Decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("Invalid encrypted data format")]
    InvalidDataFormat,
}

pub struct EncryptionService {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for EncryptionService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncryptionService")
            .field("cipher", &"<redacted>")
            .finish()
    }
}

impl EncryptionService {
    /// Reads the base64 master key from `ENCRYPTION_MASTER_KEY`
    pub fn from_env() -> Result<Self, EncryptionError> {
        let key_str =
            env::var("ENCRYPTION_MASTER_KEY").map_err(|_| EncryptionError::KeyNotConfigured)?;

        Self::from_key(key_str.trim())
    }

    #[allow(deprecated)]
    pub fn from_key(key_str: &str) -> Result<Self, EncryptionError> {
        let key_bytes = BASE64
            .decode(key_str.as_bytes())
            .map_err(|_| EncryptionError::InvalidKeyFormat)?;

        if key_bytes.len() != 32 {
            return Err(EncryptionError::InvalidKeyFormat);
        }

        let key = aes_gcm::Key::<Aes256Gcm>::from_slice(&key_bytes);
        Ok(Self {
            cipher: Aes256Gcm::new(key),
        })
    }

    /// Generate a new random master key (base64-encoded)
    pub fn generate_key() -> String {
        let mut key = [0u8; 32];
        OsRng.fill_bytes(&mut key);
        BASE64.encode(key)
    }

    /// True when `value` carries the sealed-value prefix
    pub fn is_sealed(value: &str) -> bool {
        value.starts_with(SEALED_PREFIX)
    }

    #[allow(deprecated)]
    pub fn encrypt(&self, plaintext: &str) -> Result<String, EncryptionError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, plaintext.as_bytes())
            .map_err(|e| EncryptionError::EncryptionFailed(e.to_string()))?;

        let mut combined = Vec::with_capacity(NONCE_LEN + ciphertext.len());
        combined.extend_from_slice(&nonce_bytes);
        combined.extend_from_slice(&ciphertext);

        Ok(format!("{}{}", SEALED_PREFIX, BASE64.encode(combined)))
    }

    #[allow(deprecated)]
    pub fn decrypt(&self, sealed: &str) -> Result<String, EncryptionError> {
        let encoded = sealed
            .strip_prefix(SEALED_PREFIX)
            .ok_or(EncryptionError::InvalidDataFormat)?;

        let combined = BASE64
            .decode(encoded.as_bytes())
            .map_err(|_| EncryptionError::InvalidDataFormat)?;

        if combined.len() <= NONCE_LEN {
            return Err(EncryptionError::InvalidDataFormat);
        }

        let (nonce_bytes, ciphertext) = combined.split_at(NONCE_LEN);
        let plaintext_bytes = self
            .cipher
            .decrypt(Nonce::from_slice(nonce_bytes), ciphertext)
            .map_err(|e| EncryptionError::DecryptionFailed(e.to_string()))?;

        String::from_utf8(plaintext_bytes)
            .map_err(|_| EncryptionError::DecryptionFailed("invalid UTF-8".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_key_builds_service() {
        let key = EncryptionService::generate_key();
        assert!(EncryptionService::from_key(&key).is_ok());
    }

    #[test]
    fn test_sealed_api_key_opens_with_same_master_key() {
        let service = EncryptionService::from_key(&EncryptionService::generate_key()).unwrap();

        let sealed = service.encrypt("sk-test-123").unwrap();
        assert!(EncryptionService::is_sealed(&sealed));
        assert!(!sealed.contains("sk-test-123"));
        assert_eq!(service.decrypt(&sealed).unwrap(), "sk-test-123");
    }

    #[test]
    fn test_other_master_key_cannot_open() {
        let a = EncryptionService::from_key(&EncryptionService::generate_key()).unwrap();
        let b = EncryptionService::from_key(&EncryptionService::generate_key()).unwrap();

        let sealed = a.encrypt("tvly-secret").unwrap();
        assert!(matches!(
            b.decrypt(&sealed),
            Err(EncryptionError::DecryptionFailed(_))
        ));
    }

    #[test]
    fn test_invalid_key_format() {
        assert!(EncryptionService::from_key("not-base64!!").is_err());
        // Valid base64, wrong length
        assert!(EncryptionService::from_key("c2hvcnQ=").is_err());
    }

    #[test]
    fn test_unsealed_value_is_rejected() {
        let service = EncryptionService::from_key(&EncryptionService::generate_key()).unwrap();
        assert!(matches!(
            service.decrypt("plain-value"),
            Err(EncryptionError::InvalidDataFormat)
        ));
    }
}
