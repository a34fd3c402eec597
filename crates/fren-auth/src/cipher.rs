//! Encryption for persisted session tokens.
//!
//! The key is the SHA-256 digest of the configured secret. Each ciphertext is
//! `base64(nonce || aes-256-gcm(token))` with a random 12 byte nonce.

use aes_gcm::{
    Aes256Gcm, Nonce,
    aead::{Aead, KeyInit},
};
use base64::{Engine, engine::general_purpose::STANDARD};
use rand::RngCore;
use sha2::{Digest, Sha256};

use fren_config::CryptoConfig;

const NONCE_LEN: usize = 12;

#[derive(Debug, thiserror::Error)]
pub enum CipherError {
    #[error("token encryption failed")]
    Encrypt,
    #[error("stored token could not be decrypted: {0}")]
    Decrypt(&'static str),
}

#[derive(Clone)]
pub struct TokenCipher {
    cipher: Aes256Gcm,
}

impl std::fmt::Debug for TokenCipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCipher").finish_non_exhaustive()
    }
}

impl TokenCipher {
    pub fn new(config: &CryptoConfig) -> Self {
        let key = Sha256::digest(config.secret.as_bytes());
        Self {
            cipher: Aes256Gcm::new(&key),
        }
    }

    pub fn encrypt(&self, token: &str) -> Result<String, CipherError> {
        let mut nonce_bytes = [0u8; NONCE_LEN];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), token.as_bytes())
            .map_err(|_| CipherError::Encrypt)?;

        let mut combined = nonce_bytes.to_vec();
        combined.extend_from_slice(&ciphertext);
        Ok(STANDARD.encode(combined))
    }

    pub fn decrypt(&self, stored: &str) -> Result<String, CipherError> {
        let combined = STANDARD
            .decode(stored)
            .map_err(|_| CipherError::Decrypt("invalid base64"))?;
        if combined.len() < NONCE_LEN {
            return Err(CipherError::Decrypt("too short"));
        }

        let (nonce, ciphertext) = combined.split_at(NONCE_LEN);
        let plaintext = self
            .cipher
            .decrypt(Nonce::from_slice(nonce), ciphertext)
            .map_err(|_| CipherError::Decrypt("authentication failed"))?;

        String::from_utf8(plaintext).map_err(|_| CipherError::Decrypt("not utf-8"))
    }
}
