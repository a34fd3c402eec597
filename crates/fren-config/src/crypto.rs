use crate::env_opt;

/// Secret used to encrypt the active session token stored with each user.
#[derive(Clone, Debug)]
pub struct CryptoConfig {
    pub secret: String,
}

impl CryptoConfig {
    pub fn from_env() -> Self {
        let secret = env_opt("CRYPTO_SECRET").unwrap_or_else(|| {
            tracing::warn!("CRYPTO_SECRET is not set, using an insecure development secret");
            "fren-development-crypto-secret".to_string()
        });

        Self { secret }
    }
}
