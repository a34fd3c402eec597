use crate::{env_opt, env_or};

#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    /// Token lifetime in minutes.
    pub token_ttl: i64,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let secret = env_opt("JWT_SECRET").unwrap_or_else(|| {
            tracing::warn!("JWT_SECRET is not set, using an insecure development secret");
            "fren-development-jwt-secret".to_string()
        });

        Self {
            secret,
            token_ttl: env_or("JWT_TTL_MINUTES", 60),
        }
    }

    pub fn token_ttl_seconds(&self) -> i64 {
        self.token_ttl * 60
    }
}
