use std::time::Duration;

use crate::{env_opt, env_or};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    fn parse(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "test" => Self::Test,
            _ => Self::Development,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub port: u16,
    pub environment: Environment,
    pub request_timeout: Duration,
    pub body_limit: usize,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            port: env_or("PORT", 3000),
            environment: env_opt("ENVIRONMENT")
                .map(|raw| Environment::parse(&raw))
                .unwrap_or(Environment::Development),
            request_timeout: Duration::from_secs(env_or("REQUEST_TIMEOUT_SECS", 60)),
            body_limit: env_or("BODY_LIMIT_BYTES", 10 * 1024 * 1024),
        }
    }

    /// Inner error chains are only rendered outside production.
    pub fn expose_inner_errors(&self) -> bool {
        self.environment != Environment::Production
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            environment: Environment::Development,
            request_timeout: Duration::from_secs(60),
            body_limit: 10 * 1024 * 1024,
        }
    }
}
