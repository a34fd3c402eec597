//! # Fren Config
//!
//! Configuration structures loaded from environment variables. Binaries load
//! `.env` with `dotenvy` before calling any `from_env`.
//!
//! - [`jwt`]: session token signing
//! - [`crypto`]: encryption of persisted tokens
//! - [`cors`]: allowed origins
//! - [`server`]: listener, environment, timeouts and body limits
//! - [`upload`]: storage location and avatar limits
//! - [`admin`]: optional bootstrap administrator

pub mod admin;
pub mod cors;
pub mod crypto;
pub mod jwt;
pub mod server;
pub mod upload;

pub use admin::AdminConfig;
pub use cors::CorsConfig;
pub use crypto::CryptoConfig;
pub use jwt::JwtConfig;
pub use server::{Environment, ServerConfig};
pub use upload::UploadConfig;

use std::env;
use std::str::FromStr;

/// Reads and parses an environment variable, falling back to `default` when
/// it is missing or malformed.
pub(crate) fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.trim().parse().ok())
        .unwrap_or(default)
}

/// Reads a non-empty environment variable.
pub(crate) fn env_opt(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
