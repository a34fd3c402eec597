//! # Fren Auth
//!
//! Stateless halves of the session-token protocol:
//!
//! - [`payload`]: the signed token payload
//! - [`jwt`]: signing and verification (HS256, no expiry leeway)
//! - [`cipher`]: AES-256-GCM encryption for the copy of the active token
//!   persisted with each user
//!
//! The stateful checks (single active token, refresh) live in the API crate
//! where the user store is available.

pub mod cipher;
pub mod jwt;
pub mod payload;

pub use cipher::{CipherError, TokenCipher};
pub use jwt::{SignedToken, sign_token, verify_token};
pub use payload::TokenPayload;
