//! Session token signing and verification.
//!
//! Tokens are HS256 JWTs over [`TokenPayload`]. Verification fails with
//! `NotAuthorized` carrying `"expired"` when the token is past its expiry and
//! `"jwt"` for any other defect (bad signature, malformed input).

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use uuid::Uuid;

use fren_config::JwtConfig;
use fren_core::AppError;

use crate::payload::TokenPayload;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedToken {
    pub token: String,
    pub expires_at: i64,
}

pub fn sign_token(
    user_id: i64,
    ttl_seconds: i64,
    config: &JwtConfig,
) -> Result<SignedToken, AppError> {
    let now = Utc::now().timestamp();
    let payload = TokenPayload {
        id: user_id,
        exp: now + ttl_seconds,
        iat: now,
        jti: Uuid::new_v4().to_string(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &payload,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;

    Ok(SignedToken {
        token,
        expires_at: payload.exp,
    })
}

pub fn verify_token(token: &str, config: &JwtConfig) -> Result<TokenPayload, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let payload = decode::<TokenPayload>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AppError::not_authorized("expired"),
        _ => AppError::not_authorized("jwt"),
    })?;

    if payload.exp <= Utc::now().timestamp() {
        return Err(AppError::not_authorized("expired"));
    }

    Ok(payload)
}
