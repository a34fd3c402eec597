//! Session tokens with a single active token per user.
//!
//! A token is accepted only when its signature and expiry check out and it
//! equals the token stored (encrypted) on the user row. Issuing a token
//! overwrites the stored one, so every earlier token stops working.

use std::sync::Arc;

use tracing::instrument;

use fren_auth::{SignedToken, TokenCipher, TokenPayload, sign_token, verify_token};
use fren_config::{CryptoConfig, JwtConfig};
use fren_core::{AppError, ErrorKind, verify_password};

use crate::modules::users::model::{User, UserStatus};
use crate::store::UserRepository;

use super::model::{LoginFailure, LoginRequest};

#[derive(Clone)]
pub struct TokenService {
    users: Arc<dyn UserRepository>,
    cipher: TokenCipher,
    jwt: JwtConfig,
}

fn stale_session() -> AppError {
    AppError::not_authorized("jwt")
}

/// A vanished user row means the session is gone.
fn missing_user_is_stale(err: AppError) -> AppError {
    if err.kind == ErrorKind::NotFound {
        stale_session()
    } else {
        err
    }
}

impl TokenService {
    pub fn new(users: Arc<dyn UserRepository>, jwt: JwtConfig, crypto: &CryptoConfig) -> Self {
        Self {
            users,
            cipher: TokenCipher::new(crypto),
            jwt,
        }
    }

    /// Configured token lifetime in seconds.
    pub fn ttl_seconds(&self) -> i64 {
        self.jwt.token_ttl_seconds()
    }

    /// Signs a token and stores it as the user's only active token.
    #[instrument(skip(self))]
    pub async fn issue(&self, user_id: i64, ttl_seconds: i64) -> Result<SignedToken, AppError> {
        let signed = sign_token(user_id, ttl_seconds, &self.jwt)?;
        let stored = self.cipher.encrypt(&signed.token)?;
        self.users.set_active_token(user_id, Some(&stored)).await?;

        tracing::debug!(user_id, expires_at = signed.expires_at, "Issued session token");
        Ok(signed)
    }

    pub fn verify(&self, token: &str) -> Result<TokenPayload, AppError> {
        verify_token(token, &self.jwt)
    }

    #[instrument(skip(self, token))]
    pub async fn validate_active(&self, user_id: i64, token: &str) -> Result<(), AppError> {
        let stored = self
            .users
            .active_token(user_id)
            .await
            .map_err(missing_user_is_stale)?;

        self.check_stored(stored.as_deref(), token)
    }

    /// Replaces `old_token` with a fresh one. The comparison against the
    /// stored token and the write happen under the user's row lock, so of two
    /// concurrent refreshes with the same token only the first succeeds.
    #[instrument(skip(self, old_token))]
    pub async fn refresh(
        &self,
        user_id: i64,
        old_token: &str,
        ttl_seconds: i64,
    ) -> Result<SignedToken, AppError> {
        let signed = sign_token(user_id, ttl_seconds, &self.jwt)?;
        let stored = self.cipher.encrypt(&signed.token)?;

        let check = |current: Option<&str>| self.check_stored(current, old_token);
        self.users
            .replace_active_token(user_id, &check, &stored)
            .await
            .map_err(missing_user_is_stale)?;

        tracing::debug!(user_id, expires_at = signed.expires_at, "Refreshed session token");
        Ok(signed)
    }

    #[instrument(skip(self))]
    pub async fn revoke(&self, user_id: i64) -> Result<(), AppError> {
        self.users
            .set_active_token(user_id, None)
            .await
            .map_err(missing_user_is_stale)
    }

    fn check_stored(&self, stored: Option<&str>, token: &str) -> Result<(), AppError> {
        let Some(stored) = stored else {
            return Err(stale_session());
        };

        match self.cipher.decrypt(stored) {
            Ok(active) if active == token => Ok(()),
            Ok(_) => Err(stale_session()),
            Err(e) => {
                tracing::warn!(error = %e, "Stored session token is unreadable");
                Err(stale_session())
            }
        }
    }
}

pub struct AuthService;

impl AuthService {
    /// Resolves a login attempt to a user, or the reason it was refused.
    /// Unknown and disabled accounts are indistinguishable to the caller.
    #[instrument(skip(users, request), fields(username = %request.username))]
    pub async fn check_credentials(
        users: &dyn UserRepository,
        request: &LoginRequest,
    ) -> Result<Result<User, LoginFailure>, AppError> {
        if request.username.trim().is_empty() || request.password.is_empty() {
            return Ok(Err(LoginFailure::MissingCredentials));
        }

        let Some(user) = users.find_by_email(request.username.trim()).await? else {
            return Ok(Err(LoginFailure::InvalidUser));
        };

        match user.status {
            UserStatus::Disabled => return Ok(Err(LoginFailure::InvalidUser)),
            UserStatus::Unconfirmed => return Ok(Err(LoginFailure::NotVerified)),
            UserStatus::Active => {}
        }

        let hash = users.password_hash(user.id).await?;
        if !verify_password(&request.password, &hash)? {
            return Ok(Err(LoginFailure::InvalidPassword));
        }

        Ok(Ok(user))
    }
}
