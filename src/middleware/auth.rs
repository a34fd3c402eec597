use async_trait::async_trait;
use axum::http::{HeaderMap, header};

use fren_core::{AppError, ErrorKind};

use crate::modules::users::model::UserStatus;
use crate::routing::{Flow, HandlerResult, RequestContext, Stage};

/// Extracts the credential from `Authorization: Bearer <token>` or
/// `Authorization: Token <token>`. The scheme is case-insensitive.
pub fn credential(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();

    let known = scheme.eq_ignore_ascii_case("bearer") || scheme.eq_ignore_ascii_case("token");
    (known && !token.is_empty()).then_some(token)
}

/// Verifies the presented token's signature and expiry.
pub struct Authenticate;

#[async_trait]
impl Stage for Authenticate {
    async fn run(&self, ctx: &mut RequestContext) -> HandlerResult {
        let token = credential(ctx.headers())
            .ok_or_else(|| AppError::not_authorized("jwt"))?
            .to_string();
        let payload = ctx.state().tokens.verify(&token)?;

        ctx.token = Some(token);
        ctx.payload = Some(payload);
        Ok(Flow::Next)
    }
}

/// Requires the token to be the user's current active token.
pub struct ValidateSession;

#[async_trait]
impl Stage for ValidateSession {
    async fn run(&self, ctx: &mut RequestContext) -> HandlerResult {
        let user_id = ctx.user_id()?;
        let token = ctx.token().ok_or_else(|| AppError::not_authorized("jwt"))?;

        ctx.state().tokens.validate_active(user_id, token).await?;
        Ok(Flow::Next)
    }
}

/// Rejects disabled accounts.
pub struct AccountStatus;

#[async_trait]
impl Stage for AccountStatus {
    async fn run(&self, ctx: &mut RequestContext) -> HandlerResult {
        let user_id = ctx.user_id()?;
        let status = ctx
            .state()
            .user_repo
            .status(user_id)
            .await
            .map_err(|err| match err.kind {
                ErrorKind::NotFound => AppError::not_authorized("jwt"),
                _ => err,
            })?;

        if status == UserStatus::Disabled {
            return Err(AppError::not_authorized("disabled"));
        }
        Ok(Flow::Next)
    }
}
