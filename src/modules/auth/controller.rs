use axum::http::header;

use fren_core::{AppError, ErrorKind};

use super::model::{
    LoginFailure, LoginRequest, SessionResponse, SetPasswordRequest, TokenResponse,
};
use super::service::AuthService;
use crate::middleware::params::USER_ID;
use crate::routing::{Flow, HandlerFuture, RequestContext};

fn user_agent(ctx: &RequestContext) -> String {
    ctx.headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

/// Checks the submitted credentials. Refusals are forwarded to
/// [`login_failed`]; on success the user id is left for [`login`].
pub fn check_credentials(ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let request = match ctx.json::<LoginRequest>().await {
            Ok(request) => request,
            Err(err)
                if matches!(
                    err.kind,
                    ErrorKind::MissingParameter | ErrorKind::InvalidParameter
                ) =>
            {
                return Ok(Flow::Forward(AppError::not_authorized(
                    LoginFailure::MissingCredentials.as_str(),
                )));
            }
            Err(err) => return Err(err),
        };

        let state = ctx.state().clone();
        match AuthService::check_credentials(state.user_repo.as_ref(), &request).await? {
            Ok(user) => {
                ctx.set_param(USER_ID, user.id);
                Ok(Flow::Next)
            }
            Err(failure) => Ok(Flow::Forward(AppError::not_authorized(failure.as_str()))),
        }
    })
}

pub fn login(ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let user_id = ctx.param(USER_ID)?;
        let state = ctx.state().clone();

        state.user_repo.touch_last_login(user_id).await?;
        let signed = state.tokens.issue(user_id, state.tokens.ttl_seconds()).await?;
        let user = state.users.get(user_id).await?;

        tracing::info!(user_id, user_agent = %user_agent(ctx), "Login succeeded");
        Ok(Flow::json(TokenResponse {
            user,
            token: signed.token,
            token_expiration: signed.expires_at,
            token_duration: state.tokens.ttl_seconds(),
        }))
    })
}

/// Turns a forwarded login refusal into a `NotAuthorized` response with a
/// message the client can show.
pub fn login_failed(err: AppError, ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let Some(failure) = err.details_str().and_then(LoginFailure::from_details) else {
            return Err(err);
        };

        tracing::warn!(
            cause = failure.as_str(),
            user_agent = %user_agent(ctx),
            "Login refused"
        );
        Err(err.with_friendly(failure.friendly()))
    })
}

pub fn logout(ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let user_id = ctx.user_id()?;
        ctx.state().tokens.revoke(user_id).await?;
        tracing::info!(user_id, "Logged out");
        Ok(Flow::success())
    })
}

/// Exchanges the presented token for a fresh one.
pub fn refresh(ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let user_id = ctx.user_id()?;
        let token = ctx
            .token()
            .ok_or_else(|| AppError::not_authorized("jwt"))?
            .to_string();
        let state = ctx.state().clone();

        let ttl = state.tokens.ttl_seconds();
        let signed = state.tokens.refresh(user_id, &token, ttl).await?;
        let user = state.users.get(user_id).await?;

        Ok(Flow::json(TokenResponse {
            user,
            token: signed.token,
            token_expiration: signed.expires_at,
            token_duration: ttl,
        }))
    })
}

/// Changes the caller's password. Every session of the user ends with it.
pub fn set_password(ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let user_id = ctx.user_id()?;
        let request = ctx.json::<SetPasswordRequest>().await?;
        if request.new_password != request.new_password_confirmation {
            return Err(AppError::invalid_parameter("newPasswordConfirmation"));
        }

        ctx.state()
            .users
            .change_password(user_id, &request.old_password, &request.new_password)
            .await?;
        Ok(Flow::success())
    })
}

pub fn session(ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let user_id = ctx.user_id()?;
        let state = ctx.state().clone();

        let user = state.users.get(user_id).await?;
        let roles = state.roles.granted(user_id).await?;
        Ok(Flow::json(SessionResponse { user, roles }))
    })
}
