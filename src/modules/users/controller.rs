use fren_core::AppError;

use super::model::UserStatus;
use crate::middleware::params::USER_ID;
use crate::routing::{Flow, HandlerFuture, RequestContext};

pub const AVATAR_FIELD: &str = "avatar";

pub fn list_users(ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let pagination = ctx.pagination();
        let users = ctx.state().users.list(&pagination).await?;
        Ok(Flow::json(users))
    })
}

pub fn current_user(ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let user_id = ctx.user_id()?;
        let user = ctx.state().users.get(user_id).await?;
        Ok(Flow::json(user))
    })
}

pub fn get_user(ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let user_id = ctx.param(USER_ID)?;
        let user = ctx.state().users.get(user_id).await?;
        Ok(Flow::json(user))
    })
}

async fn change_status(ctx: &mut RequestContext, status: UserStatus) -> Result<Flow, AppError> {
    let admin_id = ctx.user_id()?;
    let user_id = ctx.param(USER_ID)?;
    let change = ctx
        .state()
        .users
        .change_status(admin_id, user_id, status)
        .await?;
    Ok(Flow::json(change))
}

pub fn approve_user(ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(change_status(ctx, UserStatus::Active))
}

pub fn disable_user(ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(change_status(ctx, UserStatus::Disabled))
}

/// Replaces the caller's avatar with the uploaded image.
pub fn upload_avatar(ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let user_id = ctx.user_id()?;
        let mut form = ctx
            .take_form()
            .ok_or_else(|| AppError::missing_parameter(AVATAR_FIELD))?;
        let file = form
            .take_files(AVATAR_FIELD)
            .into_iter()
            .next()
            .ok_or_else(|| AppError::missing_parameter(AVATAR_FIELD))?;

        let state = ctx.state().clone();
        let avatar = state
            .users
            .set_avatar(user_id, &file, state.storage.as_ref())
            .await?;
        Ok(Flow::json(avatar))
    })
}
