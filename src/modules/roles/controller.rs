use fren_core::AppError;

use super::model::RoleId;
use crate::middleware::params::USER_ID;
use crate::routing::{Flow, HandlerFuture, RequestContext};

pub const ROLE_ID: &str = "roleId";

fn role_param(ctx: &RequestContext) -> Result<RoleId, AppError> {
    ctx.path_param(ROLE_ID)
        .ok_or_else(|| AppError::missing_parameter(ROLE_ID))?
        .parse()
}

pub fn get_user_roles(ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let user_id = ctx.param(USER_ID)?;
        let grants = ctx.state().roles.get_all(user_id).await?;
        Ok(Flow::json(grants))
    })
}

pub fn get_user_role(ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let user_id = ctx.param(USER_ID)?;
        let role = role_param(ctx)?;
        let grant = ctx.state().roles.get(user_id, role).await?;
        Ok(Flow::json(grant))
    })
}

pub fn enable_user_role(ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let user_id = ctx.param(USER_ID)?;
        let role = role_param(ctx)?;
        let roles = &ctx.state().roles;

        roles.enable(user_id, role).await?;
        tracing::info!(admin_id = ctx.user_id()?, user_id, role = %role, "Role granted");
        Ok(Flow::json(roles.get_all(user_id).await?))
    })
}

pub fn disable_user_role(ctx: &mut RequestContext) -> HandlerFuture<'_> {
    Box::pin(async move {
        let user_id = ctx.param(USER_ID)?;
        let role = role_param(ctx)?;
        let roles = &ctx.state().roles;

        roles.disable(user_id, role).await?;
        tracing::info!(admin_id = ctx.user_id()?, user_id, role = %role, "Role revoked");
        Ok(Flow::json(roles.get_all(user_id).await?))
    })
}
