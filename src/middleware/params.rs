//! Path parameters resolved into the request context.

use async_trait::async_trait;

use fren_core::AppError;

use crate::routing::{Flow, HandlerResult, RequestContext, Stage};

pub const USER_ID: &str = "userId";

/// Resolves `{userId}`, where the literal `current` means the caller.
pub struct UserIdParam;

#[async_trait]
impl Stage for UserIdParam {
    async fn run(&self, ctx: &mut RequestContext) -> HandlerResult {
        let raw = ctx
            .path_param(USER_ID)
            .ok_or_else(|| AppError::missing_parameter(USER_ID))?;

        let user_id = if raw == "current" {
            ctx.user_id()?
        } else {
            raw.parse::<i64>()
                .map_err(|_| AppError::invalid_parameter(USER_ID))?
        };

        ctx.set_param(USER_ID, user_id);
        Ok(Flow::Next)
    }
}
