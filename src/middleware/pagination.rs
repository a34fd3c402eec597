use async_trait::async_trait;

use fren_core::PaginationParams;

use crate::routing::{Flow, HandlerResult, RequestContext, Stage};

/// Parses `page` and `limit` from the query string into the context.
pub struct Paginate;

#[async_trait]
impl Stage for Paginate {
    async fn run(&self, ctx: &mut RequestContext) -> HandlerResult {
        let pagination = PaginationParams::parse(ctx.query("page"), ctx.query("limit"))?.resolve();
        ctx.pagination = Some(pagination);
        Ok(Flow::Next)
    }
}
