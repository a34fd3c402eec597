use std::sync::Arc;

use async_trait::async_trait;
use axum::http::Method;

use fren_core::AppError;

use super::{HandlerFuture, HandlerResult, RequestContext};
use crate::middleware::multipart::MultipartOptions;
use crate::modules::roles::model::RoleSet;

/// A link in a route's chain.
#[async_trait]
pub trait Stage: Send + Sync {
    async fn run(&self, ctx: &mut RequestContext) -> HandlerResult;
}

/// A link that only runs while an error is being forwarded.
#[async_trait]
pub trait ErrorStage: Send + Sync {
    async fn run(&self, err: AppError, ctx: &mut RequestContext) -> HandlerResult;
}

pub type HandlerFn = for<'a> fn(&'a mut RequestContext) -> HandlerFuture<'a>;

pub type ErrorHandlerFn = for<'a> fn(AppError, &'a mut RequestContext) -> HandlerFuture<'a>;

struct FnStage(HandlerFn);

#[async_trait]
impl Stage for FnStage {
    async fn run(&self, ctx: &mut RequestContext) -> HandlerResult {
        (self.0)(ctx).await
    }
}

struct FnErrorStage(ErrorHandlerFn);

#[async_trait]
impl ErrorStage for FnErrorStage {
    async fn run(&self, err: AppError, ctx: &mut RequestContext) -> HandlerResult {
        (self.0)(err, ctx).await
    }
}

#[derive(Clone)]
pub enum Handler {
    Normal(Arc<dyn Stage>),
    OnError(Arc<dyn ErrorStage>),
}

impl Handler {
    pub fn stage(stage: impl Stage + 'static) -> Self {
        Handler::Normal(Arc::new(stage))
    }

    pub fn func(f: HandlerFn) -> Self {
        Handler::Normal(Arc::new(FnStage(f)))
    }

    pub fn on_error(f: ErrorHandlerFn) -> Self {
        Handler::OnError(Arc::new(FnErrorStage(f)))
    }
}

/// Immutable description of one endpoint.
#[derive(Clone)]
pub struct RouteDescriptor {
    pub method: Method,
    pub path: &'static str,
    pub handlers: Vec<Handler>,
    pub authenticate: bool,
    pub pagination: bool,
    pub multipart: Option<MultipartOptions>,
    pub role_accept: Option<RoleSet>,
    pub role_reject: Option<RoleSet>,
}

impl RouteDescriptor {
    pub fn new(method: Method, path: &'static str) -> Self {
        Self {
            method,
            path,
            handlers: Vec::new(),
            authenticate: true,
            pagination: false,
            multipart: None,
            role_accept: None,
            role_reject: None,
        }
    }

    pub fn get(path: &'static str) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: &'static str) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: &'static str) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: &'static str) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Skips authentication, session validation and the account-status check.
    pub fn public(mut self) -> Self {
        self.authenticate = false;
        self
    }

    pub fn paginated(mut self) -> Self {
        self.pagination = true;
        self
    }

    pub fn accept(mut self, roles: impl Into<RoleSet>) -> Self {
        self.role_accept = Some(roles.into());
        self
    }

    pub fn reject(mut self, roles: impl Into<RoleSet>) -> Self {
        self.role_reject = Some(roles.into());
        self
    }

    pub fn multipart(mut self, options: MultipartOptions) -> Self {
        self.multipart = Some(options);
        self
    }

    pub fn handler(mut self, f: HandlerFn) -> Self {
        self.handlers.push(Handler::func(f));
        self
    }

    pub fn on_error(mut self, f: ErrorHandlerFn) -> Self {
        self.handlers.push(Handler::on_error(f));
        self
    }

    pub fn stage(mut self, stage: impl Stage + 'static) -> Self {
        self.handlers.push(Handler::stage(stage));
        self
    }
}
