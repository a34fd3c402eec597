use std::any::Any;
use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use axum::{
    Router,
    extract::{RawPathParams, Request, State},
    http::Method,
    response::Response,
    routing::{MethodFilter, MethodRouter},
};
use futures::FutureExt;

use fren_core::{AppError, ErrorKind};

use super::{Flow, Handler, HandlerResult, RequestContext, RouteDescriptor};
use crate::middleware::auth::{AccountStatus, Authenticate, ValidateSession};
use crate::middleware::multipart::ParseMultipart;
use crate::middleware::pagination::Paginate;
use crate::middleware::role::{RoleAccept, RoleReject};
use crate::state::AppState;

#[derive(Debug, thiserror::Error)]
pub enum RouteConfigError {
    #[error("{method} {path}: role checks require an authenticated route")]
    RolesWithoutAuthentication { method: Method, path: &'static str },
    #[error("{method} {path}: no handlers declared")]
    NoHandlers { method: Method, path: &'static str },
    #[error("{method} {path}: declared more than once")]
    Duplicate { method: Method, path: &'static str },
    #[error("{method} {path}: multipart routes must accept at least one file")]
    NoFilesAllowed { method: Method, path: &'static str },
    #[error("{method} {path}: unsupported HTTP method")]
    UnsupportedMethod { method: Method, path: &'static str },
}

/// The compiled, immutable stage list of one route.
pub struct Chain {
    route: String,
    stages: Vec<Handler>,
}

impl Chain {
    pub fn build(descriptor: RouteDescriptor) -> Result<Self, RouteConfigError> {
        let RouteDescriptor {
            method,
            path,
            handlers,
            authenticate,
            pagination,
            multipart,
            role_accept,
            role_reject,
        } = descriptor;

        if handlers.is_empty() {
            return Err(RouteConfigError::NoHandlers { method, path });
        }
        if !authenticate && (role_accept.is_some() || role_reject.is_some()) {
            return Err(RouteConfigError::RolesWithoutAuthentication { method, path });
        }
        if multipart.as_ref().is_some_and(|options| options.max_files == 0) {
            return Err(RouteConfigError::NoFilesAllowed { method, path });
        }

        let mut stages = Vec::with_capacity(handlers.len() + 7);
        if authenticate {
            stages.push(Handler::stage(Authenticate));
            stages.push(Handler::stage(ValidateSession));
            stages.push(Handler::stage(AccountStatus));
        }
        if pagination {
            stages.push(Handler::stage(Paginate));
        }
        if let Some(roles) = role_accept {
            stages.push(Handler::stage(RoleAccept(roles)));
        }
        if let Some(roles) = role_reject {
            stages.push(Handler::stage(RoleReject(roles)));
        }
        if let Some(options) = multipart {
            stages.push(Handler::stage(ParseMultipart(options)));
        }
        stages.extend(handlers);

        Ok(Self {
            route: format!("{method} {path}"),
            stages,
        })
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs the stages in order until one responds or fails.
    ///
    /// A forwarded error skips normal stages and is offered to the next
    /// error stage. An error nobody consumes, or a chain that ends without a
    /// response, is returned to the caller for rendering.
    pub async fn run(&self, ctx: &mut RequestContext) -> Result<Response, AppError> {
        let mut pending: Option<AppError> = None;

        for stage in &self.stages {
            let outcome = match stage {
                Handler::Normal(stage) if pending.is_none() => guarded(stage.run(ctx)).await,
                Handler::OnError(stage) => match pending.take() {
                    Some(err) => guarded(stage.run(err, ctx)).await,
                    None => continue,
                },
                Handler::Normal(_) => continue,
            };

            match outcome? {
                Flow::Next => {}
                Flow::Respond(response) => return Ok(response),
                Flow::Forward(err) => pending = Some(err),
            }
        }

        Err(pending.unwrap_or_else(|| AppError::new(ErrorKind::NotFound)))
    }
}

async fn guarded<F>(stage: F) -> HandlerResult
where
    F: Future<Output = HandlerResult>,
{
    match AssertUnwindSafe(stage).catch_unwind().await {
        Ok(result) => result,
        Err(panic) => Err(AppError::internal(anyhow::anyhow!(
            "stage panicked: {}",
            panic_message(panic.as_ref())
        ))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(message) = panic.downcast_ref::<&'static str>() {
        *message
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.as_str()
    } else {
        "unknown panic"
    }
}

async fn dispatch(
    chain: Arc<Chain>,
    state: AppState,
    params: RawPathParams,
    request: Request,
) -> Response {
    let expose_inner = state.server_config.expose_inner_errors();
    let timeout = state.server_config.request_timeout;
    let path_params = params
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect();

    let mut ctx = RequestContext::new(state, path_params, request);
    match tokio::time::timeout(timeout, chain.run(&mut ctx)).await {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => err.into_response_with(expose_inner),
        Err(_) => {
            tracing::warn!(route = %chain.route, "Request timed out");
            AppError::not_available("timeout").into_response_with(expose_inner)
        }
    }
}

/// Compiles the descriptors into a router. Configuration mistakes are
/// reported here, before the server accepts any request.
pub fn compile(descriptors: Vec<RouteDescriptor>) -> Result<Router<AppState>, RouteConfigError> {
    let mut seen = HashSet::new();
    let mut routes: BTreeMap<&'static str, MethodRouter<AppState>> = BTreeMap::new();

    for descriptor in descriptors {
        let method = descriptor.method.clone();
        let path = descriptor.path;

        if !seen.insert((method.clone(), path)) {
            return Err(RouteConfigError::Duplicate { method, path });
        }
        let filter = MethodFilter::try_from(method.clone())
            .map_err(|_| RouteConfigError::UnsupportedMethod {
                method: method.clone(),
                path,
            })?;

        let chain = Arc::new(Chain::build(descriptor)?);
        tracing::debug!(route = %chain.route, stages = chain.len(), "Compiled route");

        let handler = move |State(state): State<AppState>, params: RawPathParams, request: Request| {
            dispatch(chain.clone(), state, params, request)
        };

        let method_router = match routes.remove(path) {
            Some(existing) => existing.on(filter, handler),
            None => axum::routing::on(filter, handler),
        };
        routes.insert(path, method_router);
    }

    Ok(routes
        .into_iter()
        .fold(Router::new(), |router, (path, method_router)| {
            router.route(path, method_router)
        }))
}
