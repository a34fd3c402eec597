//! Declarative routes compiled into ordered stage chains.
//!
//! Every endpoint is described by a [`RouteDescriptor`]. At startup
//! [`compile`] turns the descriptors into an axum router in which each route
//! runs its chain in a fixed order:
//!
//! ```text
//! authenticate -> validate session -> account status     (unless public)
//!   -> pagination                                         (if paginated)
//!   -> role accept -> role reject                         (if declared)
//!   -> multipart                                          (if declared and the body is multipart)
//!   -> the route's own handlers, in declared order
//! ```
//!
//! Stages communicate through a per-request [`RequestContext`] and report
//! back with a [`Flow`]. Returning `Err` from any stage ends the chain and
//! renders the error through the response funnel; `Flow::Forward` hands the
//! error to the next error-handling stage instead.

mod compiler;
mod context;
mod descriptor;

pub use compiler::{Chain, RouteConfigError, compile};
pub use context::RequestContext;
pub use descriptor::{ErrorHandlerFn, ErrorStage, Handler, HandlerFn, RouteDescriptor, Stage};

use axum::{
    Json,
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;
use serde::Serialize;

use fren_core::AppError;

/// What a stage wants the chain to do next.
pub enum Flow {
    /// Continue with the next normal stage.
    Next,
    /// Stop and send this response.
    Respond(Response),
    /// Skip normal stages until an error-handling stage takes the error.
    Forward(AppError),
}

impl Flow {
    pub fn json<T: Serialize>(body: T) -> Self {
        Flow::Respond(Json(body).into_response())
    }

    /// Body used by endpoints with nothing to return.
    pub fn success() -> Self {
        Flow::json(serde_json::json!({ "error": "Success" }))
    }
}

impl std::fmt::Debug for Flow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Flow::Next => f.write_str("Next"),
            Flow::Respond(response) => write!(f, "Respond({})", response.status()),
            Flow::Forward(err) => write!(f, "Forward({err})"),
        }
    }
}

pub type HandlerResult = Result<Flow, AppError>;

pub type HandlerFuture<'a> = BoxFuture<'a, HandlerResult>;
