use crate::logging::logging_middleware;
use crate::modules;
use crate::routing::{RouteConfigError, compile};
use crate::state::AppState;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method};
use axum::{Router, middleware};
use fren_core::{AppError, ErrorKind};
use tower_http::cors::CorsLayer;

pub const API_PREFIX: &str = "/api/v1";

async fn route_not_found() -> AppError {
    AppError::new(ErrorKind::NotFound)
}

/// Builds the application router. Fails when a route is misconfigured.
pub fn init_router(state: AppState) -> Result<Router, RouteConfigError> {
    let api = compile(modules::routes())?.method_not_allowed_fallback(route_not_found);

    Ok(Router::new()
        .nest(API_PREFIX, api)
        .fallback(route_not_found)
        .with_state(state.clone())
        .layer(DefaultBodyLimit::max(state.server_config.body_limit))
        .layer({
            let allowed_origins: Vec<HeaderValue> = state
                .cors_config
                .allowed_origins
                .iter()
                .filter_map(|origin| origin.parse().ok())
                .collect();

            CorsLayer::new()
                .allow_origin(allowed_origins)
                .allow_methods([
                    Method::GET,
                    Method::POST,
                    Method::PUT,
                    Method::DELETE,
                    Method::OPTIONS,
                ])
                .allow_headers([
                    axum::http::header::AUTHORIZATION,
                    axum::http::header::CONTENT_TYPE,
                    axum::http::header::ACCEPT,
                ])
                .allow_credentials(true)
        })
        .layer(middleware::from_fn(logging_middleware)))
}
