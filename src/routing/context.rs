use std::collections::HashMap;

use axum::{
    body::Body,
    extract::{Query, Request},
    http::{Extensions, HeaderMap, Method, Uri, request::Parts},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use fren_auth::TokenPayload;
use fren_core::{AppError, Pagination};

use crate::middleware::multipart::MultipartForm;
use crate::state::AppState;
use crate::validator::parse_json;

/// Per-request bag of validated values, filled in by the chain as it runs.
pub struct RequestContext {
    state: AppState,
    parts: Parts,
    body: Option<Body>,
    path_params: Vec<(String, String)>,
    query: HashMap<String, String>,
    params: HashMap<&'static str, i64>,
    pub(crate) token: Option<String>,
    pub(crate) payload: Option<TokenPayload>,
    pub(crate) pagination: Option<Pagination>,
    pub(crate) form: Option<MultipartForm>,
}

impl RequestContext {
    pub fn new(state: AppState, path_params: Vec<(String, String)>, request: Request) -> Self {
        let (parts, body) = request.into_parts();
        let query = match Query::<HashMap<String, String>>::try_from_uri(&parts.uri) {
            Ok(Query(query)) => query,
            Err(e) => {
                tracing::debug!(error = %e, "Ignoring malformed query string");
                HashMap::new()
            }
        };

        Self {
            state,
            parts,
            body: Some(body),
            path_params,
            query,
            params: HashMap::new(),
            token: None,
            payload: None,
            pagination: None,
            form: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn method(&self) -> &Method {
        &self.parts.method
    }

    pub fn uri(&self) -> &Uri {
        &self.parts.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.parts.headers
    }

    pub fn extensions(&self) -> &Extensions {
        &self.parts.extensions
    }

    pub fn path_param(&self, name: &str) -> Option<&str> {
        self.path_params
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn query(&self, name: &str) -> Option<&str> {
        self.query.get(name).map(String::as_str)
    }

    /// The raw credential presented with the request, once authenticated.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn payload(&self) -> Option<&TokenPayload> {
        self.payload.as_ref()
    }

    /// The authenticated user. Only routes that authenticate may ask.
    pub fn user_id(&self) -> Result<i64, AppError> {
        self.payload
            .as_ref()
            .map(|payload| payload.id)
            .ok_or_else(|| {
                AppError::internal(anyhow::anyhow!(
                    "{} {} reads the user on a public route",
                    self.parts.method,
                    self.parts.uri.path()
                ))
            })
    }

    /// Pagination parsed by the pagination stage, or the defaults.
    pub fn pagination(&self) -> Pagination {
        self.pagination.unwrap_or_default()
    }

    /// A numeric parameter resolved by an earlier stage.
    pub fn param(&self, name: &'static str) -> Result<i64, AppError> {
        self.params
            .get(name)
            .copied()
            .ok_or_else(|| AppError::missing_parameter(name))
    }

    pub fn set_param(&mut self, name: &'static str, value: i64) {
        self.params.insert(name, value);
    }

    pub fn take_body(&mut self) -> Option<Body> {
        self.body.take()
    }

    /// Reads and validates a JSON body.
    pub async fn json<T>(&mut self) -> Result<T, AppError>
    where
        T: DeserializeOwned + Validate,
    {
        let body = self
            .take_body()
            .ok_or_else(|| AppError::missing_parameter("body"))?;
        let limit = self.state.server_config.body_limit;
        parse_json(&self.parts.headers, body, limit).await
    }

    pub fn form(&self) -> Option<&MultipartForm> {
        self.form.as_ref()
    }

    pub fn take_form(&mut self) -> Option<MultipartForm> {
        self.form.take()
    }
}
