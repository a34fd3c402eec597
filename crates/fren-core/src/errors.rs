//! Typed failures and the single response funnel.
//!
//! Every failure raised while serving a request is an [`AppError`]. Its
//! [`ErrorKind`] is drawn from a closed set and fixes the HTTP status; the
//! optional `details` let clients discriminate causes (the violated role, the
//! invalid parameter name) without matching on messages, and `friendly`
//! carries an optional user-facing message.
//!
//! Responses are rendered as:
//!
//! ```json
//! { "error": "NotAuthorized", "details": "UserEdit", "friendlyDetails": "...", "innerError": [...] }
//! ```
//!
//! `innerError` is only emitted when the caller asks for it (non-production
//! builds). `DatabaseError` never leaves the funnel as such: it is rewritten
//! into `InternalServerError` and logged together with every other internal
//! error.

use std::collections::BTreeMap;
use std::fmt;

use anyhow::Error;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::Value;

/// Friendly text for internal errors that carry none of their own.
pub const INTERNAL_ERROR_MESSAGE: &str =
    "Something went wrong on our side. Please try again later.";

/// Closed set of failure kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorKind {
    MissingParameter,
    InvalidParameter,
    NotFound,
    NotAuthorized,
    AlreadyExists,
    NotAllowed,
    NotAvailable,
    InvalidOperation,
    NotImplemented,
    DatabaseError,
    InternalServerError,
}

impl ErrorKind {
    #[must_use]
    pub fn status(self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::NotAuthorized => StatusCode::UNAUTHORIZED,
            Self::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::MissingParameter
            | Self::InvalidParameter
            | Self::AlreadyExists
            | Self::NotAllowed
            | Self::NotAvailable
            | Self::InvalidOperation
            | Self::NotImplemented
            | Self::DatabaseError => StatusCode::BAD_REQUEST,
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingParameter => "MissingParameter",
            Self::InvalidParameter => "InvalidParameter",
            Self::NotFound => "NotFound",
            Self::NotAuthorized => "NotAuthorized",
            Self::AlreadyExists => "AlreadyExists",
            Self::NotAllowed => "NotAllowed",
            Self::NotAvailable => "NotAvailable",
            Self::InvalidOperation => "InvalidOperation",
            Self::NotImplemented => "NotImplemented",
            Self::DatabaseError => "DatabaseError",
            Self::InternalServerError => "InternalServerError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// User-facing message attached to an error, either a single sentence or one
/// message per offending field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FriendlyDetails {
    Message(String),
    Fields(BTreeMap<String, String>),
}

impl From<&str> for FriendlyDetails {
    fn from(message: &str) -> Self {
        Self::Message(message.to_string())
    }
}

impl From<String> for FriendlyDetails {
    fn from(message: String) -> Self {
        Self::Message(message)
    }
}

impl From<BTreeMap<String, String>> for FriendlyDetails {
    fn from(fields: BTreeMap<String, String>) -> Self {
        Self::Fields(fields)
    }
}

#[derive(Debug)]
pub struct AppError {
    pub kind: ErrorKind,
    pub details: Option<Value>,
    pub friendly: Option<FriendlyDetails>,
    pub inner: Option<Error>,
}

impl AppError {
    #[must_use]
    pub fn new(kind: ErrorKind) -> Self {
        Self {
            kind,
            details: None,
            friendly: None,
            inner: None,
        }
    }

    fn with_kind(kind: ErrorKind, details: impl Into<Value>) -> Self {
        Self::new(kind).with_details(details)
    }

    #[must_use]
    pub fn with_details(mut self, details: impl Into<Value>) -> Self {
        self.details = Some(details.into());
        self
    }

    #[must_use]
    pub fn with_friendly(mut self, friendly: impl Into<FriendlyDetails>) -> Self {
        self.friendly = Some(friendly.into());
        self
    }

    pub fn missing_parameter(details: impl Into<Value>) -> Self {
        Self::with_kind(ErrorKind::MissingParameter, details)
    }

    pub fn invalid_parameter(details: impl Into<Value>) -> Self {
        Self::with_kind(ErrorKind::InvalidParameter, details)
    }

    pub fn not_found(details: impl Into<Value>) -> Self {
        Self::with_kind(ErrorKind::NotFound, details)
    }

    pub fn not_authorized(details: impl Into<Value>) -> Self {
        Self::with_kind(ErrorKind::NotAuthorized, details)
    }

    pub fn already_exists(details: impl Into<Value>) -> Self {
        Self::with_kind(ErrorKind::AlreadyExists, details)
    }

    pub fn not_allowed(details: impl Into<Value>) -> Self {
        Self::with_kind(ErrorKind::NotAllowed, details)
    }

    pub fn not_available(details: impl Into<Value>) -> Self {
        Self::with_kind(ErrorKind::NotAvailable, details)
    }

    pub fn invalid_operation(details: impl Into<Value>) -> Self {
        Self::with_kind(ErrorKind::InvalidOperation, details)
    }

    pub fn not_implemented(details: impl Into<Value>) -> Self {
        Self::with_kind(ErrorKind::NotImplemented, details)
    }

    pub fn database<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            inner: Some(err.into()),
            ..Self::new(ErrorKind::DatabaseError)
        }
    }

    pub fn internal<E>(err: E) -> Self
    where
        E: Into<Error>,
    {
        Self {
            inner: Some(err.into()),
            ..Self::new(ErrorKind::InternalServerError)
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }

    /// Returns the string details, when the details are a plain string.
    #[must_use]
    pub fn details_str(&self) -> Option<&str> {
        self.details.as_ref().and_then(Value::as_str)
    }

    /// Rewrites a `DatabaseError` into an `InternalServerError` that wraps it.
    #[must_use]
    pub fn normalize(self) -> Self {
        if self.kind != ErrorKind::DatabaseError {
            return self;
        }

        let message = match &self.details {
            Some(details) => format!("DatabaseError: {details}"),
            None => "DatabaseError".to_string(),
        };
        let inner = match self.inner {
            Some(inner) => inner.context(message),
            None => anyhow::anyhow!(message),
        };

        Self::internal(inner)
    }

    /// Renders the error through the funnel.
    ///
    /// `expose_inner` controls whether the inner error chain is included in
    /// the body; it must be false in production.
    pub fn into_response_with(self, expose_inner: bool) -> Response {
        let mut err = self.normalize();

        if err.kind == ErrorKind::InternalServerError {
            match &err.inner {
                Some(inner) => tracing::error!(error = ?inner, "InternalServerError"),
                None => tracing::error!("InternalServerError"),
            }
            err.friendly.get_or_insert_with(|| INTERNAL_ERROR_MESSAGE.into());
        }

        let inner_error = if expose_inner {
            err.inner
                .as_ref()
                .map(|inner| inner.chain().map(ToString::to_string).collect::<Vec<_>>())
        } else {
            None
        };

        let body = ErrorBody {
            error: err.kind,
            details: err.details.as_ref(),
            friendly_details: err.friendly.as_ref(),
            inner_error,
        };

        (err.kind.status(), Json(body)).into_response()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody<'a> {
    error: ErrorKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<&'a Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    friendly_details: Option<&'a FriendlyDetails>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inner_error: Option<Vec<String>>,
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.details {
            Some(details) => write!(f, "{}: {}", self.kind, details),
            None => write!(f, "{}", self.kind),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.into_response_with(false)
    }
}

/// Foreign errors propagated with `?` are host-runtime failures.
impl<E> From<E> for AppError
where
    E: Into<Error>,
{
    fn from(err: E) -> Self {
        AppError::internal(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_json(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_kind_status_mapping() {
        assert_eq!(ErrorKind::MissingParameter.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::InvalidParameter.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorKind::NotAuthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorKind::AlreadyExists.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::NotAllowed.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::NotAvailable.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::InvalidOperation.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::NotImplemented.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ErrorKind::DatabaseError.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ErrorKind::InternalServerError.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_details_str() {
        let err = AppError::not_authorized("UserEdit");
        assert_eq!(err.details_str(), Some("UserEdit"));
        assert_eq!(AppError::new(ErrorKind::NotFound).details_str(), None);
    }

    #[test]
    fn test_normalize_rewrites_database_error() {
        let err = AppError::database(anyhow::anyhow!("connection reset")).normalize();
        assert_eq!(err.kind, ErrorKind::InternalServerError);
        assert!(err.details.is_none());
        let chain: Vec<String> = err
            .inner
            .as_ref()
            .unwrap()
            .chain()
            .map(ToString::to_string)
            .collect();
        assert_eq!(chain, vec!["DatabaseError", "connection reset"]);
    }

    #[test]
    fn test_normalize_keeps_other_kinds() {
        let err = AppError::invalid_parameter("page").normalize();
        assert_eq!(err.kind, ErrorKind::InvalidParameter);
        assert_eq!(err.details_str(), Some("page"));
    }

    #[test]
    fn test_foreign_error_becomes_internal() {
        let parse: Result<i64, _> = "abc".parse::<i64>();
        let err: AppError = parse.unwrap_err().into();
        assert_eq!(err.kind, ErrorKind::InternalServerError);
        assert!(err.inner.is_some());
    }

    #[tokio::test]
    async fn test_response_body_shape() {
        let response = AppError::not_authorized("jwt")
            .with_friendly("Your session has expired")
            .into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "NotAuthorized");
        assert_eq!(body["details"], "jwt");
        assert_eq!(body["friendlyDetails"], "Your session has expired");
        assert!(body.get("innerError").is_none());
    }

    #[tokio::test]
    async fn test_database_error_response_is_internal() {
        let response =
            AppError::database(anyhow::anyhow!("duplicate key")).into_response_with(true);

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["error"], "InternalServerError");
        assert_eq!(body["innerError"][0], "DatabaseError");
        assert_eq!(body["innerError"][1], "duplicate key");
    }

    #[tokio::test]
    async fn test_inner_error_hidden_in_production() {
        let response = AppError::internal(anyhow::anyhow!("secret detail")).into_response_with(false);

        let body = body_json(response).await;
        assert_eq!(body["error"], "InternalServerError");
        assert!(body.get("innerError").is_none());
    }

    #[tokio::test]
    async fn test_host_error_gets_generic_friendly_message() {
        let err: AppError = std::io::Error::other("disk exploded at /var/secret").into();
        let response = err.into_response_with(false);

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body["friendlyDetails"], INTERNAL_ERROR_MESSAGE);
        assert!(!body.to_string().contains("/var/secret"));

        let body = body_json(AppError::database(anyhow::anyhow!("deadlock")).into_response()).await;
        assert_eq!(body["friendlyDetails"], INTERNAL_ERROR_MESSAGE);

        let body = body_json(
            AppError::internal(anyhow::anyhow!("x"))
                .with_friendly("Upload storage is full")
                .into_response(),
        )
        .await;
        assert_eq!(body["friendlyDetails"], "Upload storage is full");
    }

    #[tokio::test]
    async fn test_friendly_fields_serialize_as_map() {
        let mut fields = BTreeMap::new();
        fields.insert("email".to_string(), "Email is required".to_string());
        let response = AppError::invalid_parameter("email")
            .with_friendly(fields)
            .into_response();

        let body = body_json(response).await;
        assert_eq!(body["friendlyDetails"]["email"], "Email is required");
    }
}
