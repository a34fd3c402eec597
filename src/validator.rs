//! JSON request bodies with `validator` checks.

use std::collections::BTreeMap;

use axum::{
    body::{Body, to_bytes},
    http::{HeaderMap, header},
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use fren_core::AppError;

fn friendly_fields(errors: &ValidationErrors) -> BTreeMap<String, String> {
    errors
        .field_errors()
        .iter()
        .map(|(field, errors)| {
            let message = errors
                .iter()
                .find_map(|error| error.message.as_ref().map(ToString::to_string))
                .unwrap_or_else(|| format!("{field} is invalid"));
            (field.to_string(), message)
        })
        .collect()
}

fn missing_field(message: &str) -> Option<&str> {
    message
        .split("missing field `")
        .nth(1)
        .and_then(|rest| rest.split('`').next())
}

fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .map(|value| value.trim().to_ascii_lowercase().starts_with("application/json"))
        .unwrap_or(false)
}

/// Parses `body` as JSON and runs its validation rules.
///
/// A missing field becomes `MissingParameter(field)`; malformed JSON and
/// failed validation rules become `InvalidParameter`, the latter with one
/// friendly message per offending field.
pub async fn parse_json<T>(headers: &HeaderMap, body: Body, limit: usize) -> Result<T, AppError>
where
    T: DeserializeOwned + Validate,
{
    if !is_json(headers) {
        return Err(AppError::invalid_parameter("body")
            .with_friendly("Expected an 'application/json' request body"));
    }

    let bytes = to_bytes(body, limit)
        .await
        .map_err(|_| AppError::invalid_parameter("body"))?;

    let value: T = serde_json::from_slice(&bytes).map_err(|e| {
        let message = e.to_string();
        match missing_field(&message) {
            Some(field) => AppError::missing_parameter(field.to_string()),
            None => AppError::invalid_parameter("body").with_friendly(message),
        }
    })?;

    value.validate().map_err(|errors| {
        let fields = friendly_fields(&errors);
        let first = fields.keys().next().cloned().unwrap_or_else(|| "body".to_string());
        AppError::invalid_parameter(first).with_friendly(fields)
    })?;

    Ok(value)
}
