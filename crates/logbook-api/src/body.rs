//! Request body handling shared by the handlers.
//!
//! Bodies are taken as `Result<Json<Value>, JsonRejection>` so handlers can run
//! their existence and ownership checks before the body is looked at.

use axum::{Json, extract::rejection::JsonRejection};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use logbook_types::models::Visibility;

use crate::error::ApiError;

pub type JsonBody = Result<Json<Value>, JsonRejection>;

pub const MAX_USERNAME_LEN: usize = 64;
pub const MAX_EMAIL_LEN: usize = 120;
pub const MAX_BIO_LEN: usize = 500;

/// The body as a non-empty JSON object. `{}`, `null`, arrays and scalars are all
/// "Invalid Request".
pub fn object(body: JsonBody) -> Result<Map<String, Value>, ApiError> {
    match body {
        Ok(Json(Value::Object(map))) if !map.is_empty() => Ok(map),
        Ok(_) => Err(ApiError::invalid_request()),
        Err(JsonRejection::MissingJsonContentType(_)) => Err(ApiError::UnsupportedMediaType),
        Err(rejection) => {
            debug!("Rejected request body: {}", rejection.body_text());
            Err(ApiError::invalid_request())
        }
    }
}

/// Names from `required` that are not keys of `fields`, in order.
pub fn missing<'a>(fields: &Map<String, Value>, required: &[&'a str]) -> Vec<&'a str> {
    required
        .iter()
        .copied()
        .filter(|name| !fields.contains_key(*name))
        .collect()
}

pub fn decode<T: DeserializeOwned>(fields: Map<String, Value>) -> Result<T, ApiError> {
    serde_json::from_value(Value::Object(fields))
        .map_err(|e| ApiError::validation("Invalid Field", e.to_string()))
}

pub fn visibility(raw: &str) -> Result<Visibility, ApiError> {
    raw.parse().map_err(|_| ApiError::invalid_visibility())
}

/// An optional `visibility` key. Absent is `None`; `null` is rejected like any
/// other unknown value.
pub fn visibility_field(field: Option<Option<String>>) -> Result<Option<Visibility>, ApiError> {
    match field {
        None => Ok(None),
        Some(None) => Err(ApiError::invalid_visibility()),
        Some(Some(raw)) => visibility(&raw).map(Some),
    }
}

/// Non-empty and at most `max` characters.
pub fn bounded(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::validation(
            "Invalid Field",
            format!("The {field} field must not be empty"),
        ));
    }
    check_length(field, value, max)
}

pub fn check_length(field: &str, value: &str, max: usize) -> Result<(), ApiError> {
    if value.chars().count() > max {
        return Err(ApiError::validation(
            "Invalid Field",
            format!("The {field} field must be at most {max} characters"),
        ));
    }
    Ok(())
}
