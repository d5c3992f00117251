//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every error renders as `{"success": false, "message": ...}` plus
//! machine-readable detail where the caller can act on it.

use axum::{
  Json,
  extract::rejection::JsonRejection,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use gatehouse_core::store::UniqueKey;
use serde_json::json;
use thiserror::Error;

use crate::Environment;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// The body was not a JSON object of the expected shape.
  #[error("invalid request body: {0}")]
  BadRequest(String),

  #[error("invalid user data: {0}")]
  InvalidInput(String),

  #[error("validation error: {}", .0.join("; "))]
  Validation(Vec<String>),

  #[error("user with this {0} already exists")]
  Conflict(UniqueKey),

  /// `detail` is only populated outside production.
  #[error("server error")]
  Internal { detail: Option<String> },
}

impl ApiError {
  /// Map a core error to its HTTP form, hiding store detail in production.
  pub fn from_core(err: gatehouse_core::Error, environment: Environment) -> Self {
    match err {
      gatehouse_core::Error::InvalidInput(m) => ApiError::InvalidInput(m),
      gatehouse_core::Error::Validation(m) => ApiError::Validation(m),
      gatehouse_core::Error::DuplicateKey(key) => ApiError::Conflict(key),
      gatehouse_core::Error::Store(e) => ApiError::Internal {
        detail: environment.exposes_error_detail().then(|| e.to_string()),
      },
    }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::BadRequest(_)
      | ApiError::InvalidInput(_)
      | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
      ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = match self {
      ApiError::BadRequest(m) => json!({
        "success": false,
        "message": format!("Invalid request body: {m}"),
      }),
      ApiError::InvalidInput(m) => json!({
        "success": false,
        "message": format!("Invalid user data: {m}"),
      }),
      ApiError::Validation(errors) => json!({
        "success": false,
        "message": "Validation error",
        "errors": errors,
      }),
      ApiError::Conflict(key) => json!({
        "success": false,
        "message": format!("User with this {key} already exists"),
        "field": key,
      }),
      ApiError::Internal { detail: Some(detail) } => json!({
        "success": false,
        "message": "Server error occurred",
        "error": detail,
      }),
      ApiError::Internal { detail: None } => json!({
        "success": false,
        "message": "Server error occurred",
      }),
    };
    (status, Json(body)).into_response()
  }
}
