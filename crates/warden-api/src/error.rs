//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, PathRejection, QueryRejection},
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use warden_core::{ErrorClass, StoreError};

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("{message}")]
  Validation {
    field:   &'static str,
    message: String,
  },

  #[error("authentication required")]
  Unauthorized,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("{0}")]
  InvalidState(String),

  #[error("{0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl ApiError {
  /// Classify a store (or core) error into the matching API error.
  pub fn store<E: StoreError>(e: E) -> Self {
    match e.class() {
      ErrorClass::Validation => Self::Validation {
        field:   e.field().unwrap_or("request"),
        message: e.to_string(),
      },
      ErrorClass::InvalidState => Self::InvalidState(e.to_string()),
      ErrorClass::NotFound => Self::NotFound(e.to_string()),
      ErrorClass::Conflict => Self::Conflict(e.to_string()),
      ErrorClass::Internal => Self::Store(Box::new(e)),
    }
  }

  pub fn validation(field: &'static str, message: impl Into<String>) -> Self {
    Self::Validation { field, message: message.into() }
  }

  pub fn status(&self) -> StatusCode {
    match self {
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
      ApiError::InvalidState(_) | ApiError::Conflict(_) => StatusCode::CONFLICT,
      ApiError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self { Self::validation("body", rejection.body_text()) }
}

impl From<PathRejection> for ApiError {
  fn from(rejection: PathRejection) -> Self { Self::validation("path", rejection.body_text()) }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self { Self::validation("query", rejection.body_text()) }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    let body = match &self {
      ApiError::Validation { field, message } => json!({ "error": message, "field": field }),
      ApiError::Store(e) => {
        tracing::error!(error = %e, "store failure");
        json!({ "error": self.to_string() })
      }
      _ => json!({ "error": self.to_string() }),
    };

    let mut response = (status, Json(body)).into_response();
    if status == StatusCode::UNAUTHORIZED {
      response.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static(r#"Basic realm="warden""#),
      );
    }
    response
  }
}
