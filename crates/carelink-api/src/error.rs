//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("unauthorized")]
  Unauthorized,

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  #[error("store error: {0}")]
  Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match &self {
      ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized".to_owned()),
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m.clone()),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m.clone()),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m.clone()),
      ApiError::Store(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    };
    let mut res = (status, Json(json!({ "error": message }))).into_response();
    if matches!(self, ApiError::Unauthorized) {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"carelink\""),
      );
    }
    res
  }
}

/// Fold domain errors into HTTP statuses. Conflicts between the request
/// and current account state come back as 409, never 500.
impl From<carelink_core::Error> for ApiError {
  fn from(err: carelink_core::Error) -> Self {
    use carelink_core::Error as E;
    match err {
      E::UserNotFound(_) | E::DocumentNotFound { .. } => {
        ApiError::NotFound(err.to_string())
      }
      E::EmailTaken(_) | E::InvalidTransition { .. } => {
        ApiError::Conflict(err.to_string())
      }
      E::UnknownRole(_) | E::UnknownStatus(_) | E::UnknownFacilityType(_) => {
        ApiError::BadRequest(err.to_string())
      }
      other => ApiError::Store(Box::new(other)),
    }
  }
}
