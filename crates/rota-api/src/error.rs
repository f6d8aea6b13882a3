//! API error type and [`axum::response::IntoResponse`] implementation.
//!
//! Every failure is rendered as
//! `{"error": {"code": "<CODE>", "message": "<text>"}}`.

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use rota_core::Error as CoreError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error(transparent)]
  Core(#[from] CoreError),

  #[error("{0}")]
  BadRequest(String),
}

impl ApiError {
  /// HTTP status and stable error code for this error.
  pub fn status_and_code(&self) -> (StatusCode, &'static str) {
    match self {
      ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "INVALID_REQUEST"),
      ApiError::Core(e) => match e {
        e if e.is_not_found() => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        CoreError::DuplicatePr(_) => (StatusCode::CONFLICT, "PR_EXISTS"),
        CoreError::TeamExists(_) => (StatusCode::BAD_REQUEST, "TEAM_EXISTS"),
        CoreError::AuthorHasNoTeam(_) => (StatusCode::NOT_FOUND, "NO_TEAM"),
        CoreError::PrMerged(_) => (StatusCode::CONFLICT, "PR_MERGED"),
        CoreError::NotAssigned { .. } => (StatusCode::CONFLICT, "NOT_ASSIGNED"),
        CoreError::NoCandidate(_) => (StatusCode::CONFLICT, "NO_CANDIDATE"),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
      },
    }
  }
}

impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self {
    ApiError::BadRequest(rejection.body_text())
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, code) = self.status_and_code();
    let message = if status.is_server_error() {
      error!(error = %self, "request failed");
      "internal server error".to_owned()
    } else {
      self.to_string()
    };
    (status, Json(json!({ "error": { "code": code, "message": message } })))
      .into_response()
  }
}
