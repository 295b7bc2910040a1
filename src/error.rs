//! Error types for the collaborator boundaries and their HTTP mapping.
//!
//! The scoring core itself never fails; these cover storage, session transitions,
//! the chat upstream and review validation.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
  #[error("{0} not found")]
  NotFound(String),
  #[allow(dead_code)]
  #[error("storage unavailable: {0}")]
  Unavailable(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
  #[error("invalid profile: {0}")]
  InvalidProfile(String),
  #[error("question '{0}' must be answered before moving on")]
  Unanswered(String),
  #[error("unknown question '{0}'")]
  UnknownQuestion(String),
  #[error("invalid answer to '{question_id}': {reason}")]
  InvalidAnswer { question_id: String, reason: String },
  #[error("submission already in progress")]
  SubmitInFlight,
  #[error("cannot {action} while {state}")]
  WrongState { action: &'static str, state: &'static str },
  #[error("unknown session '{0}'")]
  UnknownSession(String),
}

#[derive(Debug, Error)]
pub enum ChatError {
  #[error("message is required")]
  EmptyMessage,
  #[error("chat request failed: {0}")]
  Transport(#[from] reqwest::Error),
  #[error("upstream HTTP {status}: {message}")]
  Upstream { status: u16, message: String },
  #[error("no reply")]
  NoReply,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReviewError {
  #[error("name is required")]
  MissingName,
  #[error("comment is required")]
  MissingComment,
  #[error("rating must be between 1 and 5, got {0}")]
  RatingOutOfRange(u8),
}

#[derive(Debug, Error)]
pub enum AppError {
  #[error(transparent)]
  Store(#[from] StoreError),
  #[error(transparent)]
  Session(#[from] SessionError),
  #[error(transparent)]
  Chat(#[from] ChatError),
  #[error(transparent)]
  Review(#[from] ReviewError),
  #[error("invalid input: {0}")]
  BadRequest(String),
}

impl AppError {
  pub fn status(&self) -> StatusCode {
    match self {
      AppError::Store(StoreError::NotFound(_)) => StatusCode::NOT_FOUND,
      AppError::Store(StoreError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
      AppError::Session(SessionError::UnknownSession(_)) => StatusCode::NOT_FOUND,
      AppError::Session(SessionError::WrongState { .. } | SessionError::SubmitInFlight) => StatusCode::CONFLICT,
      AppError::Session(_) => StatusCode::UNPROCESSABLE_ENTITY,
      AppError::Chat(ChatError::EmptyMessage) => StatusCode::BAD_REQUEST,
      AppError::Chat(_) => StatusCode::BAD_GATEWAY,
      AppError::Review(_) | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
    }
  }
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::error!(target: "herdcheck", error = %self, %status, "Request failed");
    } else {
      tracing::debug!(target: "herdcheck", error = %self, %status, "Request rejected");
    }
    (status, Json(json!({ "error": self.to_string() }))).into_response()
  }
}
