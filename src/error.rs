use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::{dao::storage::StorageError, state::room::RoomError};

/// Errors that can occur in service layer operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Concurrent-write race detected by the store; the caller must re-read
    /// the room before retrying.
    #[error("room was modified concurrently, re-read and retry")]
    VersionConflict,
    /// The room mutation was rejected by a domain rule.
    #[error(transparent)]
    Room(#[from] RoomError),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Invariant violation that should not happen in normal operation.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Conflict { .. } => ServiceError::VersionConflict,
            other => ServiceError::Unavailable(other),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::BadRequest(format!("validation failed: {}", err))
    }
}

/// Application-level errors that are converted to HTTP responses.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad request with invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),
    /// Caller lacks the authority for the attempted action.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Conflict with current state.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Service unavailable or degraded.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Unavailable(source) => AppError::ServiceUnavailable(source.to_string()),
            ServiceError::Degraded => AppError::ServiceUnavailable("degraded mode".into()),
            ServiceError::VersionConflict => {
                AppError::Conflict("room was modified concurrently, re-read and retry".into())
            }
            ServiceError::Room(room_err) => room_err.into(),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Internal(message) => AppError::Internal(message),
        }
    }
}

impl From<RoomError> for AppError {
    fn from(err: RoomError) -> Self {
        let message = err.to_string();
        match err {
            RoomError::RoomNotFound | RoomError::FileNotFound { .. } => AppError::NotFound(message),
            RoomError::NotAuthorized | RoomError::NotAParticipant { .. } => {
                AppError::Forbidden(message)
            }
            RoomError::RoomFull { .. }
            | RoomError::InsufficientParticipants { .. }
            | RoomError::ParticipantsNotReady { .. }
            | RoomError::AlreadyActive
            | RoomError::QuizNotActive
            | RoomError::StaleQuestion { .. }
            | RoomError::DuplicateAnswer { .. }
            | RoomError::AtLastQuestion
            | RoomError::NoDocumentSelected
            | RoomError::InvalidTimerAction { .. } => AppError::Conflict(message),
            RoomError::EmptyQuiz => AppError::BadRequest(message),
        }
    }
}

/// Failure payload returned to clients; successful mutations carry
/// `success: true` in their own response types.
#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            success: false,
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
