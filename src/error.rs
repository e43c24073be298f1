use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error;
use validator::ValidationErrors;

use crate::dao::storage::StorageError;

/// Errors that can occur in service layer operations.
///
/// Every variant is terminal and caller-facing; the engine performs no
/// internal retries of its own.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Storage backend is unavailable.
    #[error("storage unavailable")]
    Unavailable(#[source] StorageError),
    /// Application is running in degraded mode without storage.
    #[error("storage unavailable (degraded mode)")]
    Degraded,
    /// Connect attempted while the caller already participates in an
    /// unfinished game.
    #[error("user already participates in an unfinished game")]
    AlreadyInGame,
    /// Answer submitted while the caller has no `Active` game.
    #[error("user has no active game")]
    NotInActiveGame,
    /// Answer submitted after the caller exhausted their question sequence.
    #[error("all questions of the game have already been answered")]
    AllQuestionsAnswered,
    /// The question bank holds fewer published questions than a game needs.
    #[error("question bank exhausted: {available} published question(s), {requested} needed")]
    NotEnoughQuestions {
        /// Published questions actually available.
        available: usize,
        /// Questions a single game requires.
        requested: usize,
    },
    /// Requested resource was not found.
    #[error("not found: {0}")]
    NotFound(String),
    /// Caller is not a participant of the requested game.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Invalid input provided by the client.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl From<StorageError> for ServiceError {
    fn from(err: StorageError) -> Self {
        ServiceError::Unavailable(err)
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
    /// Caller identity is missing or malformed.
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    /// Operation is not permitted for this caller in the current state.
    #[error("forbidden: {0}")]
    Forbidden(String),
    /// Requested resource not found.
    #[error("not found: {0}")]
    NotFound(String),
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
            // The three game-rule rejections map to 403: the caller is known,
            // the operation is simply not allowed in their current state.
            ServiceError::AlreadyInGame
            | ServiceError::NotInActiveGame
            | ServiceError::AllQuestionsAnswered => AppError::Forbidden(err.to_string()),
            ServiceError::NotEnoughQuestions { .. } => AppError::Internal(err.to_string()),
            ServiceError::NotFound(message) => AppError::NotFound(message),
            ServiceError::Forbidden(message) => AppError::Forbidden(message),
            ServiceError::InvalidInput(message) => AppError::BadRequest(message),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let payload = Json(ErrorBody {
            message: self.to_string(),
        });

        (status, payload).into_response()
    }
}
