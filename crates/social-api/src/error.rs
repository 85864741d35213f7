use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use social_db::StoreError;
use social_types::api::ErrorResponse;

/// Everything the HTTP boundary may report. Lower-level store, hashing and
/// token errors are translated into these kinds before they leave the
/// logic layer; `Internal` never carries backend text.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("username already taken")]
    DuplicateUsername,

    #[error("not found")]
    NotFound,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid or expired session")]
    InvalidToken,

    #[error("internal server error")]
    Internal,
}

impl AppError {
    /// Logs `err` and reduces it to the opaque `Internal` kind.
    pub fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        error!("{}: {}", context, err);
        Self::Internal
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateUsername => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::InvalidCredentials | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateUsername => Self::DuplicateUsername,
            StoreError::NotFound => Self::NotFound,
            other => Self::internal("store", other),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = ErrorResponse {
            error: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
