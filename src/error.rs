//! Error taxonomy shared by every handler, and its JSON rendering.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Bad input shape. The message is safe to show to the player.
    #[error("{0}")]
    Validation(String),

    #[error("username or email already taken")]
    DuplicateIdentity,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("not logged in")]
    Unauthenticated,

    #[error("traits required")]
    MissingPayload,

    #[error("invalid JSON")]
    InvalidJson,

    #[error("persistence failed: {0}")]
    PersistenceFailed(#[from] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::MissingPayload | AppError::InvalidJson => {
                StatusCode::BAD_REQUEST
            }
            AppError::DuplicateIdentity => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AppError::PersistenceFailed(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Message shown to clients. Storage and internal failures never leak
    /// their detail here.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::DuplicateIdentity => "Username or email already taken.".into(),
            AppError::InvalidCredentials => "Invalid username or password.".into(),
            AppError::Unauthenticated => "Not logged in".into(),
            AppError::MissingPayload => "Traits required".into(),
            AppError::InvalidJson => "Invalid JSON".into(),
            AppError::PersistenceFailed(_) | AppError::Internal(_) => "Server error".into(),
        }
    }

    /// True when the error came from a UNIQUE constraint on insert.
    pub fn is_unique_violation(err: &sqlx::Error) -> bool {
        matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::PersistenceFailed(e) => error!(error = %e, "storage error"),
            AppError::Internal(e) => error!(error = %e, "internal error"),
            _ => {}
        }
        let status = self.status();
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}
