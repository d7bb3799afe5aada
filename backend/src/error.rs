use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Errors surfaced at the HTTP boundary. Every variant is terminal for the
/// triggering request only; nothing here leaves the sign-in flow unusable.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed name; the messages are shown inline in the form.
    #[error("{}", .0.join(". "))]
    Validation(Vec<String>),

    #[error("You have already signed in today")]
    AlreadySignedIn,

    #[error("Record not found")]
    NotFound,

    #[error("No attendance data to export")]
    NothingToExport,

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),

    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Validation(_) | AppError::InvalidFilter(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::AlreadySignedIn => StatusCode::CONFLICT,
            AppError::NotFound | AppError::NothingToExport => StatusCode::NOT_FOUND,
            AppError::Store(e) => {
                error!("store operation failed: {e:#}");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        (status, self.to_string()).into_response()
    }
}
