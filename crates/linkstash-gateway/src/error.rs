use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use linkstash_core::StorageError;
use linkstash_shortener::ShortenerError;
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("invalid request body: {0}")]
    InvalidBody(String),
    #[error("invalid user id: {0}")]
    InvalidUser(String),
    #[error(transparent)]
    Shortener(#[from] ShortenerError),
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::InvalidBody(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidUser(_) => StatusCode::UNAUTHORIZED,
            AppError::Shortener(ShortenerError::InvalidUrl(_))
            | AppError::Shortener(ShortenerError::Storage(StorageError::Validation(_))) => {
                StatusCode::BAD_REQUEST
            }
            AppError::Shortener(ShortenerError::QueueClosed) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Shortener(ShortenerError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, self.to_string()).into_response()
    }
}
