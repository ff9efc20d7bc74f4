use axum::{
    Json, extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse,
};
use thiserror::Error;
use tracing::error;

use carpool_db::StoreError;
use carpool_types::api::{ErrorBody, ErrorResponse, RenderDirective};

use crate::session::INVALID_CREDENTIALS_MESSAGE;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("username already exists")]
    DuplicateUsername,

    #[error("invalid username or password")]
    InvalidCredentials,

    #[error("login required")]
    Unauthenticated,

    #[error("session expired")]
    SessionExpired,

    #[error("invalid request body: {0}")]
    InvalidBody(#[from] JsonRejection),

    #[error("storage error: {0}")]
    Storage(StoreError),

    #[error("blocking task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateUsername => ApiError::DuplicateUsername,
            other => ApiError::Storage(other),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, code, message, directive) = match self {
            ApiError::DuplicateUsername => (
                StatusCode::CONFLICT,
                "DUPLICATE_USERNAME",
                "Username already exists. Please choose a different one.".to_string(),
                None,
            ),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "INVALID_CREDENTIALS",
                INVALID_CREDENTIALS_MESSAGE.to_string(),
                Some(RenderDirective::ShowError {
                    message: INVALID_CREDENTIALS_MESSAGE.to_string(),
                }),
            ),
            ApiError::Unauthenticated => (
                StatusCode::UNAUTHORIZED,
                "UNAUTHENTICATED",
                "Log in to continue.".to_string(),
                None,
            ),
            ApiError::SessionExpired => (
                StatusCode::UNAUTHORIZED,
                "SESSION_EXPIRED",
                "Your session expired. Reload to start a new one.".to_string(),
                None,
            ),
            ApiError::InvalidBody(rejection) => (
                rejection.status(),
                "INVALID_BODY",
                rejection.body_text(),
                None,
            ),
            ApiError::Storage(e) => {
                error!("Storage fault: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred.".to_string(),
                    None,
                )
            }
            ApiError::Join(e) => {
                error!("spawn_blocking join error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    "An internal server error occurred.".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
            },
            directive,
        };
        (status, Json(body)).into_response()
    }
}
