use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tracing::error;

use crate::auth::{dto::AuthResponse, validation::Violation};
use crate::users::StoreError;

/// Failures an auth handler can answer with. Each maps to one status code.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid data")]
    Validation(Vec<Violation>),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("email already registered")]
    EmailTaken,
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicateEmail => Self::EmailTaken,
            other => Self::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    /// Internal detail is logged here and never reaches the client.
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Validation(errors) => (
                StatusCode::BAD_REQUEST,
                AuthResponse {
                    errors: Some(errors),
                    ..AuthResponse::failure("Invalid data")
                },
            ),
            Self::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                AuthResponse::failure("Invalid email or password"),
            ),
            Self::EmailTaken => (
                StatusCode::CONFLICT,
                AuthResponse::failure("Email is already registered"),
            ),
            Self::Internal(detail) => {
                error!(error = %detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    AuthResponse::failure("Internal server error"),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
