use crate::{directory::DirectoryError, identity::IdentityError, service::PostError};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

/// Shown by the composer when a post fails for any reason other than bad
/// content.
pub const TRY_AGAIN_LATER: &str = "Failed to post. Try again later";

#[derive(Debug)]
pub enum ApiError {
    InvalidCredentials,
    UserAlreadyExists,
    Unauthorized,
    NotFound,
    RateLimited,
    ValidationError(String),
    InternalConsistency(String),
    InternalError(String),
}

/// Convert our custom errors to HTTP responses
///
/// Only validation messages reach the user verbatim. Everything else maps to
/// fixed copy.
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "Invalid credentials"),
            ApiError::UserAlreadyExists => (StatusCode::CONFLICT, "User already exists"),
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "Not Found"),
            ApiError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, TRY_AGAIN_LATER),
            ApiError::ValidationError(msg) => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({
                      "error": msg
                    })),
                )
                    .into_response();
            }
            ApiError::InternalConsistency(msg) => {
                error!("Consistency failure: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Something went wrong")
            }
            ApiError::InternalError(msg) => {
                error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        (
            status,
            Json(serde_json::json!({
              "error": message
            })),
        )
            .into_response()
    }
}

impl From<PostError> for ApiError {
    fn from(err: PostError) -> Self {
        match err {
            PostError::Validation(msg) => ApiError::ValidationError(msg),
            PostError::RateLimited => ApiError::RateLimited,
            PostError::NotFound => ApiError::NotFound,
            PostError::InternalConsistency(msg) => ApiError::InternalConsistency(msg),
            PostError::Directory(err) => err.into(),
            PostError::Store(err) => ApiError::InternalError(err.to_string()),
        }
    }
}

impl From<DirectoryError> for ApiError {
    fn from(err: DirectoryError) -> Self {
        match err {
            DirectoryError::NotFound(_) => ApiError::NotFound,
            DirectoryError::Unavailable(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<IdentityError> for ApiError {
    fn from(err: IdentityError) -> Self {
        match err {
            IdentityError::UserAlreadyExists => ApiError::UserAlreadyExists,
            IdentityError::InvalidCredentials => ApiError::InvalidCredentials,
            IdentityError::NotFound => ApiError::NotFound,
            IdentityError::Hashing(msg) | IdentityError::Token(msg) => ApiError::InternalError(msg),
        }
    }
}
