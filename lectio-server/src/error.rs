//! Error types for lectio-server
//!
//! Every handler returns [`ApiResult`]. Whatever goes wrong, the client
//! receives the failure envelope `{status:"fail", error, fieldErrors?}` with
//! a status code matching the category. Failures are logged here, once.

use axum::{
    extract::rejection::{FormRejection, JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use lectio_common::api::FailureBody;
use lectio_common::FieldError;
use thiserror::Error;
use tracing::{error, warn};

use crate::services::chat::ChatError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Malformed or incomplete request (400)
    #[error("{0}")]
    BadRequest(String),

    /// Form failed schema validation (400)
    #[error("Validation failed")]
    Validation(Vec<FieldError>),

    /// Resource not found or not owned by the caller (404)
    #[error("{0}")]
    NotFound(String),

    /// Language-model provider failed (502)
    #[error("Chat provider error: {0}")]
    Provider(String),

    /// Database or other internal failure (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Provider(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            error!("Request failed ({}): {}", status.as_u16(), self);
        } else {
            warn!("Request rejected ({}): {}", status.as_u16(), self);
        }

        let body = match self {
            ApiError::Validation(fields) => FailureBody::with_fields("Validation failed", fields),
            other => FailureBody::new(other.to_string()),
        };

        (status, Json(body)).into_response()
    }
}

impl From<lectio_common::Error> for ApiError {
    fn from(err: lectio_common::Error) -> Self {
        use lectio_common::Error;

        match err {
            Error::Validation(fields) => ApiError::Validation(fields),
            Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            Error::NotFound(msg) => ApiError::NotFound(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Internal(format!("Database error: {}", err))
    }
}

impl From<ChatError> for ApiError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::EmptyPrompt => ApiError::BadRequest(err.to_string()),
            other => ApiError::Provider(other.to_string()),
        }
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
