//! HTTP-facing error type.

use axum::Json;
use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

use crate::conversation::StoreError;
use crate::service::AssistantError;

/// Errors returned by route handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Unknown session or turn.
    #[error("{0}")]
    NotFound(String),
    /// Malformed request; nothing was mutated.
    #[error("invalid request: {message}")]
    Validation {
        /// 422 for well-formed input with bad values, 400 otherwise.
        status: StatusCode,
        /// Human-readable reason.
        message: String,
    },
    /// Answer or suggestion provider failed.
    #[error("provider error: {0}")]
    Provider(String),
    /// Anything else.
    #[error("internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
}

impl ApiError {
    /// Machine-readable error kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Validation { .. } => "validation_error",
            Self::Provider(_) => "provider_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation { status, .. } => *status,
            Self::Provider(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Error for a session id that was never issued or no longer exists.
    #[must_use]
    pub fn session_not_found(raw: &str) -> Self {
        Self::NotFound(format!("conversation not found: {raw}"))
    }

    /// Error for a turn id that was never issued in the session.
    #[must_use]
    pub fn turn_not_found(raw: &str) -> Self {
        Self::NotFound(format!("message not found: {raw}"))
    }

    /// Validation error from an extractor rejection.
    ///
    /// Only 422 survives as is; every other rejection (bad syntax, missing
    /// content type, unreadable body) is reported as 400.
    fn rejected(status: StatusCode, message: String) -> Self {
        let status = if status == StatusCode::UNPROCESSABLE_ENTITY {
            status
        } else {
            StatusCode::BAD_REQUEST
        };
        Self::Validation { status, message }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            Self::NotFound(msg) => {
                tracing::debug!("{msg}");
                msg.as_str()
            }
            Self::Validation { message, .. } => {
                tracing::debug!("rejected request: {message}");
                message.as_str()
            }
            Self::Provider(msg) => {
                tracing::error!("Provider error: {msg}");
                "upstream provider failed"
            }
            Self::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                "internal server error"
            }
        };

        let body = ErrorBody {
            error: self.kind(),
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<AssistantError> for ApiError {
    fn from(err: AssistantError) -> Self {
        match err {
            AssistantError::Store(StoreError::NotFound(id)) => {
                Self::session_not_found(&id.to_string())
            }
            AssistantError::Store(StoreError::TurnNotFound { turn, .. }) => {
                Self::turn_not_found(&turn.to_string())
            }
            AssistantError::Store(other) => Self::Internal(other.to_string()),
            AssistantError::Provider(other) => Self::Provider(other.to_string()),
            invalid @ AssistantError::InvalidRating(_) => Self::Validation {
                status: StatusCode::UNPROCESSABLE_ENTITY,
                message: invalid.to_string(),
            },
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        Self::rejected(rejection.status(), rejection.body_text())
    }
}
