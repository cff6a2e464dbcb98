//! Unified error handling with Sentry integration.
//!
//! Every handler returns `Result<T, AppError>`. Errors leave the API in the
//! same envelope as successes: `{status_code, message, data: null}` plus an
//! `errors` map for validation failures. Server errors are captured to
//! Sentry and their details are never sent to the client.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

use crate::routes::response::Envelope;
use crate::services::{FieldErrors, ServiceError};

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// A service refused the request.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Missing or unknown bearer token.
    #[error("{0}")]
    Unauthorized(&'static str),

    /// The request body, path or query could not be parsed.
    #[error("{message}")]
    BadRequest { message: String, errors: FieldErrors },

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn rejected(field: &str, detail: String) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_owned(), vec![detail]);
        Self::BadRequest {
            message: "Invalid request data".to_owned(),
            errors,
        }
    }

    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Service(ServiceError::Validation { .. } | ServiceError::Gateway(_))
            | Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Service(ServiceError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Service(ServiceError::Store(_)) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::rejected("body", rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::rejected("query", rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::rejected("path", rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (message, errors) = match self {
            Self::Service(ServiceError::Store(_)) | Self::Internal(_) => {
                ("Internal server error".to_owned(), None)
            }
            Self::Service(ServiceError::Validation { message, errors })
            | Self::BadRequest { message, errors } => {
                (message, Some(errors).filter(|e| !e.is_empty()))
            }
            other => (other.to_string(), None),
        };

        Envelope::<()>::failure(status, message, errors).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context after authentication.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}
