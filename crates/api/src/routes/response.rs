//! The response envelope shared by every endpoint.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use crate::services::FieldErrors;

/// `{status_code, message, data}`, plus `errors` on validation failures.
#[derive(Debug, Serialize)]
pub struct Envelope<T> {
    pub status_code: u16,
    pub message: String,
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
    #[serde(skip)]
    status: StatusCode,
}

impl<T> Envelope<T> {
    fn new(status: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            status_code: status.as_u16(),
            message: message.into(),
            data,
            errors: None,
            status,
        }
    }

    /// 200 with data.
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self::new(StatusCode::OK, message, Some(data))
    }

    /// 201 with data.
    pub fn created(message: impl Into<String>, data: T) -> Self {
        Self::new(StatusCode::CREATED, message, Some(data))
    }

    /// An error envelope; `data` is always null.
    pub fn failure(status: StatusCode, message: String, errors: Option<FieldErrors>) -> Self {
        Self {
            errors,
            ..Self::new(status, message, None)
        }
    }
}

impl<T: Serialize> IntoResponse for Envelope<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self)).into_response()
    }
}

/// 204 with an empty body.
pub fn no_content() -> Response {
    StatusCode::NO_CONTENT.into_response()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_shape() {
        let json = serde_json::to_value(Envelope::created("Order created successfully", 7)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "status_code": 201,
                "message": "Order created successfully",
                "data": 7
            })
        );
    }

    #[test]
    fn test_no_content_has_empty_status() {
        assert_eq!(no_content().status(), StatusCode::NO_CONTENT);
    }
}
