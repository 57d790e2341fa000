//! HTTP error mapping for the authenticated API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domain::foundation::{DomainError, ErrorCode};

/// JSON error body shared by every API error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(code: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

/// Wrapper turning a [`DomainError`] into an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.code {
            ErrorCode::ValidationFailed
            | ErrorCode::InvalidAmount
            | ErrorCode::InvalidFormat
            | ErrorCode::NoCustomerId
            | ErrorCode::PaymentMethodInactive
            | ErrorCode::PaymentFailed => StatusCode::UNPROCESSABLE_ENTITY,
            ErrorCode::UserNotFound
            | ErrorCode::PaymentMethodNotFound
            | ErrorCode::InvoiceNotFound => StatusCode::NOT_FOUND,
            ErrorCode::PaymentMethodExists | ErrorCode::InvalidStateTransition => {
                StatusCode::CONFLICT
            }
            ErrorCode::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorCode::DatabaseError | ErrorCode::InternalError => {
                tracing::error!(error = %self.0, "Internal error serving API request");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = ErrorResponse::new(self.0.code.to_string(), self.0.message);
        (status, Json(body)).into_response()
    }
}
