//! Error types for the domain layer.

use std::fmt;
use thiserror::Error;

/// Error codes organized by category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Validation errors
    ValidationFailed,
    InvalidAmount,
    InvalidFormat,

    // Not found errors
    UserNotFound,
    PaymentMethodNotFound,
    InvoiceNotFound,

    // State errors
    InvalidStateTransition,
    PaymentMethodInactive,
    NoCustomerId,

    // Conflict errors
    PaymentMethodExists,

    // Upstream payment errors
    PaymentFailed,

    // Authorization errors
    Unauthorized,

    // Infrastructure errors
    DatabaseError,
    InternalError,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorCode::ValidationFailed => "VALIDATION_FAILED",
            ErrorCode::InvalidAmount => "INVALID_AMOUNT",
            ErrorCode::InvalidFormat => "INVALID_FORMAT",
            ErrorCode::UserNotFound => "USER_NOT_FOUND",
            ErrorCode::PaymentMethodNotFound => "PAYMENT_METHOD_NOT_FOUND",
            ErrorCode::InvoiceNotFound => "INVOICE_NOT_FOUND",
            ErrorCode::InvalidStateTransition => "INVALID_STATE_TRANSITION",
            ErrorCode::PaymentMethodInactive => "PAYMENT_METHOD_INACTIVE",
            ErrorCode::NoCustomerId => "NO_CUSTOMER_ID",
            ErrorCode::PaymentMethodExists => "PAYMENT_METHOD_EXISTS",
            ErrorCode::PaymentFailed => "PAYMENT_FAILED",
            ErrorCode::Unauthorized => "UNAUTHORIZED",
            ErrorCode::DatabaseError => "DATABASE_ERROR",
            ErrorCode::InternalError => "INTERNAL_ERROR",
        };
        write!(f, "{}", s)
    }
}

/// Domain error with a machine-readable code and a human-readable message.
#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct DomainError {
    pub code: ErrorCode,
    pub message: String,
}

impl DomainError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn user_not_found(user_id: i64) -> Self {
        Self::new(ErrorCode::UserNotFound, format!("User {} not found", user_id))
    }

    pub fn payment_method_not_found() -> Self {
        Self::new(
            ErrorCode::PaymentMethodNotFound,
            "Payment method not found",
        )
    }

    pub fn invoice_not_found() -> Self {
        Self::new(ErrorCode::InvoiceNotFound, "Invoice not found")
    }

    pub fn payment_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::PaymentFailed, message)
    }

    /// Returns true if this error maps to a missing resource.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.code,
            ErrorCode::UserNotFound | ErrorCode::PaymentMethodNotFound | ErrorCode::InvoiceNotFound
        )
    }
}
