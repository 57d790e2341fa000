//! Webhook error types for Whop webhook handling.
//!
//! Defines all error conditions that can occur during webhook processing,
//! with HTTP status code mapping. Whop's delivery system retries on
//! non-2xx responses, so only authentication failures are allowed to
//! surface as errors; everything else must resolve to an acknowledged
//! outcome at the HTTP layer.

use axum::http::StatusCode;
use thiserror::Error;

/// Errors that occur during webhook processing.
#[derive(Debug, Error)]
pub enum WebhookError {
    /// Webhook signature verification failed.
    #[error("Invalid signature")]
    InvalidSignature,

    /// Webhook timestamp is outside the acceptable window.
    #[error("Timestamp out of range")]
    TimestampOutOfRange,

    /// Webhook timestamp is in the future beyond clock skew tolerance,
    /// or not a number at all.
    #[error("Invalid timestamp")]
    InvalidTimestamp,

    /// Failed to parse the webhook payload.
    #[error("Parse error: {0}")]
    ParseError(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(String),
}

impl WebhookError {
    /// Maps the error to the HTTP status code returned to the sender.
    ///
    /// Signature and timestamp failures reject the delivery outright with
    /// 401. Everything after authentication is acknowledged with 200: the
    /// sender cannot act on a reconciliation failure, and a non-2xx would
    /// only trigger a retry storm for an event we will drop again.
    pub fn status_code(&self) -> StatusCode {
        match self {
            WebhookError::InvalidSignature
            | WebhookError::TimestampOutOfRange
            | WebhookError::InvalidTimestamp => StatusCode::UNAUTHORIZED,
            WebhookError::ParseError(_) | WebhookError::Database(_) => StatusCode::OK,
        }
    }

    /// True when the delivery failed authentication and must be rejected.
    pub fn is_rejection(&self) -> bool {
        self.status_code() == StatusCode::UNAUTHORIZED
    }
}

impl From<crate::domain::foundation::DomainError> for WebhookError {
    fn from(err: crate::domain::foundation::DomainError) -> Self {
        WebhookError::Database(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_signature_displays_correctly() {
        let err = WebhookError::InvalidSignature;
        assert_eq!(format!("{}", err), "Invalid signature");
    }

    #[test]
    fn parse_error_displays_message() {
        let err = WebhookError::ParseError("invalid JSON".to_string());
        assert_eq!(format!("{}", err), "Parse error: invalid JSON");
    }

    #[test]
    fn signature_failures_return_unauthorized() {
        assert_eq!(
            WebhookError::InvalidSignature.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            WebhookError::TimestampOutOfRange.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            WebhookError::InvalidTimestamp.status_code(),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn parse_error_is_acknowledged() {
        let err = WebhookError::ParseError("bad json".to_string());
        assert_eq!(err.status_code(), StatusCode::OK);
    }

    #[test]
    fn database_error_is_acknowledged() {
        let err = WebhookError::Database("connection lost".to_string());
        assert_eq!(err.status_code(), StatusCode::OK);
        assert!(!err.is_rejection());
    }

    #[test]
    fn signature_failure_is_a_rejection() {
        assert!(WebhookError::InvalidSignature.is_rejection());
    }
}
