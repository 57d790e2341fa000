//! Whop webhook signature verification.
//!
//! Whop signs webhooks in the Svix format: the `webhook-signature` header
//! carries one or more space-separated candidates of the form
//! `v1,<base64 HMAC-SHA256>`, computed over the message
//! `{webhook-id}.{webhook-timestamp}.{raw body}`.
//!
//! Includes timestamp validation to prevent replay attacks.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use super::errors::WebhookError;

/// Maximum allowed age for webhook deliveries (5 minutes).
const MAX_EVENT_AGE_SECS: i64 = 300;

/// Maximum allowed clock skew for future timestamps (1 minute).
const MAX_CLOCK_SKEW_SECS: i64 = 60;

/// Verifier for Whop webhook signatures.
#[derive(Clone)]
pub struct WhopWebhookVerifier {
    /// The webhook signing secret shared with Whop.
    secret: String,
}

impl WhopWebhookVerifier {
    /// Creates a new verifier with the given webhook secret.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Verifies a webhook delivery.
    ///
    /// # Verification Steps
    ///
    /// 1. Validate the timestamp header is within the replay window
    /// 2. Extract all `v1,` candidates from the signature header
    /// 3. Compute HMAC-SHA256 over `{webhook_id}.{timestamp}.{payload}`
    /// 4. Compare the base64 digest against every candidate in constant time
    ///
    /// Fails closed: an empty signature header, zero candidates, or no
    /// matching candidate all reject the delivery.
    ///
    /// # Errors
    ///
    /// - `InvalidSignature` - no candidate matched
    /// - `TimestampOutOfRange` - delivery is older than 5 minutes
    /// - `InvalidTimestamp` - timestamp is unparseable or too far in the future
    pub fn verify(
        &self,
        payload: &[u8],
        signature_header: &str,
        timestamp_header: &str,
        webhook_id_header: &str,
    ) -> Result<(), WebhookError> {
        self.validate_timestamp(timestamp_header)?;

        let candidates: Vec<&str> = signature_header
            .split(' ')
            .filter_map(|part| part.strip_prefix("v1,"))
            .collect();

        if candidates.is_empty() {
            return Err(WebhookError::InvalidSignature);
        }

        let expected = self.compute_signature(webhook_id_header, timestamp_header, payload);

        for candidate in candidates {
            if constant_time_compare(expected.as_bytes(), candidate.as_bytes()) {
                return Ok(());
            }
        }

        Err(WebhookError::InvalidSignature)
    }

    /// Validates that the timestamp header is numeric and within bounds.
    fn validate_timestamp(&self, timestamp_header: &str) -> Result<(), WebhookError> {
        let timestamp: i64 = timestamp_header
            .trim()
            .parse()
            .map_err(|_| WebhookError::InvalidTimestamp)?;

        let now = chrono::Utc::now().timestamp();
        let age = now - timestamp;

        if age > MAX_EVENT_AGE_SECS {
            return Err(WebhookError::TimestampOutOfRange);
        }
        if age < -MAX_CLOCK_SKEW_SECS {
            return Err(WebhookError::InvalidTimestamp);
        }

        Ok(())
    }

    /// Computes the base64 HMAC-SHA256 digest of `{id}.{timestamp}.{payload}`.
    fn compute_signature(&self, webhook_id: &str, timestamp: &str, payload: &[u8]) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(webhook_id.as_bytes());
        mac.update(b".");
        mac.update(timestamp.as_bytes());
        mac.update(b".");
        mac.update(payload);
        BASE64.encode(mac.finalize().into_bytes())
    }
}

/// Performs constant-time comparison of two byte slices.
///
/// Prevents timing attacks that could leak information about the expected
/// signature.
fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}

/// Computes a valid signature header value for test fixtures.
#[cfg(test)]
pub fn compute_test_signature(
    secret: &str,
    webhook_id: &str,
    timestamp: &str,
    payload: &str,
) -> String {
    let message = format!("{}.{}.{}", webhook_id, timestamp, payload);
    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(message.as_bytes());
    format!("v1,{}", BASE64.encode(mac.finalize().into_bytes()))
}
