//! PaymentMethod entity - tokenized reference to an instrument held by Whop.
//!
//! The actual card data never touches this system; we store Whop's token
//! (`provider_payment_method_id`), display fields, and the default/active
//! flags that drive charge and subscribe operations.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde_json::Value;

/// A saved payment instrument.
#[derive(Debug, Clone, Serialize)]
pub struct PaymentMethod {
    pub id: i64,
    pub user_id: i64,
    /// Whop member id (`mber_xxx`) that owns the instrument upstream.
    pub provider_customer_id: Option<String>,
    /// Whop payment method token (`payt_xxx`); globally unique, the
    /// idempotency key for webhook-driven creation.
    pub provider_payment_method_id: String,
    pub payment_type: String,
    pub last_four_digits: Option<String>,
    pub brand: Option<String>,
    /// First day of the expiry month.
    pub expires_at: Option<NaiveDate>,
    pub is_default: bool,
    pub is_active: bool,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a [`PaymentMethod`].
#[derive(Debug, Clone)]
pub struct NewPaymentMethod {
    pub user_id: i64,
    pub provider_customer_id: Option<String>,
    pub provider_payment_method_id: String,
    pub payment_type: String,
    pub last_four_digits: Option<String>,
    pub brand: Option<String>,
    pub expires_at: Option<NaiveDate>,
    pub is_default: bool,
    pub metadata: Value,
}

/// Parsed card display fields from a Whop `payment_method.card` sub-object.
#[derive(Debug, Clone, Default)]
pub struct CardDetails {
    pub brand: Option<String>,
    pub last_four_digits: Option<String>,
    pub expires_at: Option<NaiveDate>,
}

impl CardDetails {
    /// Extracts card fields from a `payment_method` payload value.
    ///
    /// Expiry becomes the first day of the expiry month; a card missing
    /// either year or month has no expiry.
    pub fn from_payment_method_value(pm: &Value) -> Self {
        let card = pm.get("card").cloned().unwrap_or(Value::Null);

        let brand = card
            .get("brand")
            .and_then(Value::as_str)
            .map(str::to_string);
        let last_four_digits = card
            .get("last4")
            .and_then(Value::as_str)
            .map(str::to_string);

        let expires_at = match (
            card.get("exp_year").and_then(as_i64_lenient),
            card.get("exp_month").and_then(as_i64_lenient),
        ) {
            (Some(year), Some(month)) => expiry_month_start(year, month),
            _ => None,
        };

        Self {
            brand,
            last_four_digits,
            expires_at,
        }
    }
}

/// First day of an expiry month, or `None` for out-of-range values.
pub fn expiry_month_start(year: i64, month: i64) -> Option<NaiveDate> {
    let year = i32::try_from(year).ok()?;
    let month = u32::try_from(month).ok()?;
    NaiveDate::from_ymd_opt(year, month, 1)
}

// Whop sends expiry components as numbers in some payloads and strings in
// others.
fn as_i64_lenient(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}
