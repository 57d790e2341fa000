//! Request and response shapes for the billing API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::billing::{Invoice, InvoiceStatus, InvoiceType, PaymentMethod, User};
use crate::ports::CheckoutSession;

// ══════════════════════════════════════════════════════════════
// Requests
// ══════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
pub struct ChargeCreditsRequest {
    /// Dollar amount to charge.
    pub amount: f64,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub plan_id: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct StorePaymentMethodRequest {
    pub provider_payment_method_id: String,
    pub provider_customer_id: Option<String>,
    pub payment_type: Option<String>,
    pub last_four_digits: Option<String>,
    pub brand: Option<String>,
    /// Expiry as `YYYY-MM`.
    pub expiry: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SubscriptionCheckoutRequest {
    pub plan_id: String,
    pub redirect_url: Option<String>,
}

// ══════════════════════════════════════════════════════════════
// Responses
// ══════════════════════════════════════════════════════════════

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: i64,
    pub clerk_user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            clerk_user_id: user.clerk_user_id,
            name: user.name,
            email: user.email,
            avatar_url: user.avatar_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct InvoiceResponse {
    pub id: i64,
    pub invoice_number: String,
    pub invoice_type: InvoiceType,
    pub amount: f64,
    pub currency: String,
    pub status: InvoiceStatus,
    pub description: String,
    pub provider_transaction_id: Option<String>,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<Invoice> for InvoiceResponse {
    fn from(invoice: Invoice) -> Self {
        Self {
            id: invoice.id,
            invoice_number: invoice.invoice_number,
            invoice_type: invoice.invoice_type,
            amount: invoice.amount,
            currency: invoice.currency,
            status: invoice.status,
            description: invoice.description,
            provider_transaction_id: invoice.provider_transaction_id,
            paid_at: invoice.paid_at,
            created_at: invoice.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct PaymentMethodResponse {
    pub id: i64,
    pub payment_type: String,
    pub brand: Option<String>,
    pub last_four_digits: Option<String>,
    pub expires_at: Option<NaiveDate>,
    pub is_default: bool,
    pub created_at: DateTime<Utc>,
}

impl From<PaymentMethod> for PaymentMethodResponse {
    fn from(method: PaymentMethod) -> Self {
        Self {
            id: method.id,
            payment_type: method.payment_type,
            brand: method.brand,
            last_four_digits: method.last_four_digits,
            expires_at: method.expires_at,
            is_default: method.is_default,
            created_at: method.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub checkout_config_id: String,
    pub purchase_url: String,
}

impl From<CheckoutSession> for CheckoutResponse {
    fn from(session: CheckoutSession) -> Self {
        Self {
            checkout_config_id: session.id,
            purchase_url: session.purchase_url,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
