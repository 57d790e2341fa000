//! Port for the external payments platform (Whop).
//!
//! Calls are synchronous, blocking network operations with no automatic
//! retry: a failure surfaces to the caller, who records the associated
//! invoice as failed.

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors from the payments platform.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The platform rejected the request.
    #[error("Payment API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// The request never completed (network, timeout, serialization).
    #[error("Payment transport error: {0}")]
    Transport(String),
}

/// A created checkout configuration; the frontend embeds `purchase_url`.
#[derive(Debug, Clone)]
pub struct CheckoutSession {
    pub id: String,
    pub purchase_url: String,
}

/// A payment accepted by the platform.
#[derive(Debug, Clone)]
pub struct ProviderPayment {
    /// Upstream payment id (`pay_xxx`), matched by later webhooks.
    pub id: Option<String>,
    /// Amount as reported by the platform, when present.
    pub amount: Option<f64>,
}

/// Client contract for the Whop API.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Creates a checkout configuration in `setup` mode (save a card
    /// without charging). Metadata is echoed back in webhooks.
    async fn create_setup_checkout(
        &self,
        metadata: Map<String, Value>,
    ) -> Result<CheckoutSession, PaymentError>;

    /// Creates a checkout configuration in `payment` mode for an existing
    /// plan.
    async fn create_payment_checkout(
        &self,
        plan_id: &str,
        redirect_url: Option<&str>,
        metadata: Map<String, Value>,
    ) -> Result<CheckoutSession, PaymentError>;

    /// Charges a one-time payment against a saved instrument. `amount` is
    /// in dollars.
    async fn create_payment(
        &self,
        member_id: &str,
        payment_method_id: &str,
        amount: f64,
        currency: &str,
        metadata: Map<String, Value>,
    ) -> Result<ProviderPayment, PaymentError>;

    /// Subscribes a member to a plan using a saved instrument.
    async fn create_subscription_payment(
        &self,
        member_id: &str,
        payment_method_id: &str,
        plan_id: &str,
    ) -> Result<ProviderPayment, PaymentError>;

    /// Lists the company's plans; passed through to the caller untyped.
    async fn get_plans(&self) -> Result<Value, PaymentError>;

    /// Retrieves a single plan by id.
    async fn get_plan(&self, plan_id: &str) -> Result<Value, PaymentError>;
}
