//! Checkout creation and plan queries.
//!
//! Checkouts are hosted by Whop; we only create the configuration and hand
//! the `purchase_url` to the frontend. The metadata written here is what the
//! webhook pipeline later uses to tie the completed checkout back to a user.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::domain::webhook::{FLOW_SAVE_PAYMENT_METHOD, FLOW_SUBSCRIPTION_PLAN};
use crate::ports::{CheckoutSession, PaymentProvider};

/// Command to create a subscription checkout for a plan.
#[derive(Debug, Clone)]
pub struct SubscriptionCheckoutCommand {
    pub user_id: i64,
    pub email: Option<String>,
    pub plan_id: String,
    pub redirect_url: Option<String>,
}

/// Handler for checkout creation and plan passthrough.
pub struct CheckoutsHandler {
    payment_provider: Arc<dyn PaymentProvider>,
}

impl CheckoutsHandler {
    pub fn new(payment_provider: Arc<dyn PaymentProvider>) -> Self {
        Self { payment_provider }
    }

    /// Creates a setup-mode checkout so the user can save a card without a
    /// charge.
    pub async fn setup_checkout(&self, user_id: i64) -> Result<CheckoutSession, DomainError> {
        let mut metadata = Map::new();
        metadata.insert("user_id".to_string(), Value::from(user_id.to_string()));
        metadata.insert(
            "flow".to_string(),
            Value::from(FLOW_SAVE_PAYMENT_METHOD),
        );

        self.payment_provider
            .create_setup_checkout(metadata)
            .await
            .map_err(|e| DomainError::payment_failed(e.to_string()))
    }

    /// Creates a payment-mode checkout for a subscription plan.
    pub async fn subscription_checkout(
        &self,
        cmd: SubscriptionCheckoutCommand,
    ) -> Result<CheckoutSession, DomainError> {
        if cmd.plan_id.trim().is_empty() {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                "Plan id must not be empty",
            ));
        }

        let mut metadata = Map::new();
        metadata.insert("user_id".to_string(), Value::from(cmd.user_id.to_string()));
        metadata.insert("flow".to_string(), Value::from(FLOW_SUBSCRIPTION_PLAN));
        metadata.insert("plan_id".to_string(), Value::from(cmd.plan_id.clone()));
        if let Some(email) = &cmd.email {
            metadata.insert("email".to_string(), Value::from(email.clone()));
        }

        self.payment_provider
            .create_payment_checkout(&cmd.plan_id, cmd.redirect_url.as_deref(), metadata)
            .await
            .map_err(|e| DomainError::payment_failed(e.to_string()))
    }

    /// The company's plans, passed through untyped.
    pub async fn plans(&self) -> Result<Value, DomainError> {
        self.payment_provider
            .get_plans()
            .await
            .map_err(|e| DomainError::payment_failed(e.to_string()))
    }

    /// One plan by id.
    pub async fn plan(&self, plan_id: &str) -> Result<Value, DomainError> {
        self.payment_provider
            .get_plan(plan_id)
            .await
            .map_err(|e| DomainError::payment_failed(e.to_string()))
    }
}
