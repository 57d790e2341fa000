//! SubscribeHandler - subscribes the caller to a Whop plan with a saved card.

use std::sync::Arc;

use serde_json::json;

use crate::domain::billing::{Invoice, InvoiceType, NewInvoice};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{InvoiceRepository, PaymentMethodRepository, PaymentProvider};

/// Command to start a subscription against the caller's saved instrument.
#[derive(Debug, Clone)]
pub struct SubscribeCommand {
    pub user_id: i64,
    pub plan_id: String,
    pub description: Option<String>,
}

/// Result of a successful subscription charge.
#[derive(Debug, Clone)]
pub struct SubscribeResult {
    pub invoice: Invoice,
}

/// Handler for subscribing with a saved payment method.
///
/// The invoice starts at amount 0; Whop's response and the later
/// `payment.succeeded` webhook carry the actual plan price.
pub struct SubscribeHandler {
    payment_methods: Arc<dyn PaymentMethodRepository>,
    invoices: Arc<dyn InvoiceRepository>,
    payment_provider: Arc<dyn PaymentProvider>,
}

impl SubscribeHandler {
    pub fn new(
        payment_methods: Arc<dyn PaymentMethodRepository>,
        invoices: Arc<dyn InvoiceRepository>,
        payment_provider: Arc<dyn PaymentProvider>,
    ) -> Self {
        Self {
            payment_methods,
            invoices,
            payment_provider,
        }
    }

    pub async fn handle(&self, cmd: SubscribeCommand) -> Result<SubscribeResult, DomainError> {
        if cmd.plan_id.trim().is_empty() {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                "Plan id must not be empty",
            ));
        }

        let method = match self
            .payment_methods
            .find_default_for_user(cmd.user_id)
            .await?
        {
            Some(method) => method,
            None => self
                .payment_methods
                .find_latest_active_for_user(cmd.user_id)
                .await?
                .ok_or_else(|| {
                    DomainError::new(
                        ErrorCode::ValidationFailed,
                        "No active payment method on file",
                    )
                })?,
        };
        let member_id = method.provider_customer_id.clone().ok_or_else(|| {
            DomainError::new(
                ErrorCode::NoCustomerId,
                "Payment method has no Whop member id",
            )
        })?;

        let description = cmd
            .description
            .unwrap_or_else(|| format!("Subscription to plan {}", cmd.plan_id));
        let mut invoice = self
            .invoices
            .insert(NewInvoice {
                user_id: cmd.user_id,
                payment_method_id: Some(method.id),
                invoice_number: Invoice::generate_number(),
                invoice_type: InvoiceType::Subscription,
                amount: 0.0,
                currency: "usd".to_string(),
                description,
                metadata: json!({"plan_id": cmd.plan_id}),
            })
            .await?;

        let charge = self
            .payment_provider
            .create_subscription_payment(
                &member_id,
                &method.provider_payment_method_id,
                &cmd.plan_id,
            )
            .await;

        let now = chrono::Utc::now();
        match charge {
            Ok(payment) => {
                invoice.record_payment(payment.id, payment.amount, now);
                self.invoices.update(&invoice).await?;
                tracing::info!(
                    invoice_id = invoice.id,
                    user_id = cmd.user_id,
                    plan_id = %cmd.plan_id,
                    "Subscription charge succeeded"
                );
                Ok(SubscribeResult { invoice })
            }
            Err(err) => {
                tracing::warn!(
                    invoice_id = invoice.id,
                    user_id = cmd.user_id,
                    plan_id = %cmd.plan_id,
                    error = %err,
                    "Subscription charge failed"
                );
                invoice.record_failure(now)?;
                self.invoices.update(&invoice).await?;
                Err(DomainError::payment_failed(err.to_string()))
            }
        }
    }
}
