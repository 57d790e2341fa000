//! ChargeCreditsHandler - charges a saved payment method for credits.

use std::sync::Arc;

use serde_json::{json, Map, Value};

use crate::domain::billing::{Invoice, InvoiceType, NewInvoice, PaymentMethod};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{InvoiceRepository, PaymentMethodRepository, PaymentProvider};

/// Command to charge the caller's saved instrument.
#[derive(Debug, Clone)]
pub struct ChargeCreditsCommand {
    pub user_id: i64,
    /// Dollar amount; must be positive.
    pub amount: f64,
    pub description: Option<String>,
}

/// Result of a successful charge.
#[derive(Debug, Clone)]
pub struct ChargeCreditsResult {
    pub invoice: Invoice,
}

/// Handler for direct credit purchases.
///
/// Creates a `pending` invoice before contacting Whop, so a crash between
/// the charge and the local update can still be reconciled by the
/// `payment.succeeded` webhook matched on the transaction id.
pub struct ChargeCreditsHandler {
    payment_methods: Arc<dyn PaymentMethodRepository>,
    invoices: Arc<dyn InvoiceRepository>,
    payment_provider: Arc<dyn PaymentProvider>,
}

impl ChargeCreditsHandler {
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

    pub async fn handle(
        &self,
        cmd: ChargeCreditsCommand,
    ) -> Result<ChargeCreditsResult, DomainError> {
        if !(cmd.amount > 0.0) || !cmd.amount.is_finite() {
            return Err(DomainError::new(
                ErrorCode::InvalidAmount,
                "Amount must be a positive number",
            ));
        }

        let method = self.active_method(cmd.user_id).await?;
        let member_id = method.provider_customer_id.clone().ok_or_else(|| {
            DomainError::new(
                ErrorCode::NoCustomerId,
                "Payment method has no Whop member id",
            )
        })?;

        let description = cmd
            .description
            .unwrap_or_else(|| "Credit purchase".to_string());
        let mut invoice = self
            .invoices
            .insert(NewInvoice {
                user_id: cmd.user_id,
                payment_method_id: Some(method.id),
                invoice_number: Invoice::generate_number(),
                invoice_type: InvoiceType::CreditPurchase,
                amount: cmd.amount,
                currency: "usd".to_string(),
                description,
                metadata: json!({}),
            })
            .await?;

        let mut metadata = Map::new();
        metadata.insert("user_id".to_string(), Value::from(cmd.user_id));
        metadata.insert(
            "invoice_number".to_string(),
            Value::from(invoice.invoice_number.clone()),
        );

        let charge = self
            .payment_provider
            .create_payment(
                &member_id,
                &method.provider_payment_method_id,
                cmd.amount,
                "usd",
                metadata,
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
                    amount = cmd.amount,
                    "Credit charge succeeded"
                );
                Ok(ChargeCreditsResult { invoice })
            }
            Err(err) => {
                tracing::warn!(
                    invoice_id = invoice.id,
                    user_id = cmd.user_id,
                    error = %err,
                    "Credit charge failed"
                );
                invoice.record_failure(now)?;
                self.invoices.update(&invoice).await?;
                Err(DomainError::payment_failed(err.to_string()))
            }
        }
    }

    /// The user's default active method, or the most recent active one.
    async fn active_method(&self, user_id: i64) -> Result<PaymentMethod, DomainError> {
        if let Some(method) = self.payment_methods.find_default_for_user(user_id).await? {
            return Ok(method);
        }
        self.payment_methods
            .find_latest_active_for_user(user_id)
            .await?
            .ok_or_else(|| {
                DomainError::new(
                    ErrorCode::ValidationFailed,
                    "No active payment method on file",
                )
            })
    }
}
