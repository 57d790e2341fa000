//! Invoice entity - a record of a charge or subscription attempt.
//!
//! Invoices are created `pending` the moment a charge is issued to Whop and
//! reach `paid` or `failed` either synchronously (from the initiating
//! request's response) or asynchronously (from a later webhook matched on
//! `provider_transaction_id`). Terminal status is monotonic: a paid invoice
//! is never flipped back to failed by a late-arriving failure webhook.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Why the invoice exists.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceType {
    CreditPurchase,
    Subscription,
}

impl InvoiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreditPurchase => "credit_purchase",
            Self::Subscription => "subscription",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "credit_purchase" => Ok(Self::CreditPurchase),
            "subscription" => Ok(Self::Subscription),
            other => Err(DomainError::new(
                ErrorCode::InvalidFormat,
                format!("Invalid invoice type: {}", other),
            )),
        }
    }
}

/// Payment state of the invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Pending,
    Paid,
    Failed,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self, DomainError> {
        match s {
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            other => Err(DomainError::new(
                ErrorCode::InvalidFormat,
                format!("Invalid invoice status: {}", other),
            )),
        }
    }
}

/// A charge or subscription attempt.
#[derive(Debug, Clone, Serialize)]
pub struct Invoice {
    pub id: i64,
    pub user_id: i64,
    pub payment_method_id: Option<i64>,
    pub invoice_number: String,
    pub invoice_type: InvoiceType,
    /// Dollar amount as reported by Whop. Stored and passed through, never
    /// arithmetically combined.
    pub amount: f64,
    pub currency: String,
    pub status: InvoiceStatus,
    /// Whop payment id (`pay_xxx`) used to match asynchronous webhooks.
    pub provider_transaction_id: Option<String>,
    pub description: String,
    pub metadata: Value,
    pub paid_at: Option<DateTime<Utc>>,
    pub webhook_received_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a pending [`Invoice`].
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub user_id: i64,
    pub payment_method_id: Option<i64>,
    pub invoice_number: String,
    pub invoice_type: InvoiceType,
    pub amount: f64,
    pub currency: String,
    pub description: String,
    pub metadata: Value,
}

impl Invoice {
    /// Records a successful payment.
    ///
    /// Idempotent: re-applying `paid` refreshes the transaction id, amount,
    /// and timestamps but changes nothing else. A `failed` invoice may also
    /// be corrected to `paid` by a late success webhook.
    pub fn record_payment(
        &mut self,
        provider_transaction_id: Option<String>,
        amount: Option<f64>,
        now: DateTime<Utc>,
    ) {
        self.status = InvoiceStatus::Paid;
        if provider_transaction_id.is_some() {
            self.provider_transaction_id = provider_transaction_id;
        }
        if let Some(amount) = amount {
            self.amount = amount;
        }
        self.paid_at = Some(now);
        self.updated_at = now;
    }

    /// Records a failed payment.
    ///
    /// Refuses to regress a `paid` invoice: Whop delivers events unordered,
    /// and a failure webhook may arrive after the success that superseded it.
    pub fn record_failure(&mut self, now: DateTime<Utc>) -> Result<(), DomainError> {
        if self.status == InvoiceStatus::Paid {
            return Err(DomainError::new(
                ErrorCode::InvalidStateTransition,
                "Cannot mark a paid invoice as failed",
            ));
        }
        self.status = InvoiceStatus::Failed;
        self.updated_at = now;
        Ok(())
    }

    /// Stamps the time a reconciling webhook was received.
    pub fn record_webhook_receipt(&mut self, now: DateTime<Utc>) {
        self.webhook_received_at = Some(now);
        self.updated_at = now;
    }

    /// Generates a human-readable invoice number: `INV-` plus ten uppercase
    /// hex characters.
    pub fn generate_number() -> String {
        let suffix: String = Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(10)
            .collect::<String>()
            .to_uppercase();
        format!("INV-{}", suffix)
    }
}
