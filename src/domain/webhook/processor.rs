//! Webhook processor - reconciles Whop events against local billing state.
//!
//! The processor receives envelopes that already passed signature
//! verification and dispatches totally over [`WhopEventType`]. Every branch
//! ends in an acknowledged outcome: events we cannot act on are ignored with
//! a reason rather than failed, because Whop retries non-2xx deliveries and
//! a malformed or unresolvable event will not improve on retry.
//!
//! ## Idempotency
//!
//! Payment method creation is keyed on Whop's globally unique token. A
//! pre-insert existence check handles the common duplicate delivery; the
//! database's unique constraint settles concurrent deliveries, and the
//! losing insert is treated exactly like the existence-check hit.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::domain::billing::{CardDetails, InvoiceStatus, NewPaymentMethod};
use crate::domain::webhook::event::{WhopEvent, WhopEventType};
use crate::domain::webhook::metadata::{extract_metadata, flow_matches};
use crate::domain::webhook::resolver::UserResolver;
use crate::domain::webhook::WebhookError;
use crate::ports::{InsertOutcome, InvoiceRepository, PaymentMethodRepository, UserRepository};

/// Flow tag written into checkout metadata by the save-card flow.
pub const FLOW_SAVE_PAYMENT_METHOD: &str = "save_payment_method";
/// Flow tag written into checkout metadata by the subscription flow.
pub const FLOW_SUBSCRIPTION_PLAN: &str = "subscription_plan";

/// How the processor disposed of an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookOutcome {
    /// The event changed (or idempotently re-confirmed) local state.
    Processed,
    /// The event was acknowledged without changing state.
    Ignored(String),
}

impl WebhookOutcome {
    fn ignored(reason: impl Into<String>) -> Self {
        Self::Ignored(reason.into())
    }
}

/// Reconciles verified webhook events into users, payment methods, and
/// invoices.
pub struct WebhookProcessor {
    payment_methods: Arc<dyn PaymentMethodRepository>,
    invoices: Arc<dyn InvoiceRepository>,
    resolver: UserResolver,
}

impl WebhookProcessor {
    pub fn new(
        users: Arc<dyn UserRepository>,
        payment_methods: Arc<dyn PaymentMethodRepository>,
        invoices: Arc<dyn InvoiceRepository>,
    ) -> Self {
        let resolver = UserResolver::new(users, payment_methods.clone());
        Self {
            payment_methods,
            invoices,
            resolver,
        }
    }

    /// Processes one verified event.
    ///
    /// `Err` is reserved for infrastructure failures (the database); every
    /// payload-shaped problem resolves to [`WebhookOutcome::Ignored`].
    pub async fn process(&self, event: &WhopEvent) -> Result<WebhookOutcome, WebhookError> {
        let event_type = event.parsed_type();
        tracing::info!(event_type = %event.event_type, "Processing Whop webhook event");

        let outcome = match event_type {
            WhopEventType::MembershipWentValid => {
                self.handle_membership_went_valid(&event.data).await?
            }
            WhopEventType::MembershipActivated => self.handle_membership_activated(&event.data),
            WhopEventType::SetupIntentSucceeded => {
                self.handle_setup_intent_succeeded(&event.data).await?
            }
            WhopEventType::PaymentSucceeded => self.handle_payment_succeeded(&event.data).await?,
            WhopEventType::PaymentFailed => self.handle_payment_failed(&event.data).await?,
            WhopEventType::Unknown => {
                WebhookOutcome::ignored(format!("Unhandled event type: {}", event.event_type))
            }
        };

        if let WebhookOutcome::Ignored(reason) = &outcome {
            tracing::info!(event_type = %event.event_type, reason = %reason, "Webhook event ignored");
        }

        Ok(outcome)
    }

    /// `membership.went_valid`: a subscription became active. Captures the
    /// payment method Whop attached to the membership, if we can tie the
    /// event to a local user.
    async fn handle_membership_went_valid(
        &self,
        data: &Value,
    ) -> Result<WebhookOutcome, WebhookError> {
        let metadata = extract_metadata(data);
        if !flow_matches(&metadata, FLOW_SUBSCRIPTION_PLAN) {
            return Ok(WebhookOutcome::ignored("Flow mismatch"));
        }

        // Whop reports the membership owner under `user_id` (`mber_xxx`),
        // which is their member id, not ours.
        let Some(member_id) = str_field(data, "user_id") else {
            return Ok(WebhookOutcome::ignored("No member id on membership"));
        };
        let Some(provider_payment_method_id) = str_field(data, "payment_method_id") else {
            return Ok(WebhookOutcome::ignored("No payment method on membership"));
        };

        let Some(user_id) = self
            .resolver
            .resolve_user_id(&metadata, Some(member_id))
            .await?
        else {
            return Ok(WebhookOutcome::ignored("Could not resolve user"));
        };

        // Membership payloads carry no instrument type; these are always cards.
        self.store_payment_method(
            user_id,
            Some(member_id),
            provider_payment_method_id,
            data.get("payment_method"),
            "credit_card".to_string(),
        )
        .await
    }

    /// `membership.activated`: informational only. The payment method
    /// arrives on `went_valid` or the payment events.
    fn handle_membership_activated(&self, data: &Value) -> WebhookOutcome {
        tracing::info!(
            membership_id = str_field(data, "id").unwrap_or("unknown"),
            "Membership activated"
        );
        WebhookOutcome::Processed
    }

    /// `setup_intent.succeeded`: a card was saved without a charge.
    async fn handle_setup_intent_succeeded(
        &self,
        data: &Value,
    ) -> Result<WebhookOutcome, WebhookError> {
        let metadata = extract_metadata(data);
        if !flow_matches(&metadata, FLOW_SAVE_PAYMENT_METHOD) {
            return Ok(WebhookOutcome::ignored("Flow mismatch"));
        }

        // Without the member id the instrument cannot be charged later, so
        // an incomplete setup event is dropped rather than stored.
        let Some(member_id) = str_field(data, "member_id") else {
            return Ok(WebhookOutcome::ignored("No member id on setup intent"));
        };
        let Some(provider_payment_method_id) = str_field(data, "payment_method_id") else {
            return Ok(WebhookOutcome::ignored("No payment method on setup intent"));
        };

        let Some(user) = self.resolver.resolve_user(&metadata).await? else {
            return Ok(WebhookOutcome::ignored("Could not resolve user"));
        };

        let pm_data = data.get("payment_method");
        self.store_payment_method(
            user.id,
            Some(member_id),
            provider_payment_method_id,
            pm_data,
            instrument_type(pm_data, "type", "credit_card"),
        )
        .await
    }

    /// `payment.succeeded`: either reconciles an invoice we created when
    /// issuing the charge, or (for subscription-creation payments) captures
    /// the instrument Whop charged.
    async fn handle_payment_succeeded(&self, data: &Value) -> Result<WebhookOutcome, WebhookError> {
        let Some(payment_id) = str_field(data, "id") else {
            return Ok(WebhookOutcome::ignored("Payment event without id"));
        };

        if let Some(mut invoice) = self
            .invoices
            .find_by_provider_transaction_id(payment_id)
            .await?
        {
            let now = chrono::Utc::now();
            invoice.record_payment(Some(payment_id.to_string()), amount_field(data), now);
            invoice.record_webhook_receipt(now);
            self.invoices.update(&invoice).await?;
            tracing::info!(
                invoice_id = invoice.id,
                payment_id = payment_id,
                "Invoice reconciled as paid"
            );
            return Ok(WebhookOutcome::Processed);
        }

        if str_field(data, "billing_reason") == Some("subscription_create") {
            return self.capture_subscription_instrument(data).await;
        }

        Ok(WebhookOutcome::ignored(format!(
            "No matching invoice for payment {}",
            payment_id
        )))
    }

    /// `payment.failed`: marks the matching invoice failed, unless a success
    /// already landed.
    async fn handle_payment_failed(&self, data: &Value) -> Result<WebhookOutcome, WebhookError> {
        let Some(payment_id) = str_field(data, "id") else {
            return Ok(WebhookOutcome::ignored("Payment event without id"));
        };

        let Some(mut invoice) = self
            .invoices
            .find_by_provider_transaction_id(payment_id)
            .await?
        else {
            return Ok(WebhookOutcome::ignored(format!(
                "No matching invoice for payment {}",
                payment_id
            )));
        };

        if invoice.status == InvoiceStatus::Paid {
            tracing::warn!(
                invoice_id = invoice.id,
                payment_id = payment_id,
                "Failure webhook for an already paid invoice; keeping paid"
            );
            return Ok(WebhookOutcome::ignored("Invoice already paid"));
        }

        let now = chrono::Utc::now();
        invoice.record_failure(now)?;
        invoice.record_webhook_receipt(now);
        self.invoices.update(&invoice).await?;
        tracing::info!(
            invoice_id = invoice.id,
            payment_id = payment_id,
            "Invoice marked failed"
        );
        Ok(WebhookOutcome::Processed)
    }

    /// Captures the instrument behind a subscription-creation payment. These
    /// events may carry no checkout metadata, so resolution falls back to
    /// the buyer's email.
    async fn capture_subscription_instrument(
        &self,
        data: &Value,
    ) -> Result<WebhookOutcome, WebhookError> {
        let metadata = extract_metadata(data);
        if !flow_matches(&metadata, FLOW_SUBSCRIPTION_PLAN) {
            return Ok(WebhookOutcome::ignored("Flow mismatch"));
        }

        let Some(pm_data) = data.get("payment_method").filter(|v| v.is_object()) else {
            return Ok(WebhookOutcome::ignored(
                "Subscription payment without payment method",
            ));
        };
        let Some(provider_payment_method_id) = pm_data.get("id").and_then(Value::as_str) else {
            return Ok(WebhookOutcome::ignored("Payment method without id"));
        };

        let member_id = data
            .get("member")
            .and_then(|m| m.get("id"))
            .and_then(Value::as_str)
            .or_else(|| str_field(data, "member_id"));
        let email = data
            .get("user")
            .and_then(|u| u.get("email"))
            .and_then(Value::as_str);

        let Some(user) = self.resolver.resolve_user_or_email(&metadata, email).await? else {
            return Ok(WebhookOutcome::ignored("Could not resolve user"));
        };

        self.store_payment_method(
            user.id,
            member_id,
            provider_payment_method_id,
            Some(pm_data),
            instrument_type(Some(pm_data), "payment_method_type", "card"),
        )
        .await
    }

    /// Stores a payment method if its Whop token is new.
    ///
    /// The first instrument a user saves becomes their default. Only the
    /// `payment_method` sub-object is persisted as metadata; the rest of the
    /// event is transient.
    async fn store_payment_method(
        &self,
        user_id: i64,
        member_id: Option<&str>,
        provider_payment_method_id: &str,
        pm_data: Option<&Value>,
        payment_type: String,
    ) -> Result<WebhookOutcome, WebhookError> {
        if self
            .payment_methods
            .exists_by_provider_payment_method_id(provider_payment_method_id)
            .await?
        {
            return Ok(WebhookOutcome::ignored("Payment method already stored"));
        }

        let card = pm_data
            .map(CardDetails::from_payment_method_value)
            .unwrap_or_default();
        let is_default = !self.payment_methods.has_active_for_user(user_id).await?;

        let new = NewPaymentMethod {
            user_id,
            provider_customer_id: member_id.map(str::to_string),
            provider_payment_method_id: provider_payment_method_id.to_string(),
            payment_type,
            last_four_digits: card.last_four_digits,
            brand: card.brand,
            expires_at: card.expires_at,
            is_default,
            metadata: pm_data.cloned().unwrap_or_else(|| Value::Object(Map::new())),
        };

        match self.payment_methods.insert(new).await? {
            InsertOutcome::Inserted(method) => {
                tracing::info!(
                    payment_method_id = method.id,
                    user_id = user_id,
                    is_default = method.is_default,
                    "Stored payment method from webhook"
                );
                Ok(WebhookOutcome::Processed)
            }
            InsertOutcome::DuplicateProviderPaymentMethodId => {
                // Lost a race with a concurrent delivery of the same token.
                Ok(WebhookOutcome::ignored("Payment method already stored"))
            }
        }
    }
}

fn str_field<'a>(data: &'a Value, key: &str) -> Option<&'a str> {
    data.get(key).and_then(Value::as_str)
}

// The type field on the payment method object is event-shaped: setup
// intents use `type`, payment events use `payment_method_type`.
fn instrument_type(pm_data: Option<&Value>, key: &str, default: &str) -> String {
    pm_data
        .and_then(|pm| pm.get(key))
        .and_then(Value::as_str)
        .unwrap_or(default)
        .to_string()
}

// Whop reports the amount as a JSON number in dollars under `total`.
fn amount_field(data: &Value) -> Option<f64> {
    data.get("total").and_then(Value::as_f64)
}
