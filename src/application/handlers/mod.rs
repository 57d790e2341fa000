//! Application command and query handlers.
//!
//! Each handler wires domain logic to the ports it needs; the HTTP adapter
//! owns request/response shapes and calls in here with plain commands.

mod charge_credits;
mod checkouts;
mod handle_whop_webhook;
mod list_invoices;
mod payment_methods;
mod subscribe;

pub use charge_credits::{ChargeCreditsCommand, ChargeCreditsHandler, ChargeCreditsResult};
pub use checkouts::{CheckoutsHandler, SubscriptionCheckoutCommand};
pub use handle_whop_webhook::{HandleWhopWebhookHandler, WhopWebhookDelivery};
pub use list_invoices::ListInvoicesHandler;
pub use payment_methods::{PaymentMethodsHandler, StorePaymentMethodCommand};
pub use subscribe::{SubscribeCommand, SubscribeHandler, SubscribeResult};
