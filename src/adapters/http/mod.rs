//! HTTP adapter: axum router, shared state, middleware, and error mapping.

pub mod billing;
pub mod error;
pub mod middleware;
pub mod webhook;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::application::handlers::{
    ChargeCreditsHandler, CheckoutsHandler, HandleWhopWebhookHandler, ListInvoicesHandler,
    PaymentMethodsHandler, SubscribeHandler,
};
use crate::domain::webhook::WhopWebhookVerifier;
use crate::ports::{
    IdentityProvider, InvoiceRepository, PaymentMethodRepository, PaymentProvider, UserRepository,
};

/// Shared state: the ports every request handler builds its application
/// handler from. Cloning is cheap; everything inside is an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub users: Arc<dyn UserRepository>,
    pub payment_methods: Arc<dyn PaymentMethodRepository>,
    pub invoices: Arc<dyn InvoiceRepository>,
    pub payment_provider: Arc<dyn PaymentProvider>,
    pub identity_provider: Arc<dyn IdentityProvider>,
    pub webhook_verifier: WhopWebhookVerifier,
}

impl AppState {
    pub fn charge_credits_handler(&self) -> ChargeCreditsHandler {
        ChargeCreditsHandler::new(
            self.payment_methods.clone(),
            self.invoices.clone(),
            self.payment_provider.clone(),
        )
    }

    pub fn subscribe_handler(&self) -> SubscribeHandler {
        SubscribeHandler::new(
            self.payment_methods.clone(),
            self.invoices.clone(),
            self.payment_provider.clone(),
        )
    }

    pub fn list_invoices_handler(&self) -> ListInvoicesHandler {
        ListInvoicesHandler::new(self.invoices.clone())
    }

    pub fn payment_methods_handler(&self) -> PaymentMethodsHandler {
        PaymentMethodsHandler::new(self.payment_methods.clone())
    }

    pub fn checkouts_handler(&self) -> CheckoutsHandler {
        CheckoutsHandler::new(self.payment_provider.clone())
    }

    pub fn whop_webhook_handler(&self) -> HandleWhopWebhookHandler {
        HandleWhopWebhookHandler::new(
            self.webhook_verifier.clone(),
            self.users.clone(),
            self.payment_methods.clone(),
            self.invoices.clone(),
        )
    }
}

/// Builds the full application router.
///
/// `/api` runs through the auth middleware; `/webhook` does not, its
/// deliveries are authenticated by signature.
pub fn router(state: AppState) -> Router {
    let api = billing::routes::api_routes().layer(axum::middleware::from_fn_with_state(
        state.clone(),
        middleware::auth_middleware,
    ));

    Router::new()
        .nest("/api", api)
        .nest("/webhook", webhook::routes::webhook_routes())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
