//! Route table for the authenticated billing API.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::adapters::http::AppState;

use super::handlers;

/// Routes mounted under `/api`; the caller attaches the auth middleware.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/me", get(handlers::me))
        .route("/invoices", get(handlers::list_invoices))
        .route("/invoices/:id", get(handlers::get_invoice))
        .route("/invoices/charge-credits", post(handlers::charge_credits))
        .route("/invoices/subscribe", post(handlers::subscribe))
        .route(
            "/payment-methods",
            get(handlers::list_payment_methods).post(handlers::store_payment_method),
        )
        .route(
            "/payment-methods/setup-checkout",
            post(handlers::setup_checkout),
        )
        .route(
            "/payment-methods/subscription-checkout",
            post(handlers::subscription_checkout),
        )
        .route(
            "/payment-methods/:id/default",
            post(handlers::set_default_payment_method),
        )
        .route(
            "/payment-methods/:id",
            delete(handlers::deactivate_payment_method),
        )
        .route("/plans", get(handlers::list_plans))
        .route("/plans/:id", get(handlers::get_plan))
}
