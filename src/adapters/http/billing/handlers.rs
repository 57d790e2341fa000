//! Axum handlers for the authenticated billing API.
//!
//! Every handler takes the caller through the [`CurrentUser`] extractor and
//! delegates to an application handler built from [`AppState`]. Ownership is
//! always scoped to the authenticated user; there is no admin surface.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;

use crate::adapters::http::error::ApiError;
use crate::adapters::http::middleware::CurrentUser;
use crate::adapters::http::AppState;
use crate::application::handlers::{
    ChargeCreditsCommand, StorePaymentMethodCommand, SubscribeCommand, SubscriptionCheckoutCommand,
};

use super::dto::{
    ChargeCreditsRequest, CheckoutResponse, InvoiceResponse, MessageResponse,
    PaymentMethodResponse, StorePaymentMethodRequest, SubscribeRequest,
    SubscriptionCheckoutRequest, UserResponse,
};

// ══════════════════════════════════════════════════════════════
// Auth
// ══════════════════════════════════════════════════════════════

/// GET /api/auth/me
pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserResponse> {
    Json(UserResponse::from(user))
}

// ══════════════════════════════════════════════════════════════
// Invoices
// ══════════════════════════════════════════════════════════════

/// GET /api/invoices
pub async fn list_invoices(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<InvoiceResponse>>, ApiError> {
    let invoices = state.list_invoices_handler().list(user.id).await?;
    Ok(Json(invoices.into_iter().map(Into::into).collect()))
}

/// GET /api/invoices/:id
pub async fn get_invoice(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(invoice_id): Path<i64>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let invoice = state.list_invoices_handler().get(user.id, invoice_id).await?;
    Ok(Json(invoice.into()))
}

/// POST /api/invoices/charge-credits
pub async fn charge_credits(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<ChargeCreditsRequest>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let result = state
        .charge_credits_handler()
        .handle(ChargeCreditsCommand {
            user_id: user.id,
            amount: request.amount,
            description: request.description,
        })
        .await?;
    Ok(Json(result.invoice.into()))
}

/// POST /api/invoices/subscribe
pub async fn subscribe(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<SubscribeRequest>,
) -> Result<Json<InvoiceResponse>, ApiError> {
    let result = state
        .subscribe_handler()
        .handle(SubscribeCommand {
            user_id: user.id,
            plan_id: request.plan_id,
            description: request.description,
        })
        .await?;
    Ok(Json(result.invoice.into()))
}

// ══════════════════════════════════════════════════════════════
// Payment methods
// ══════════════════════════════════════════════════════════════

/// GET /api/payment-methods
pub async fn list_payment_methods(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<Vec<PaymentMethodResponse>>, ApiError> {
    let methods = state.payment_methods_handler().list(user.id).await?;
    Ok(Json(methods.into_iter().map(Into::into).collect()))
}

/// POST /api/payment-methods
pub async fn store_payment_method(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<StorePaymentMethodRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let method = state
        .payment_methods_handler()
        .store(StorePaymentMethodCommand {
            user_id: user.id,
            provider_payment_method_id: request.provider_payment_method_id,
            provider_customer_id: request.provider_customer_id,
            payment_type: request.payment_type,
            last_four_digits: request.last_four_digits,
            brand: request.brand,
            expiry: request.expiry,
        })
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(PaymentMethodResponse::from(method)),
    ))
}

/// POST /api/payment-methods/:id/default
pub async fn set_default_payment_method(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(payment_method_id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .payment_methods_handler()
        .set_default(user.id, payment_method_id)
        .await?;
    Ok(Json(MessageResponse::new("Default payment method updated")))
}

/// DELETE /api/payment-methods/:id
pub async fn deactivate_payment_method(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(payment_method_id): Path<i64>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .payment_methods_handler()
        .deactivate(user.id, payment_method_id)
        .await?;
    Ok(Json(MessageResponse::new("Payment method removed")))
}

/// POST /api/payment-methods/setup-checkout
pub async fn setup_checkout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let session = state.checkouts_handler().setup_checkout(user.id).await?;
    Ok(Json(session.into()))
}

/// POST /api/payment-methods/subscription-checkout
pub async fn subscription_checkout(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(request): Json<SubscriptionCheckoutRequest>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let session = state
        .checkouts_handler()
        .subscription_checkout(SubscriptionCheckoutCommand {
            user_id: user.id,
            email: user.email,
            plan_id: request.plan_id,
            redirect_url: request.redirect_url,
        })
        .await?;
    Ok(Json(session.into()))
}

// ══════════════════════════════════════════════════════════════
// Plans
// ══════════════════════════════════════════════════════════════

/// GET /api/plans
pub async fn list_plans(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
) -> Result<Json<serde_json::Value>, ApiError> {
    let plans = state.checkouts_handler().plans().await?;
    Ok(Json(plans))
}

/// GET /api/plans/:id
pub async fn get_plan(
    State(state): State<AppState>,
    CurrentUser(_user): CurrentUser,
    Path(plan_id): Path<String>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let plan = state.checkouts_handler().plan(&plan_id).await?;
    Ok(Json(plan))
}
