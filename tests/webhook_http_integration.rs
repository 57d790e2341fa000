//! Integration tests for the Whop webhook endpoint.
//!
//! Exercises the full router with in-memory repositories: signature
//! verification, the 401-versus-200 response contract, and end-to-end
//! reconciliation of invoices and payment methods.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use hmac::{Hmac, Mac};
use serde_json::{json, Value};
use sha2::Sha256;
use tower::ServiceExt;

use paysync::adapters::clerk::MockIdentityProvider;
use paysync::adapters::http::{router, AppState};
use paysync::adapters::memory::{
    InMemoryInvoiceRepository, InMemoryPaymentMethodRepository, InMemoryUserRepository,
};
use paysync::adapters::whop::MockPaymentProvider;
use paysync::domain::billing::{Invoice, InvoiceStatus, InvoiceType, NewInvoice, User, UserProfile};
use paysync::domain::webhook::WhopWebhookVerifier;
use paysync::ports::{InvoiceRepository, PaymentMethodRepository, UserRepository};

const WEBHOOK_SECRET: &str = "whsec_integration_test";

struct TestApp {
    users: Arc<InMemoryUserRepository>,
    payment_methods: Arc<InMemoryPaymentMethodRepository>,
    invoices: Arc<InMemoryInvoiceRepository>,
    router: axum::Router,
}

fn test_app() -> TestApp {
    let users = Arc::new(InMemoryUserRepository::new());
    let payment_methods = Arc::new(InMemoryPaymentMethodRepository::new());
    let invoices = Arc::new(InMemoryInvoiceRepository::new());

    let state = AppState {
        users: users.clone(),
        payment_methods: payment_methods.clone(),
        invoices: invoices.clone(),
        payment_provider: Arc::new(MockPaymentProvider::new()),
        identity_provider: Arc::new(MockIdentityProvider::new()),
        webhook_verifier: WhopWebhookVerifier::new(WEBHOOK_SECRET),
    };

    TestApp {
        users,
        payment_methods,
        invoices,
        router: router(state),
    }
}

fn sign(webhook_id: &str, timestamp: &str, payload: &str) -> String {
    let message = format!("{}.{}.{}", webhook_id, timestamp, payload);
    let mut mac = Hmac::<Sha256>::new_from_slice(WEBHOOK_SECRET.as_bytes())
        .expect("HMAC accepts any key length");
    mac.update(message.as_bytes());
    format!("v1,{}", BASE64.encode(mac.finalize().into_bytes()))
}

fn signed_request(payload: &str) -> Request<Body> {
    let timestamp = chrono::Utc::now().timestamp().to_string();
    let signature = sign("msg_test", &timestamp, payload);

    Request::builder()
        .method("POST")
        .uri("/webhook/whop")
        .header("content-type", "application/json")
        .header("webhook-id", "msg_test")
        .header("webhook-timestamp", timestamp)
        .header("webhook-signature", signature)
        .body(Body::from(payload.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn seed_user(app: &TestApp) -> User {
    app.users
        .create(&UserProfile {
            clerk_user_id: "user_wh".to_string(),
            name: "Webhook User".to_string(),
            email: Some("wh@example.com".to_string()),
            avatar_url: None,
        })
        .await
        .unwrap()
}

async fn seed_pending_invoice(app: &TestApp, user_id: i64, payment_id: &str) -> Invoice {
    let mut invoice = app
        .invoices
        .insert(NewInvoice {
            user_id,
            payment_method_id: None,
            invoice_number: Invoice::generate_number(),
            invoice_type: InvoiceType::CreditPurchase,
            amount: 10.0,
            currency: "usd".to_string(),
            description: "Credit purchase".to_string(),
            metadata: json!({}),
        })
        .await
        .unwrap();
    invoice.provider_transaction_id = Some(payment_id.to_string());
    app.invoices.update(&invoice).await.unwrap();
    invoice
}

// ══════════════════════════════════════════════════════════════
// Response Contract Tests
// ══════════════════════════════════════════════════════════════

#[tokio::test]
async fn valid_delivery_is_acknowledged() {
    let app = test_app();
    let payload = json!({"type": "membership.activated", "data": {"id": "mem_1"}}).to_string();

    let response = app.router.oneshot(signed_request(&payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "ok");
}

#[tokio::test]
async fn tampered_payload_is_rejected_with_401() {
    let app = test_app();
    let payload = json!({"type": "payment.succeeded", "data": {"id": "pay_1"}}).to_string();
    let mut request = signed_request(&payload);
    *request.body_mut() = Body::from(payload.replace("pay_1", "pay_2"));

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn missing_signature_headers_are_rejected_with_401() {
    let app = test_app();
    let request = Request::builder()
        .method("POST")
        .uri("/webhook/whop")
        .header("content-type", "application/json")
        .body(Body::from(r#"{"type":"payment.succeeded","data":{}}"#))
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn stale_timestamp_is_rejected_with_401() {
    let app = test_app();
    let payload = json!({"type": "payment.succeeded", "data": {"id": "pay_1"}}).to_string();
    let timestamp = (chrono::Utc::now().timestamp() - 600).to_string();
    let signature = sign("msg_test", &timestamp, &payload);
    let request = Request::builder()
        .method("POST")
        .uri("/webhook/whop")
        .header("webhook-id", "msg_test")
        .header("webhook-timestamp", timestamp)
        .header("webhook-signature", signature)
        .body(Body::from(payload))
        .unwrap();

    let response = app.router.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unknown_event_type_is_acknowledged() {
    let app = test_app();
    let payload = json!({"type": "dispute.created", "data": {}}).to_string();

    let response = app.router.oneshot(signed_request(&payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn malformed_json_with_valid_signature_is_acknowledged() {
    let app = test_app();
    let payload = "this is not json";

    let response = app.router.oneshot(signed_request(payload)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["message"], "ok");
}

// ══════════════════════════════════════════════════════════════
// Reconciliation Tests
// ══════════════════════════════════════════════════════════════

#[tokio::test]
async fn payment_succeeded_marks_invoice_paid() {
    let app = test_app();
    let user = seed_user(&app).await;
    seed_pending_invoice(&app, user.id, "pay_int_1").await;
    let payload = json!({
        "type": "payment.succeeded",
        "data": {"id": "pay_int_1", "total": 10.0}
    })
    .to_string();

    let response = app
        .router
        .clone()
        .oneshot(signed_request(&payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let invoice = app
        .invoices
        .find_by_provider_transaction_id("pay_int_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Paid);
    assert!(invoice.webhook_received_at.is_some());
}

#[tokio::test]
async fn duplicate_delivery_stores_one_payment_method() {
    let app = test_app();
    let user = seed_user(&app).await;
    let payload = json!({
        "type": "setup_intent.succeeded",
        "data": {
            "member_id": "mber_int",
            "payment_method_id": "payt_int",
            "metadata": {"user_id": user.id.to_string(), "flow": "save_payment_method"},
            "payment_method": {
                "card": {"brand": "visa", "last4": "4242", "exp_year": 2027, "exp_month": 3}
            }
        }
    })
    .to_string();

    for _ in 0..2 {
        let response = app
            .router
            .clone()
            .oneshot(signed_request(&payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let methods = app
        .payment_methods
        .list_active_for_user(user.id)
        .await
        .unwrap();
    assert_eq!(methods.len(), 1);
    assert_eq!(methods[0].provider_payment_method_id, "payt_int");
    assert!(methods[0].is_default);
}

#[tokio::test]
async fn setup_intent_without_member_id_stores_nothing() {
    let app = test_app();
    let user = seed_user(&app).await;
    let payload = json!({
        "type": "setup_intent.succeeded",
        "data": {
            "payment_method_id": "payt_int_2",
            "metadata": {"user_id": user.id.to_string(), "flow": "save_payment_method"},
            "payment_method": {
                "card": {"brand": "visa", "last4": "4242", "exp_year": 2027, "exp_month": 3}
            }
        }
    })
    .to_string();

    let response = app
        .router
        .clone()
        .oneshot(signed_request(&payload))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let methods = app
        .payment_methods
        .list_active_for_user(user.id)
        .await
        .unwrap();
    assert!(methods.is_empty());
}

#[tokio::test]
async fn failure_after_success_keeps_invoice_paid() {
    let app = test_app();
    let user = seed_user(&app).await;
    seed_pending_invoice(&app, user.id, "pay_int_2").await;

    let success = json!({"type": "payment.succeeded", "data": {"id": "pay_int_2"}}).to_string();
    let failure = json!({"type": "payment.failed", "data": {"id": "pay_int_2"}}).to_string();
    for payload in [&success, &failure] {
        let response = app
            .router
            .clone()
            .oneshot(signed_request(payload))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let invoice = app
        .invoices
        .find_by_provider_transaction_id("pay_int_2")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(invoice.status, InvoiceStatus::Paid);
}
