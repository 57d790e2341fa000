//! Integration tests for the authenticated billing API.
//!
//! Exercises the full router with in-memory repositories, the mock payment
//! provider, and the mock identity provider standing in for Clerk.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use paysync::adapters::clerk::MockIdentityProvider;
use paysync::adapters::http::{router, AppState};
use paysync::adapters::memory::{
    InMemoryInvoiceRepository, InMemoryPaymentMethodRepository, InMemoryUserRepository,
};
use paysync::adapters::whop::MockPaymentProvider;
use paysync::domain::billing::{InvoiceStatus, NewPaymentMethod, User, UserProfile};
use paysync::domain::webhook::WhopWebhookVerifier;
use paysync::ports::{
    ExternalAccount, InvoiceRepository, PaymentMethodRepository, UserRepository, VerifiedIdentity,
};

struct TestApp {
    users: Arc<InMemoryUserRepository>,
    payment_methods: Arc<InMemoryPaymentMethodRepository>,
    invoices: Arc<InMemoryInvoiceRepository>,
    payment_provider: Arc<MockPaymentProvider>,
    identity_provider: Arc<MockIdentityProvider>,
    router: axum::Router,
}

fn test_app_with_provider(payment_provider: MockPaymentProvider) -> TestApp {
    let users = Arc::new(InMemoryUserRepository::new());
    let payment_methods = Arc::new(InMemoryPaymentMethodRepository::new());
    let invoices = Arc::new(InMemoryInvoiceRepository::new());
    let payment_provider = Arc::new(payment_provider);
    let identity_provider = Arc::new(MockIdentityProvider::new());

    let state = AppState {
        users: users.clone(),
        payment_methods: payment_methods.clone(),
        invoices: invoices.clone(),
        payment_provider: payment_provider.clone(),
        identity_provider: identity_provider.clone(),
        webhook_verifier: WhopWebhookVerifier::new("whsec_test"),
    };

    TestApp {
        users,
        payment_methods,
        invoices,
        payment_provider,
        identity_provider,
        router: router(state),
    }
}

fn test_app() -> TestApp {
    test_app_with_provider(MockPaymentProvider::new())
}

fn identity(subject: &str, email: &str) -> VerifiedIdentity {
    VerifiedIdentity {
        subject: subject.to_string(),
        name: "Ada Lovelace".to_string(),
        email: Some(email.to_string()),
        avatar_url: None,
        external_accounts: vec![ExternalAccount {
            provider: "oauth_google".to_string(),
            id: format!("eac_{}", subject),
            email: Some(email.to_string()),
        }],
    }
}

/// Seeds a user, registers a bearer token for them, and returns the user.
async fn seed_authenticated_user(app: &TestApp, token: &str, subject: &str) -> User {
    let user = app
        .users
        .create(&UserProfile {
            clerk_user_id: subject.to_string(),
            name: "Ada Lovelace".to_string(),
            email: Some("ada@example.com".to_string()),
            avatar_url: None,
        })
        .await
        .unwrap();
    app.identity_provider
        .register(token, identity(subject, "ada@example.com"));
    user
}

async fn seed_default_method(app: &TestApp, user_id: i64) {
    app.payment_methods
        .insert(NewPaymentMethod {
            user_id,
            provider_customer_id: Some("mber_int".to_string()),
            provider_payment_method_id: "payt_int".to_string(),
            payment_type: "card".to_string(),
            last_four_digits: Some("4242".to_string()),
            brand: Some("visa".to_string()),
            expires_at: None,
            is_default: true,
            metadata: json!({}),
        })
        .await
        .unwrap();
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

// ══════════════════════════════════════════════════════════════
// Authentication Tests
// ══════════════════════════════════════════════════════════════

#[tokio::test]
async fn me_without_token_is_unauthorized() {
    let app = test_app();

    let response = app
        .router
        .oneshot(request("GET", "/api/auth/me", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn me_with_unknown_token_is_unauthorized() {
    let app = test_app();

    let response = app
        .router
        .oneshot(request("GET", "/api/auth/me", Some("bogus"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn first_authenticated_request_creates_user_and_identity_links() {
    let app = test_app();
    app.identity_provider
        .register("tok_new", identity("user_new", "new@example.com"));

    let response = app
        .router
        .clone()
        .oneshot(request("GET", "/api/auth/me", Some("tok_new"), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["clerk_user_id"], "user_new");
    assert_eq!(body["email"], "new@example.com");

    let created = app
        .users
        .find_by_clerk_user_id("user_new")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(created.name, "Ada Lovelace");
    let identities = app.users.identities().await;
    assert_eq!(identities.len(), 1);
    assert_eq!(identities[0].provider, "oauth_google");
}

// ══════════════════════════════════════════════════════════════
// Charge Credits Tests
// ══════════════════════════════════════════════════════════════

#[tokio::test]
async fn charge_credits_creates_paid_invoice() {
    let app = test_app();
    let user = seed_authenticated_user(&app, "tok_1", "user_1").await;
    seed_default_method(&app, user.id).await;

    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/api/invoices/charge-credits",
            Some("tok_1"),
            Some(json!({"amount": 20.0})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "paid");
    assert_eq!(body["amount"], 20.0);
    assert!(body["invoice_number"]
        .as_str()
        .unwrap()
        .starts_with("INV-"));

    let charges = app.payment_provider.charges();
    assert_eq!(charges.len(), 1);
    assert_eq!(charges[0].member_id, "mber_int");
    assert_eq!(charges[0].payment_method_id, "payt_int");
}

#[tokio::test]
async fn charge_credits_without_payment_method_is_unprocessable() {
    let app = test_app();
    seed_authenticated_user(&app, "tok_2", "user_2").await;

    let response = app
        .router
        .oneshot(request(
            "POST",
            "/api/invoices/charge-credits",
            Some("tok_2"),
            Some(json!({"amount": 20.0})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn declined_charge_records_failed_invoice() {
    let app = test_app_with_provider(MockPaymentProvider::declining());
    let user = seed_authenticated_user(&app, "tok_3", "user_3").await;
    seed_default_method(&app, user.id).await;

    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/api/invoices/charge-credits",
            Some("tok_3"),
            Some(json!({"amount": 15.0})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let invoices = app.invoices.list_for_user(user.id).await.unwrap();
    assert_eq!(invoices.len(), 1);
    assert_eq!(invoices[0].status, InvoiceStatus::Failed);
}

#[tokio::test]
async fn charge_credits_rejects_non_positive_amount() {
    let app = test_app();
    let user = seed_authenticated_user(&app, "tok_4", "user_4").await;
    seed_default_method(&app, user.id).await;

    let response = app
        .router
        .oneshot(request(
            "POST",
            "/api/invoices/charge-credits",
            Some("tok_4"),
            Some(json!({"amount": -5.0})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

// ══════════════════════════════════════════════════════════════
// Invoice Listing Tests
// ══════════════════════════════════════════════════════════════

#[tokio::test]
async fn invoices_are_scoped_to_the_caller() {
    let app = test_app();
    let alice = seed_authenticated_user(&app, "tok_alice", "user_alice").await;
    seed_authenticated_user(&app, "tok_bob", "user_bob").await;
    seed_default_method(&app, alice.id).await;
    app.router
        .clone()
        .oneshot(request(
            "POST",
            "/api/invoices/charge-credits",
            Some("tok_alice"),
            Some(json!({"amount": 10.0})),
        ))
        .await
        .unwrap();

    let response = app
        .router
        .clone()
        .oneshot(request("GET", "/api/invoices", Some("tok_bob"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 0);

    let alice_invoices = app.invoices.list_for_user(alice.id).await.unwrap();
    let foreign = app
        .router
        .oneshot(request(
            "GET",
            &format!("/api/invoices/{}", alice_invoices[0].id),
            Some("tok_bob"),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(foreign.status(), StatusCode::NOT_FOUND);
}

// ══════════════════════════════════════════════════════════════
// Payment Method Management Tests
// ══════════════════════════════════════════════════════════════

#[tokio::test]
async fn storing_duplicate_token_is_a_conflict() {
    let app = test_app();
    seed_authenticated_user(&app, "tok_5", "user_5").await;
    let body = json!({
        "provider_payment_method_id": "payt_dup",
        "payment_type": "card",
        "last_four_digits": "4242",
        "brand": "visa",
        "expiry": "2027-03"
    });

    let first = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/api/payment-methods",
            Some("tok_5"),
            Some(body.clone()),
        ))
        .await
        .unwrap();
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = app
        .router
        .oneshot(request(
            "POST",
            "/api/payment-methods",
            Some("tok_5"),
            Some(body),
        ))
        .await
        .unwrap();
    assert_eq!(second.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn set_default_moves_the_flag() {
    let app = test_app();
    let user = seed_authenticated_user(&app, "tok_6", "user_6").await;
    for token in ["payt_x", "payt_y"] {
        app.router
            .clone()
            .oneshot(request(
                "POST",
                "/api/payment-methods",
                Some("tok_6"),
                Some(json!({"provider_payment_method_id": token})),
            ))
            .await
            .unwrap();
    }
    let methods = app
        .payment_methods
        .list_active_for_user(user.id)
        .await
        .unwrap();
    let second = methods.iter().find(|m| !m.is_default).unwrap();

    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            &format!("/api/payment-methods/{}/default", second.id),
            Some("tok_6"),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let methods = app
        .payment_methods
        .list_active_for_user(user.id)
        .await
        .unwrap();
    let defaults: Vec<_> = methods.iter().filter(|m| m.is_default).collect();
    assert_eq!(defaults.len(), 1);
    assert_eq!(defaults[0].id, second.id);
}

#[tokio::test]
async fn deactivating_the_default_promotes_another_method() {
    let app = test_app();
    let user = seed_authenticated_user(&app, "tok_7", "user_7").await;
    for token in ["payt_m", "payt_n"] {
        app.router
            .clone()
            .oneshot(request(
                "POST",
                "/api/payment-methods",
                Some("tok_7"),
                Some(json!({"provider_payment_method_id": token})),
            ))
            .await
            .unwrap();
    }
    let methods = app
        .payment_methods
        .list_active_for_user(user.id)
        .await
        .unwrap();
    let default = methods.iter().find(|m| m.is_default).unwrap();

    let response = app
        .router
        .clone()
        .oneshot(request(
            "DELETE",
            &format!("/api/payment-methods/{}", default.id),
            Some("tok_7"),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let remaining = app
        .payment_methods
        .list_active_for_user(user.id)
        .await
        .unwrap();
    assert_eq!(remaining.len(), 1);
    assert!(remaining[0].is_default);
}

// ══════════════════════════════════════════════════════════════
// Checkout Tests
// ══════════════════════════════════════════════════════════════

#[tokio::test]
async fn setup_checkout_tags_the_save_card_flow() {
    let app = test_app();
    let user = seed_authenticated_user(&app, "tok_8", "user_8").await;

    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/api/payment-methods/setup-checkout",
            Some("tok_8"),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["purchase_url"].as_str().unwrap().starts_with("https://"));

    let checkouts = app.payment_provider.checkouts();
    assert_eq!(checkouts.len(), 1);
    assert_eq!(
        checkouts[0].metadata.get("flow").and_then(Value::as_str),
        Some("save_payment_method")
    );
    assert_eq!(
        checkouts[0].metadata.get("user_id").and_then(Value::as_str),
        Some(user.id.to_string().as_str())
    );
}

#[tokio::test]
async fn subscription_checkout_carries_plan_and_flow() {
    let app = test_app();
    seed_authenticated_user(&app, "tok_9", "user_9").await;

    let response = app
        .router
        .clone()
        .oneshot(request(
            "POST",
            "/api/payment-methods/subscription-checkout",
            Some("tok_9"),
            Some(json!({"plan_id": "plan_42", "redirect_url": "https://app.example.com/done"})),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let checkouts = app.payment_provider.checkouts();
    assert_eq!(checkouts[0].plan_id.as_deref(), Some("plan_42"));
    assert_eq!(
        checkouts[0].metadata.get("flow").and_then(Value::as_str),
        Some("subscription_plan")
    );
}
