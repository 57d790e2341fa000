//! Whop webhook endpoint.
//!
//! Response contract: 401 only when the delivery itself cannot be trusted
//! (signature or timestamp failure). Everything else acknowledges with 200
//! so Whop stops retrying; unresolvable events were already logged and
//! skipped by the processor.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::adapters::http::AppState;
use crate::application::handlers::WhopWebhookDelivery;
use crate::domain::webhook::WebhookOutcome;

#[derive(Debug, Serialize)]
struct WebhookAck {
    message: String,
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
}

/// POST /webhook/whop
pub async fn whop_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let delivery = WhopWebhookDelivery {
        payload: body.to_vec(),
        signature: header_str(&headers, "webhook-signature").to_string(),
        timestamp: header_str(&headers, "webhook-timestamp").to_string(),
        webhook_id: header_str(&headers, "webhook-id").to_string(),
    };

    match state.whop_webhook_handler().handle(delivery).await {
        Ok(WebhookOutcome::Processed) => ack(),
        Ok(WebhookOutcome::Ignored(reason)) => {
            tracing::info!(reason = %reason, "Webhook acknowledged without processing");
            ack()
        }
        Err(err) if err.is_rejection() => {
            tracing::warn!(error = %err, "Rejected webhook delivery");
            (
                StatusCode::UNAUTHORIZED,
                Json(WebhookAck {
                    message: err.to_string(),
                }),
            )
                .into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "Webhook processing failed, acknowledging anyway");
            ack()
        }
    }
}

fn ack() -> Response {
    (
        StatusCode::OK,
        Json(WebhookAck {
            message: "ok".to_string(),
        }),
    )
        .into_response()
}
