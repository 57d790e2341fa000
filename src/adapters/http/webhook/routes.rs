//! Route table for webhook ingestion. Mounted without auth middleware;
//! the signature is the authentication.

use axum::routing::post;
use axum::Router;

use crate::adapters::http::AppState;

use super::handlers;

pub fn webhook_routes() -> Router<AppState> {
    Router::new().route("/whop", post(handlers::whop_webhook))
}
