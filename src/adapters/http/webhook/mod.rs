//! Webhook ingestion endpoint.

pub mod handlers;
pub mod routes;
