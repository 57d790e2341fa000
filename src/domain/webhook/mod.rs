//! Webhook ingestion and reconciliation.
//!
//! The pipeline is: verify the delivery's signature and timestamp
//! ([`WhopWebhookVerifier`]), parse the envelope ([`WhopEvent`]), then
//! reconcile against local billing state ([`WebhookProcessor`]). Resolution
//! of payloads to local users lives in [`UserResolver`]; the metadata probes
//! it relies on are in [`metadata`].

pub mod errors;
pub mod event;
pub mod metadata;
pub mod processor;
pub mod resolver;
pub mod verifier;

pub use errors::WebhookError;
pub use event::{WhopEvent, WhopEventType};
pub use processor::{
    WebhookOutcome, WebhookProcessor, FLOW_SAVE_PAYMENT_METHOD, FLOW_SUBSCRIPTION_PLAN,
};
pub use resolver::UserResolver;
pub use verifier::WhopWebhookVerifier;
