//! HandleWhopWebhookHandler - verification plus reconciliation for one
//! webhook delivery.

use std::sync::Arc;

use crate::domain::webhook::{
    WebhookError, WebhookOutcome, WebhookProcessor, WhopEvent, WhopWebhookVerifier,
};
use crate::ports::{InvoiceRepository, PaymentMethodRepository, UserRepository};

/// One raw webhook delivery as received over HTTP.
#[derive(Debug, Clone)]
pub struct WhopWebhookDelivery {
    pub payload: Vec<u8>,
    pub signature: String,
    pub timestamp: String,
    pub webhook_id: String,
}

/// Handler gluing signature verification to event reconciliation.
///
/// Only verification failures surface as `Err`; the HTTP adapter turns
/// those into 401 and everything else into an acknowledged 200.
pub struct HandleWhopWebhookHandler {
    verifier: WhopWebhookVerifier,
    processor: WebhookProcessor,
}

impl HandleWhopWebhookHandler {
    pub fn new(
        verifier: WhopWebhookVerifier,
        users: Arc<dyn UserRepository>,
        payment_methods: Arc<dyn PaymentMethodRepository>,
        invoices: Arc<dyn InvoiceRepository>,
    ) -> Self {
        Self {
            verifier,
            processor: WebhookProcessor::new(users, payment_methods, invoices),
        }
    }

    pub async fn handle(
        &self,
        delivery: WhopWebhookDelivery,
    ) -> Result<WebhookOutcome, WebhookError> {
        self.verifier.verify(
            &delivery.payload,
            &delivery.signature,
            &delivery.timestamp,
            &delivery.webhook_id,
        )?;

        let event: WhopEvent = serde_json::from_slice(&delivery.payload)
            .map_err(|e| WebhookError::ParseError(e.to_string()))?;

        self.processor.process(&event).await
    }
}
