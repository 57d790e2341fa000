//! In-memory [`InvoiceRepository`].

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::billing::{Invoice, InvoiceStatus, NewInvoice};
use crate::domain::foundation::DomainError;
use crate::ports::InvoiceRepository;

#[derive(Default)]
pub struct InMemoryInvoiceRepository {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    invoices: Vec<Invoice>,
    next_id: i64,
}

impl InMemoryInvoiceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl InvoiceRepository for InMemoryInvoiceRepository {
    async fn insert(&self, new: NewInvoice) -> Result<Invoice, DomainError> {
        let mut state = self.state.write().await;
        state.next_id += 1;
        let now = Utc::now();
        let invoice = Invoice {
            id: state.next_id,
            user_id: new.user_id,
            payment_method_id: new.payment_method_id,
            invoice_number: new.invoice_number,
            invoice_type: new.invoice_type,
            amount: new.amount,
            currency: new.currency,
            status: InvoiceStatus::Pending,
            provider_transaction_id: None,
            description: new.description,
            metadata: new.metadata,
            paid_at: None,
            webhook_received_at: None,
            created_at: now,
            updated_at: now,
        };
        state.invoices.push(invoice.clone());
        Ok(invoice)
    }

    async fn update(&self, invoice: &Invoice) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.invoices.iter_mut().find(|i| i.id == invoice.id) {
            *existing = invoice.clone();
        }
        Ok(())
    }

    async fn find_by_provider_transaction_id(
        &self,
        provider_transaction_id: &str,
    ) -> Result<Option<Invoice>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .invoices
            .iter()
            .find(|i| i.provider_transaction_id.as_deref() == Some(provider_transaction_id))
            .cloned())
    }

    async fn find_for_user(
        &self,
        user_id: i64,
        invoice_id: i64,
    ) -> Result<Option<Invoice>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .invoices
            .iter()
            .find(|i| i.user_id == user_id && i.id == invoice_id)
            .cloned())
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Invoice>, DomainError> {
        let state = self.state.read().await;
        let mut invoices: Vec<Invoice> = state
            .invoices
            .iter()
            .filter(|i| i.user_id == user_id)
            .cloned()
            .collect();
        invoices.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(invoices)
    }
}
