//! Invoice queries for the authenticated API.

use std::sync::Arc;

use crate::domain::billing::Invoice;
use crate::domain::foundation::DomainError;
use crate::ports::InvoiceRepository;

/// Read-side handler for a user's invoices.
pub struct ListInvoicesHandler {
    invoices: Arc<dyn InvoiceRepository>,
}

impl ListInvoicesHandler {
    pub fn new(invoices: Arc<dyn InvoiceRepository>) -> Self {
        Self { invoices }
    }

    /// The caller's invoices, newest first.
    pub async fn list(&self, user_id: i64) -> Result<Vec<Invoice>, DomainError> {
        self.invoices.list_for_user(user_id).await
    }

    /// One invoice by id. Absent and foreign rows are indistinguishable.
    pub async fn get(&self, user_id: i64, invoice_id: i64) -> Result<Invoice, DomainError> {
        self.invoices
            .find_for_user(user_id, invoice_id)
            .await?
            .ok_or_else(DomainError::invoice_not_found)
    }
}
