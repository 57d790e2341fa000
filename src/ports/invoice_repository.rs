//! Port for invoice persistence.

use async_trait::async_trait;

use crate::domain::billing::{Invoice, NewInvoice};
use crate::domain::foundation::DomainError;

/// Repository for [`Invoice`] rows.
#[async_trait]
pub trait InvoiceRepository: Send + Sync {
    /// Creates a new invoice with status `pending`.
    async fn insert(&self, new: NewInvoice) -> Result<Invoice, DomainError>;

    /// Persists status, amount, transaction id, and timestamp changes.
    async fn update(&self, invoice: &Invoice) -> Result<(), DomainError>;

    /// The invoice matched by an upstream payment id, used by webhook
    /// reconciliation.
    async fn find_by_provider_transaction_id(
        &self,
        provider_transaction_id: &str,
    ) -> Result<Option<Invoice>, DomainError>;

    /// A user's invoice by id; `None` covers both absence and foreign
    /// ownership.
    async fn find_for_user(
        &self,
        user_id: i64,
        invoice_id: i64,
    ) -> Result<Option<Invoice>, DomainError>;

    /// The user's invoices, newest first.
    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Invoice>, DomainError>;
}
