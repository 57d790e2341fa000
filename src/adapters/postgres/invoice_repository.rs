//! PostgreSQL implementation of InvoiceRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::domain::billing::{Invoice, InvoiceStatus, InvoiceType, NewInvoice};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::InvoiceRepository;

/// PostgreSQL implementation of the InvoiceRepository port.
pub struct PostgresInvoiceRepository {
    pool: PgPool,
}

impl PostgresInvoiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct InvoiceRow {
    id: i64,
    user_id: i64,
    payment_method_id: Option<i64>,
    invoice_number: String,
    invoice_type: String,
    amount: f64,
    currency: String,
    status: String,
    provider_transaction_id: Option<String>,
    description: String,
    metadata: Value,
    paid_at: Option<DateTime<Utc>>,
    webhook_received_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<InvoiceRow> for Invoice {
    type Error = DomainError;

    fn try_from(row: InvoiceRow) -> Result<Self, Self::Error> {
        Ok(Invoice {
            id: row.id,
            user_id: row.user_id,
            payment_method_id: row.payment_method_id,
            invoice_number: row.invoice_number,
            invoice_type: InvoiceType::parse(&row.invoice_type)?,
            amount: row.amount,
            currency: row.currency,
            status: InvoiceStatus::parse(&row.status)?,
            provider_transaction_id: row.provider_transaction_id,
            description: row.description,
            metadata: row.metadata,
            paid_at: row.paid_at,
            webhook_received_at: row.webhook_received_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

const SELECT_INVOICE: &str = r#"
    SELECT id, user_id, payment_method_id, invoice_number, invoice_type,
           amount, currency, status, provider_transaction_id, description,
           metadata, paid_at, webhook_received_at, created_at, updated_at
    FROM invoices
"#;

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

#[async_trait]
impl InvoiceRepository for PostgresInvoiceRepository {
    async fn insert(&self, new: NewInvoice) -> Result<Invoice, DomainError> {
        let row: InvoiceRow = sqlx::query_as(
            r#"
            INSERT INTO invoices (
                user_id, payment_method_id, invoice_number, invoice_type,
                amount, currency, status, description, metadata,
                created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7, $8, NOW(), NOW())
            RETURNING id, user_id, payment_method_id, invoice_number, invoice_type,
                      amount, currency, status, provider_transaction_id, description,
                      metadata, paid_at, webhook_received_at, created_at, updated_at
            "#,
        )
        .bind(new.user_id)
        .bind(new.payment_method_id)
        .bind(&new.invoice_number)
        .bind(new.invoice_type.as_str())
        .bind(new.amount)
        .bind(&new.currency)
        .bind(&new.description)
        .bind(&new.metadata)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to insert invoice", e))?;

        Invoice::try_from(row)
    }

    async fn update(&self, invoice: &Invoice) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE invoices SET
                status = $2,
                amount = $3,
                provider_transaction_id = $4,
                paid_at = $5,
                webhook_received_at = $6,
                updated_at = $7
            WHERE id = $1
            "#,
        )
        .bind(invoice.id)
        .bind(invoice.status.as_str())
        .bind(invoice.amount)
        .bind(&invoice.provider_transaction_id)
        .bind(invoice.paid_at)
        .bind(invoice.webhook_received_at)
        .bind(invoice.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to update invoice", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::InvoiceNotFound,
                "Invoice not found",
            ));
        }

        Ok(())
    }

    async fn find_by_provider_transaction_id(
        &self,
        provider_transaction_id: &str,
    ) -> Result<Option<Invoice>, DomainError> {
        let row: Option<InvoiceRow> = sqlx::query_as(&format!(
            "{} WHERE provider_transaction_id = $1",
            SELECT_INVOICE
        ))
        .bind(provider_transaction_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find invoice", e))?;

        row.map(Invoice::try_from).transpose()
    }

    async fn find_for_user(
        &self,
        user_id: i64,
        invoice_id: i64,
    ) -> Result<Option<Invoice>, DomainError> {
        let row: Option<InvoiceRow> = sqlx::query_as(&format!(
            "{} WHERE user_id = $1 AND id = $2",
            SELECT_INVOICE
        ))
        .bind(user_id)
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find invoice", e))?;

        row.map(Invoice::try_from).transpose()
    }

    async fn list_for_user(&self, user_id: i64) -> Result<Vec<Invoice>, DomainError> {
        let rows: Vec<InvoiceRow> = sqlx::query_as(&format!(
            "{} WHERE user_id = $1 ORDER BY id DESC",
            SELECT_INVOICE
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list invoices", e))?;

        rows.into_iter().map(Invoice::try_from).collect()
    }
}
