//! PostgreSQL implementation of PaymentMethodRepository.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::PgPool;

use crate::domain::billing::{NewPaymentMethod, PaymentMethod};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{InsertOutcome, PaymentMethodRepository};

/// PostgreSQL implementation of the PaymentMethodRepository port.
pub struct PostgresPaymentMethodRepository {
    pool: PgPool,
}

impl PostgresPaymentMethodRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PaymentMethodRow {
    id: i64,
    user_id: i64,
    provider_customer_id: Option<String>,
    provider_payment_method_id: String,
    payment_type: String,
    last_four_digits: Option<String>,
    brand: Option<String>,
    expires_at: Option<NaiveDate>,
    is_default: bool,
    is_active: bool,
    metadata: Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<PaymentMethodRow> for PaymentMethod {
    fn from(row: PaymentMethodRow) -> Self {
        PaymentMethod {
            id: row.id,
            user_id: row.user_id,
            provider_customer_id: row.provider_customer_id,
            provider_payment_method_id: row.provider_payment_method_id,
            payment_type: row.payment_type,
            last_four_digits: row.last_four_digits,
            brand: row.brand,
            expires_at: row.expires_at,
            is_default: row.is_default,
            is_active: row.is_active,
            metadata: row.metadata,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_PAYMENT_METHOD: &str = r#"
    SELECT id, user_id, provider_customer_id, provider_payment_method_id,
           payment_type, last_four_digits, brand, expires_at,
           is_default, is_active, metadata, created_at, updated_at
    FROM payment_methods
"#;

fn db_error(context: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("{}: {}", context, e))
}

#[async_trait]
impl PaymentMethodRepository for PostgresPaymentMethodRepository {
    async fn insert(&self, new: NewPaymentMethod) -> Result<InsertOutcome, DomainError> {
        let result: Result<PaymentMethodRow, sqlx::Error> = sqlx::query_as(
            r#"
            INSERT INTO payment_methods (
                user_id, provider_customer_id, provider_payment_method_id,
                payment_type, last_four_digits, brand, expires_at,
                is_default, is_active, metadata, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, TRUE, $9, NOW(), NOW())
            RETURNING id, user_id, provider_customer_id, provider_payment_method_id,
                      payment_type, last_four_digits, brand, expires_at,
                      is_default, is_active, metadata, created_at, updated_at
            "#,
        )
        .bind(new.user_id)
        .bind(&new.provider_customer_id)
        .bind(&new.provider_payment_method_id)
        .bind(&new.payment_type)
        .bind(&new.last_four_digits)
        .bind(&new.brand)
        .bind(new.expires_at)
        .bind(new.is_default)
        .bind(&new.metadata)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(row) => Ok(InsertOutcome::Inserted(PaymentMethod::from(row))),
            Err(e) => {
                // Concurrent inserts race past the existence check; the unique
                // constraint on the provider token settles it.
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return Ok(InsertOutcome::DuplicateProviderPaymentMethodId);
                    }
                }
                Err(db_error("Failed to insert payment method", e))
            }
        }
    }

    async fn exists_by_provider_payment_method_id(
        &self,
        provider_payment_method_id: &str,
    ) -> Result<bool, DomainError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM payment_methods WHERE provider_payment_method_id = $1)",
        )
        .bind(provider_payment_method_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to check payment method existence", e))?;

        Ok(exists)
    }

    async fn find_by_provider_customer_id(
        &self,
        provider_customer_id: &str,
    ) -> Result<Option<PaymentMethod>, DomainError> {
        let row: Option<PaymentMethodRow> = sqlx::query_as(&format!(
            "{} WHERE provider_customer_id = $1 ORDER BY id DESC LIMIT 1",
            SELECT_PAYMENT_METHOD
        ))
        .bind(provider_customer_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find payment method", e))?;

        Ok(row.map(PaymentMethod::from))
    }

    async fn find_for_user(
        &self,
        user_id: i64,
        payment_method_id: i64,
    ) -> Result<Option<PaymentMethod>, DomainError> {
        let row: Option<PaymentMethodRow> = sqlx::query_as(&format!(
            "{} WHERE user_id = $1 AND id = $2",
            SELECT_PAYMENT_METHOD
        ))
        .bind(user_id)
        .bind(payment_method_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find payment method", e))?;

        Ok(row.map(PaymentMethod::from))
    }

    async fn find_default_for_user(
        &self,
        user_id: i64,
    ) -> Result<Option<PaymentMethod>, DomainError> {
        let row: Option<PaymentMethodRow> = sqlx::query_as(&format!(
            "{} WHERE user_id = $1 AND is_default = TRUE AND is_active = TRUE",
            SELECT_PAYMENT_METHOD
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find default payment method", e))?;

        Ok(row.map(PaymentMethod::from))
    }

    async fn find_latest_active_for_user(
        &self,
        user_id: i64,
    ) -> Result<Option<PaymentMethod>, DomainError> {
        let row: Option<PaymentMethodRow> = sqlx::query_as(&format!(
            "{} WHERE user_id = $1 AND is_active = TRUE ORDER BY id DESC LIMIT 1",
            SELECT_PAYMENT_METHOD
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| db_error("Failed to find latest payment method", e))?;

        Ok(row.map(PaymentMethod::from))
    }

    async fn list_active_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<PaymentMethod>, DomainError> {
        let rows: Vec<PaymentMethodRow> = sqlx::query_as(&format!(
            "{} WHERE user_id = $1 AND is_active = TRUE ORDER BY is_default DESC, id DESC",
            SELECT_PAYMENT_METHOD
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| db_error("Failed to list payment methods", e))?;

        Ok(rows.into_iter().map(PaymentMethod::from).collect())
    }

    async fn has_active_for_user(&self, user_id: i64) -> Result<bool, DomainError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM payment_methods WHERE user_id = $1 AND is_active = TRUE)",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| db_error("Failed to check active payment methods", e))?;

        Ok(exists)
    }

    async fn set_default(
        &self,
        user_id: i64,
        payment_method_id: i64,
    ) -> Result<(), DomainError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| db_error("Failed to begin transaction", e))?;

        sqlx::query(
            "UPDATE payment_methods SET is_default = FALSE, updated_at = NOW() WHERE user_id = $1",
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to clear default flags", e))?;

        let result = sqlx::query(
            r#"
            UPDATE payment_methods SET is_default = TRUE, updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(payment_method_id)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| db_error("Failed to set default flag", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::PaymentMethodNotFound,
                "Payment method not found",
            ));
        }

        tx.commit()
            .await
            .map_err(|e| db_error("Failed to commit transaction", e))?;

        Ok(())
    }

    async fn deactivate(&self, payment_method_id: i64) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE payment_methods
            SET is_active = FALSE, is_default = FALSE, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(payment_method_id)
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("Failed to deactivate payment method", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(
                ErrorCode::PaymentMethodNotFound,
                "Payment method not found",
            ));
        }

        Ok(())
    }
}
