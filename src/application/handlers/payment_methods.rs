//! Payment method management for the authenticated API.

use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;

use crate::domain::billing::{NewPaymentMethod, PaymentMethod};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{InsertOutcome, PaymentMethodRepository};

/// Command to store an instrument the frontend captured via checkout.
#[derive(Debug, Clone)]
pub struct StorePaymentMethodCommand {
    pub user_id: i64,
    pub provider_payment_method_id: String,
    pub provider_customer_id: Option<String>,
    pub payment_type: Option<String>,
    pub last_four_digits: Option<String>,
    pub brand: Option<String>,
    /// Expiry as `YYYY-MM`.
    pub expiry: Option<String>,
}

/// Handler for listing and mutating a user's saved instruments.
pub struct PaymentMethodsHandler {
    payment_methods: Arc<dyn PaymentMethodRepository>,
}

impl PaymentMethodsHandler {
    pub fn new(payment_methods: Arc<dyn PaymentMethodRepository>) -> Self {
        Self { payment_methods }
    }

    /// Active methods, default first, then newest first.
    pub async fn list(&self, user_id: i64) -> Result<Vec<PaymentMethod>, DomainError> {
        self.payment_methods.list_active_for_user(user_id).await
    }

    /// Stores an instrument. The first active method becomes the default;
    /// a duplicate Whop token is a conflict.
    pub async fn store(
        &self,
        cmd: StorePaymentMethodCommand,
    ) -> Result<PaymentMethod, DomainError> {
        if cmd.provider_payment_method_id.trim().is_empty() {
            return Err(DomainError::new(
                ErrorCode::ValidationFailed,
                "Payment method id must not be empty",
            ));
        }
        let expires_at = cmd.expiry.as_deref().map(parse_expiry).transpose()?;
        let is_default = !self
            .payment_methods
            .has_active_for_user(cmd.user_id)
            .await?;

        let new = NewPaymentMethod {
            user_id: cmd.user_id,
            provider_customer_id: cmd.provider_customer_id,
            provider_payment_method_id: cmd.provider_payment_method_id,
            payment_type: cmd.payment_type.unwrap_or_else(|| "card".to_string()),
            last_four_digits: cmd.last_four_digits,
            brand: cmd.brand,
            expires_at,
            is_default,
            metadata: json!({}),
        };

        match self.payment_methods.insert(new).await? {
            InsertOutcome::Inserted(method) => Ok(method),
            InsertOutcome::DuplicateProviderPaymentMethodId => Err(DomainError::new(
                ErrorCode::PaymentMethodExists,
                "Payment method already exists",
            )),
        }
    }

    /// Makes one of the user's active methods the default; every other
    /// method loses the flag in the same operation.
    pub async fn set_default(
        &self,
        user_id: i64,
        payment_method_id: i64,
    ) -> Result<(), DomainError> {
        let method = self
            .payment_methods
            .find_for_user(user_id, payment_method_id)
            .await?
            .filter(|m| m.is_active)
            .ok_or_else(DomainError::payment_method_not_found)?;

        self.payment_methods.set_default(user_id, method.id).await
    }

    /// Soft-deletes a method. When the default is removed, the most recent
    /// remaining active method is promoted.
    pub async fn deactivate(
        &self,
        user_id: i64,
        payment_method_id: i64,
    ) -> Result<(), DomainError> {
        let method = self
            .payment_methods
            .find_for_user(user_id, payment_method_id)
            .await?
            .filter(|m| m.is_active)
            .ok_or_else(DomainError::payment_method_not_found)?;

        let was_default = method.is_default;
        self.payment_methods.deactivate(method.id).await?;

        if was_default {
            if let Some(next) = self
                .payment_methods
                .find_latest_active_for_user(user_id)
                .await?
            {
                self.payment_methods.set_default(user_id, next.id).await?;
            }
        }
        Ok(())
    }
}

/// Parses `YYYY-MM` into the first day of that month.
fn parse_expiry(s: &str) -> Result<NaiveDate, DomainError> {
    let invalid = || {
        DomainError::new(
            ErrorCode::InvalidFormat,
            format!("Invalid expiry '{}', expected YYYY-MM", s),
        )
    };
    let (year, month) = s.split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;
    NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)
}
