//! Port for payment method persistence.

use async_trait::async_trait;

use crate::domain::billing::{NewPaymentMethod, PaymentMethod};
use crate::domain::foundation::DomainError;

/// Result of inserting a payment method.
///
/// The pre-insert existence check is not race-free: two concurrent webhook
/// deliveries can both pass it. The database's unique constraint on
/// `provider_payment_method_id` settles the race, and the loser must treat
/// the violation exactly like the "already stored" branch.
#[derive(Debug)]
pub enum InsertOutcome {
    /// Row was created.
    Inserted(PaymentMethod),
    /// A row with the same `provider_payment_method_id` already exists.
    DuplicateProviderPaymentMethodId,
}

/// Repository for [`PaymentMethod`] rows.
#[async_trait]
pub trait PaymentMethodRepository: Send + Sync {
    /// Inserts a new payment method, reporting a unique-constraint
    /// violation on the provider token as [`InsertOutcome::DuplicateProviderPaymentMethodId`].
    async fn insert(&self, new: NewPaymentMethod) -> Result<InsertOutcome, DomainError>;

    /// True if any row (active or not) carries this provider token.
    async fn exists_by_provider_payment_method_id(
        &self,
        provider_payment_method_id: &str,
    ) -> Result<bool, DomainError>;

    /// Any payment method attached to this external customer/member id,
    /// used to resolve webhook events to a local user.
    async fn find_by_provider_customer_id(
        &self,
        provider_customer_id: &str,
    ) -> Result<Option<PaymentMethod>, DomainError>;

    /// A user's payment method by id, regardless of active state.
    async fn find_for_user(
        &self,
        user_id: i64,
        payment_method_id: i64,
    ) -> Result<Option<PaymentMethod>, DomainError>;

    /// The user's active default method, if any.
    async fn find_default_for_user(
        &self,
        user_id: i64,
    ) -> Result<Option<PaymentMethod>, DomainError>;

    /// The most recently created active method, used for default promotion.
    async fn find_latest_active_for_user(
        &self,
        user_id: i64,
    ) -> Result<Option<PaymentMethod>, DomainError>;

    /// Active methods ordered default-first, then newest-first.
    async fn list_active_for_user(&self, user_id: i64)
        -> Result<Vec<PaymentMethod>, DomainError>;

    /// True if the user has at least one active method.
    async fn has_active_for_user(&self, user_id: i64) -> Result<bool, DomainError>;

    /// Atomically clears `is_default` on all of the user's methods and sets
    /// it on the target.
    async fn set_default(&self, user_id: i64, payment_method_id: i64)
        -> Result<(), DomainError>;

    /// Soft-deletes: clears `is_active` and `is_default`.
    async fn deactivate(&self, payment_method_id: i64) -> Result<(), DomainError>;
}
