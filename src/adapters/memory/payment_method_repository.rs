//! In-memory [`PaymentMethodRepository`].

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::billing::{NewPaymentMethod, PaymentMethod};
use crate::domain::foundation::DomainError;
use crate::ports::{InsertOutcome, PaymentMethodRepository};

#[derive(Default)]
pub struct InMemoryPaymentMethodRepository {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    methods: Vec<PaymentMethod>,
    next_id: i64,
}

impl InMemoryPaymentMethodRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PaymentMethodRepository for InMemoryPaymentMethodRepository {
    async fn insert(&self, new: NewPaymentMethod) -> Result<InsertOutcome, DomainError> {
        let mut state = self.state.write().await;
        // Mirrors the database's unique constraint on the provider token.
        if state
            .methods
            .iter()
            .any(|m| m.provider_payment_method_id == new.provider_payment_method_id)
        {
            return Ok(InsertOutcome::DuplicateProviderPaymentMethodId);
        }
        state.next_id += 1;
        let now = Utc::now();
        let method = PaymentMethod {
            id: state.next_id,
            user_id: new.user_id,
            provider_customer_id: new.provider_customer_id,
            provider_payment_method_id: new.provider_payment_method_id,
            payment_type: new.payment_type,
            last_four_digits: new.last_four_digits,
            brand: new.brand,
            expires_at: new.expires_at,
            is_default: new.is_default,
            is_active: true,
            metadata: new.metadata,
            created_at: now,
            updated_at: now,
        };
        state.methods.push(method.clone());
        Ok(InsertOutcome::Inserted(method))
    }

    async fn exists_by_provider_payment_method_id(
        &self,
        provider_payment_method_id: &str,
    ) -> Result<bool, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .methods
            .iter()
            .any(|m| m.provider_payment_method_id == provider_payment_method_id))
    }

    async fn find_by_provider_customer_id(
        &self,
        provider_customer_id: &str,
    ) -> Result<Option<PaymentMethod>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .methods
            .iter()
            .find(|m| m.provider_customer_id.as_deref() == Some(provider_customer_id))
            .cloned())
    }

    async fn find_for_user(
        &self,
        user_id: i64,
        payment_method_id: i64,
    ) -> Result<Option<PaymentMethod>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .methods
            .iter()
            .find(|m| m.user_id == user_id && m.id == payment_method_id)
            .cloned())
    }

    async fn find_default_for_user(
        &self,
        user_id: i64,
    ) -> Result<Option<PaymentMethod>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .methods
            .iter()
            .find(|m| m.user_id == user_id && m.is_active && m.is_default)
            .cloned())
    }

    async fn find_latest_active_for_user(
        &self,
        user_id: i64,
    ) -> Result<Option<PaymentMethod>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .methods
            .iter()
            .filter(|m| m.user_id == user_id && m.is_active)
            .max_by_key(|m| m.id)
            .cloned())
    }

    async fn list_active_for_user(
        &self,
        user_id: i64,
    ) -> Result<Vec<PaymentMethod>, DomainError> {
        let state = self.state.read().await;
        let mut methods: Vec<PaymentMethod> = state
            .methods
            .iter()
            .filter(|m| m.user_id == user_id && m.is_active)
            .cloned()
            .collect();
        methods.sort_by(|a, b| {
            b.is_default
                .cmp(&a.is_default)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(methods)
    }

    async fn has_active_for_user(&self, user_id: i64) -> Result<bool, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .methods
            .iter()
            .any(|m| m.user_id == user_id && m.is_active))
    }

    async fn set_default(
        &self,
        user_id: i64,
        payment_method_id: i64,
    ) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        for method in state.methods.iter_mut().filter(|m| m.user_id == user_id) {
            let make_default = method.id == payment_method_id;
            if method.is_default != make_default {
                method.is_default = make_default;
                method.updated_at = now;
            }
        }
        Ok(())
    }

    async fn deactivate(&self, payment_method_id: i64) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        if let Some(method) = state.methods.iter_mut().find(|m| m.id == payment_method_id) {
            method.is_active = false;
            method.is_default = false;
            method.updated_at = Utc::now();
        }
        Ok(())
    }
}
