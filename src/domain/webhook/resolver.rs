//! User resolution for webhook events.
//!
//! Webhook payloads identify the customer in several inconsistent ways, so
//! resolution is an ordered list of strategies tried until one produces a
//! local user. Which strategies apply depends on the event: metadata carries
//! our own `user_id` when we created the checkout session, the Whop member
//! id links back through previously stored payment methods, and the
//! subscription-creation path falls back to the account email.

use std::sync::Arc;

use serde_json::{Map, Value};

use crate::domain::billing::User;
use crate::domain::foundation::DomainError;
use crate::domain::webhook::metadata::extract_user_id;
use crate::ports::{PaymentMethodRepository, UserRepository};

/// Resolves webhook payloads to local users.
pub struct UserResolver {
    users: Arc<dyn UserRepository>,
    payment_methods: Arc<dyn PaymentMethodRepository>,
}

impl UserResolver {
    pub fn new(
        users: Arc<dyn UserRepository>,
        payment_methods: Arc<dyn PaymentMethodRepository>,
    ) -> Self {
        Self {
            users,
            payment_methods,
        }
    }

    /// Resolves a user id from metadata, falling back to the Whop member id
    /// through previously stored payment methods.
    ///
    /// Used by membership events, where the user may already have an
    /// instrument on file from an earlier save-card flow.
    pub async fn resolve_user_id(
        &self,
        metadata: &Map<String, Value>,
        member_id: Option<&str>,
    ) -> Result<Option<i64>, DomainError> {
        if let Some(user_id) = extract_user_id(metadata) {
            return Ok(Some(user_id));
        }

        if let Some(member_id) = member_id {
            if let Some(existing) = self
                .payment_methods
                .find_by_provider_customer_id(member_id)
                .await?
            {
                return Ok(Some(existing.user_id));
            }
        }

        Ok(None)
    }

    /// Resolves and loads the user named by metadata.
    ///
    /// Unlike [`resolve_user_id`](Self::resolve_user_id), this confirms the
    /// row exists; a metadata id pointing at a deleted user is treated as
    /// unresolved.
    pub async fn resolve_user(
        &self,
        metadata: &Map<String, Value>,
    ) -> Result<Option<User>, DomainError> {
        match extract_user_id(metadata) {
            Some(user_id) => self.users.find_by_id(user_id).await,
            None => Ok(None),
        }
    }

    /// Resolves a user from metadata with an email fallback.
    ///
    /// Subscription-creation payments may carry no metadata at all when the
    /// checkout was initiated outside this system, but Whop reports the
    /// buyer's email.
    pub async fn resolve_user_or_email(
        &self,
        metadata: &Map<String, Value>,
        email: Option<&str>,
    ) -> Result<Option<User>, DomainError> {
        if let Some(user) = self.resolve_user(metadata).await? {
            return Ok(Some(user));
        }

        match email {
            Some(email) if !email.is_empty() => self.users.find_by_email(email).await,
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{InMemoryPaymentMethodRepository, InMemoryUserRepository};
    use crate::domain::billing::NewPaymentMethod;
    use crate::domain::billing::UserProfile;
    use serde_json::json;

    fn as_map(value: Value) -> Map<String, Value> {
        value.as_object().unwrap().clone()
    }

    fn resolver() -> (
        UserResolver,
        Arc<InMemoryUserRepository>,
        Arc<InMemoryPaymentMethodRepository>,
    ) {
        let users = Arc::new(InMemoryUserRepository::new());
        let payment_methods = Arc::new(InMemoryPaymentMethodRepository::new());
        let resolver = UserResolver::new(users.clone(), payment_methods.clone());
        (resolver, users, payment_methods)
    }

    fn profile(email: &str) -> UserProfile {
        UserProfile {
            clerk_user_id: format!("user_{}", email),
            name: "Test User".to_string(),
            email: Some(email.to_string()),
            avatar_url: None,
        }
    }

    fn stored_method(user_id: i64, member_id: &str) -> NewPaymentMethod {
        NewPaymentMethod {
            user_id,
            provider_customer_id: Some(member_id.to_string()),
            provider_payment_method_id: format!("payt_for_{}", member_id),
            payment_type: "card".to_string(),
            last_four_digits: None,
            brand: None,
            expires_at: None,
            is_default: true,
            metadata: json!({}),
        }
    }

    #[tokio::test]
    async fn metadata_user_id_wins() {
        let (resolver, users, _) = resolver();
        let user = users.create(&profile("a@example.com")).await.unwrap();
        let metadata = as_map(json!({"user_id": user.id.to_string()}));

        let resolved = resolver
            .resolve_user_id(&metadata, Some("mber_other"))
            .await
            .unwrap();

        assert_eq!(resolved, Some(user.id));
    }

    #[tokio::test]
    async fn falls_back_to_member_id_lookup() {
        let (resolver, users, payment_methods) = resolver();
        let user = users.create(&profile("b@example.com")).await.unwrap();
        payment_methods
            .insert(stored_method(user.id, "mber_123"))
            .await
            .unwrap();

        let resolved = resolver
            .resolve_user_id(&Map::new(), Some("mber_123"))
            .await
            .unwrap();

        assert_eq!(resolved, Some(user.id));
    }

    #[tokio::test]
    async fn unresolvable_event_yields_none() {
        let (resolver, _, _) = resolver();

        let resolved = resolver
            .resolve_user_id(&Map::new(), Some("mber_unknown"))
            .await
            .unwrap();

        assert_eq!(resolved, None);
    }

    #[tokio::test]
    async fn resolve_user_confirms_existence() {
        let (resolver, _, _) = resolver();
        let metadata = as_map(json!({"user_id": "999"}));

        let resolved = resolver.resolve_user(&metadata).await.unwrap();

        assert!(resolved.is_none());
    }

    #[tokio::test]
    async fn email_fallback_finds_user() {
        let (resolver, users, _) = resolver();
        let user = users.create(&profile("c@example.com")).await.unwrap();

        let resolved = resolver
            .resolve_user_or_email(&Map::new(), Some("c@example.com"))
            .await
            .unwrap();

        assert_eq!(resolved.map(|u| u.id), Some(user.id));
    }

    #[tokio::test]
    async fn metadata_beats_email_fallback() {
        let (resolver, users, _) = resolver();
        let by_id = users.create(&profile("d@example.com")).await.unwrap();
        users.create(&profile("e@example.com")).await.unwrap();
        let metadata = as_map(json!({"user_id": by_id.id}));

        let resolved = resolver
            .resolve_user_or_email(&metadata, Some("e@example.com"))
            .await
            .unwrap();

        assert_eq!(resolved.map(|u| u.id), Some(by_id.id));
    }

    #[tokio::test]
    async fn empty_email_is_not_a_fallback() {
        let (resolver, _, _) = resolver();

        let resolved = resolver
            .resolve_user_or_email(&Map::new(), Some(""))
            .await
            .unwrap();

        assert!(resolved.is_none());
    }
}
