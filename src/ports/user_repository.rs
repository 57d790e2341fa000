//! Port for user persistence.

use async_trait::async_trait;

use crate::domain::billing::{User, UserProfile};
use crate::domain::foundation::DomainError;

/// Repository for [`User`] rows and their linked external identities.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DomainError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError>;

    async fn find_by_clerk_user_id(&self, clerk_user_id: &str)
        -> Result<Option<User>, DomainError>;

    /// Creates a user from a verified identity profile.
    async fn create(&self, profile: &UserProfile) -> Result<User, DomainError>;

    /// Persists refreshed profile fields.
    async fn update(&self, user: &User) -> Result<(), DomainError>;

    /// Upserts one identity-link row keyed on the external account's
    /// unique id. Existing rows are left untouched.
    async fn upsert_identity(
        &self,
        user_id: i64,
        provider: &str,
        provider_uid: &str,
        email: Option<&str>,
    ) -> Result<(), DomainError>;
}
