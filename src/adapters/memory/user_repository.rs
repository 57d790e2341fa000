//! In-memory [`UserRepository`].

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::domain::billing::{User, UserIdentity, UserProfile};
use crate::domain::foundation::DomainError;
use crate::ports::UserRepository;

#[derive(Default)]
pub struct InMemoryUserRepository {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    users: Vec<User>,
    identities: Vec<UserIdentity>,
    next_user_id: i64,
    next_identity_id: i64,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the identity links, for assertions in tests.
    pub async fn identities(&self) -> Vec<UserIdentity> {
        self.state.read().await.identities.clone()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DomainError> {
        let state = self.state.read().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.email.as_deref() == Some(email))
            .cloned())
    }

    async fn find_by_clerk_user_id(
        &self,
        clerk_user_id: &str,
    ) -> Result<Option<User>, DomainError> {
        let state = self.state.read().await;
        Ok(state
            .users
            .iter()
            .find(|u| u.clerk_user_id == clerk_user_id)
            .cloned())
    }

    async fn create(&self, profile: &UserProfile) -> Result<User, DomainError> {
        let mut state = self.state.write().await;
        state.next_user_id += 1;
        let now = Utc::now();
        let user = User {
            id: state.next_user_id,
            clerk_user_id: profile.clerk_user_id.clone(),
            name: profile.name.clone(),
            email: profile.email.clone(),
            avatar_url: profile.avatar_url.clone(),
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn update(&self, user: &User) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        if let Some(existing) = state.users.iter_mut().find(|u| u.id == user.id) {
            *existing = user.clone();
        }
        Ok(())
    }

    async fn upsert_identity(
        &self,
        user_id: i64,
        provider: &str,
        provider_uid: &str,
        email: Option<&str>,
    ) -> Result<(), DomainError> {
        let mut state = self.state.write().await;
        let exists = state
            .identities
            .iter()
            .any(|i| i.user_id == user_id && i.provider_uid == provider_uid);
        if !exists {
            state.next_identity_id += 1;
            let identity = UserIdentity {
                id: state.next_identity_id,
                user_id,
                provider: provider.to_string(),
                provider_uid: provider_uid.to_string(),
                email: email.map(str::to_string),
            };
            state.identities.push(identity);
        }
        Ok(())
    }
}
