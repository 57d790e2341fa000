//! Mock identity provider for tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::ports::{AuthError, IdentityProvider, VerifiedIdentity};

/// Identity provider backed by a token table. Unknown tokens are rejected.
#[derive(Default)]
pub struct MockIdentityProvider {
    identities: Mutex<HashMap<String, VerifiedIdentity>>,
}

impl MockIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token that verifies to the given identity.
    pub fn register(&self, token: impl Into<String>, identity: VerifiedIdentity) {
        self.identities
            .lock()
            .expect("mock identity table poisoned")
            .insert(token.into(), identity);
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn verify(&self, bearer_token: &str) -> Result<VerifiedIdentity, AuthError> {
        if bearer_token.is_empty() {
            return Err(AuthError::MissingCredentials);
        }
        self.identities
            .lock()
            .expect("mock identity table poisoned")
            .get(bearer_token)
            .cloned()
            .ok_or_else(|| AuthError::Unverified("Unknown test token".to_string()))
    }
}
