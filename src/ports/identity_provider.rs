//! Port for the external identity provider (Clerk).

use async_trait::async_trait;
use thiserror::Error;

/// Errors produced while verifying a bearer credential.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Missing bearer token")]
    MissingCredentials,

    #[error("Malformed bearer token")]
    MalformedToken,

    /// The provider rejected the credential or subject.
    #[error("Unverified identity: {0}")]
    Unverified(String),

    #[error("Identity provider transport error: {0}")]
    Transport(String),
}

/// A linked external account (social login) on the verified identity.
#[derive(Debug, Clone)]
pub struct ExternalAccount {
    pub provider: String,
    /// The account's unique id at the provider; upsert key for identity links.
    pub id: String,
    pub email: Option<String>,
}

/// The provider's verified view of who is calling.
#[derive(Debug, Clone)]
pub struct VerifiedIdentity {
    /// Subject id (`user_xxx`), the local upsert key.
    pub subject: String,
    pub name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub external_accounts: Vec<ExternalAccount>,
}

/// Verifies bearer tokens against the identity provider.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verifies the token and returns the caller's profile.
    async fn verify(&self, bearer_token: &str) -> Result<VerifiedIdentity, AuthError>;
}
