//! Authentication configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use super::error::ValidationError;

/// Authentication configuration (Clerk)
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Clerk secret key (`sk_test_xxx` or `sk_live_xxx`)
    pub clerk_secret_key: Secret<String>,

    /// Clerk API base URL
    #[serde(default = "default_clerk_api_url")]
    pub clerk_api_url: String,
}

impl AuthConfig {
    /// Validate authentication configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        let key = self.clerk_secret_key.expose_secret();
        if key.is_empty() {
            return Err(ValidationError::MissingRequired("CLERK_SECRET_KEY"));
        }
        if !key.starts_with("sk_") {
            return Err(ValidationError::InvalidClerkSecretKey);
        }
        Ok(())
    }
}

fn default_clerk_api_url() -> String {
    "https://api.clerk.com".to_string()
}
