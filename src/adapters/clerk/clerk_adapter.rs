//! Clerk identity provider adapter.
//!
//! Verification is two-step: the bearer JWT's payload is decoded (without
//! local signature verification) only to read the `sub` claim, then the
//! subject is confirmed against the Clerk users API with the secret key.
//! The API call is what authenticates the caller; a forged token names a
//! subject Clerk will not return.

use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

use crate::config::AuthConfig;
use crate::ports::{AuthError, ExternalAccount, IdentityProvider, VerifiedIdentity};

/// Request timeout for Clerk API calls.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Clerk API client.
pub struct ClerkAdapter {
    secret_key: Secret<String>,
    api_url: String,
    http_client: reqwest::Client,
}

/// Subset of Clerk's user object this system reads.
#[derive(Debug, Deserialize)]
struct ClerkUser {
    id: String,
    #[serde(default)]
    first_name: Option<String>,
    #[serde(default)]
    last_name: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
    #[serde(default)]
    primary_email_address_id: Option<String>,
    #[serde(default)]
    email_addresses: Vec<ClerkEmailAddress>,
    #[serde(default)]
    external_accounts: Vec<ClerkExternalAccount>,
}

#[derive(Debug, Deserialize)]
struct ClerkEmailAddress {
    id: String,
    email_address: String,
}

#[derive(Debug, Deserialize)]
struct ClerkExternalAccount {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    provider: Option<String>,
    #[serde(default)]
    email_address: Option<String>,
}

impl ClerkAdapter {
    pub fn new(config: &AuthConfig) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .expect("reqwest client construction only fails on invalid TLS config");

        Self {
            secret_key: config.clerk_secret_key.clone(),
            api_url: config.clerk_api_url.trim_end_matches('/').to_string(),
            http_client,
        }
    }

    /// Reads the `sub` claim from the JWT payload segment.
    fn subject_from_token(token: &str) -> Result<String, AuthError> {
        let mut parts = token.split('.');
        let payload_segment = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(payload), Some(_), None) => payload,
            _ => return Err(AuthError::MalformedToken),
        };

        let payload_bytes = URL_SAFE_NO_PAD
            .decode(payload_segment)
            .map_err(|_| AuthError::MalformedToken)?;
        let payload: serde_json::Value =
            serde_json::from_slice(&payload_bytes).map_err(|_| AuthError::MalformedToken)?;

        payload
            .get("sub")
            .and_then(serde_json::Value::as_str)
            .map(str::to_string)
            .ok_or(AuthError::MalformedToken)
    }

    fn identity_from_user(user: ClerkUser) -> VerifiedIdentity {
        let email = user
            .primary_email_address_id
            .as_deref()
            .and_then(|primary_id| {
                user.email_addresses
                    .iter()
                    .find(|e| e.id == primary_id)
                    .map(|e| e.email_address.clone())
            });

        let name = [user.first_name.as_deref(), user.last_name.as_deref()]
            .iter()
            .flatten()
            .copied()
            .collect::<Vec<_>>()
            .join(" ")
            .trim()
            .to_string();

        let external_accounts = user
            .external_accounts
            .into_iter()
            .filter_map(|account| match (account.provider, account.id) {
                (Some(provider), Some(id)) => Some(ExternalAccount {
                    provider,
                    id,
                    email: account.email_address,
                }),
                _ => None,
            })
            .collect();

        VerifiedIdentity {
            subject: user.id,
            name,
            email,
            avatar_url: user.image_url,
            external_accounts,
        }
    }
}

#[async_trait]
impl IdentityProvider for ClerkAdapter {
    async fn verify(&self, bearer_token: &str) -> Result<VerifiedIdentity, AuthError> {
        if bearer_token.trim().is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        let subject = Self::subject_from_token(bearer_token)?;
        let url = format!("{}/v1/users/{}", self.api_url, subject);

        let response = self
            .http_client
            .get(&url)
            .bearer_auth(self.secret_key.expose_secret())
            .send()
            .await
            .map_err(|e| AuthError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(AuthError::Unverified(format!(
                "Clerk rejected subject {} ({})",
                subject,
                response.status().as_u16()
            )));
        }

        let user: ClerkUser = response
            .json()
            .await
            .map_err(|e| AuthError::Transport(format!("Invalid Clerk response: {}", e)))?;

        Ok(Self::identity_from_user(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn token_with_payload(payload: &serde_json::Value) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(payload.to_string().as_bytes());
        format!("{}.{}.signature", header, body)
    }

    #[test]
    fn extracts_subject_from_well_formed_token() {
        let token = token_with_payload(&json!({"sub": "user_123", "exp": 9999999999i64}));

        let subject = ClerkAdapter::subject_from_token(&token).unwrap();

        assert_eq!(subject, "user_123");
    }

    #[test]
    fn rejects_token_without_three_segments() {
        let result = ClerkAdapter::subject_from_token("only.two");

        assert!(matches!(result, Err(AuthError::MalformedToken)));
    }

    #[test]
    fn rejects_token_without_sub_claim() {
        let token = token_with_payload(&json!({"exp": 9999999999i64}));

        let result = ClerkAdapter::subject_from_token(&token);

        assert!(matches!(result, Err(AuthError::MalformedToken)));
    }

    #[test]
    fn rejects_non_base64_payload() {
        let result = ClerkAdapter::subject_from_token("a.!!!not-base64!!!.c");

        assert!(matches!(result, Err(AuthError::MalformedToken)));
    }

    #[test]
    fn identity_uses_primary_email_and_joins_name() {
        let user = ClerkUser {
            id: "user_123".to_string(),
            first_name: Some("Ada".to_string()),
            last_name: Some("Lovelace".to_string()),
            image_url: Some("https://img.clerk.com/a.png".to_string()),
            primary_email_address_id: Some("em_2".to_string()),
            email_addresses: vec![
                ClerkEmailAddress {
                    id: "em_1".to_string(),
                    email_address: "old@example.com".to_string(),
                },
                ClerkEmailAddress {
                    id: "em_2".to_string(),
                    email_address: "ada@example.com".to_string(),
                },
            ],
            external_accounts: vec![ClerkExternalAccount {
                id: Some("eac_1".to_string()),
                provider: Some("oauth_google".to_string()),
                email_address: Some("ada@gmail.example.com".to_string()),
            }],
        };

        let identity = ClerkAdapter::identity_from_user(user);

        assert_eq!(identity.subject, "user_123");
        assert_eq!(identity.name, "Ada Lovelace");
        assert_eq!(identity.email.as_deref(), Some("ada@example.com"));
        assert_eq!(identity.external_accounts.len(), 1);
        assert_eq!(identity.external_accounts[0].provider, "oauth_google");
    }

    #[test]
    fn identity_skips_external_accounts_missing_provider_or_id() {
        let user = ClerkUser {
            id: "user_123".to_string(),
            first_name: None,
            last_name: None,
            image_url: None,
            primary_email_address_id: None,
            email_addresses: vec![],
            external_accounts: vec![
                ClerkExternalAccount {
                    id: None,
                    provider: Some("oauth_google".to_string()),
                    email_address: None,
                },
                ClerkExternalAccount {
                    id: Some("eac_2".to_string()),
                    provider: None,
                    email_address: None,
                },
            ],
        };

        let identity = ClerkAdapter::identity_from_user(user);

        assert!(identity.external_accounts.is_empty());
        assert_eq!(identity.name, "");
    }
}
