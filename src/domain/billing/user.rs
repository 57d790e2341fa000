//! User entity - local identity anchor.
//!
//! Users are created and refreshed by the authentication middleware from the
//! identity provider's verified profile; this subsystem never deletes them.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A local user, keyed by the identity provider's subject id.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    /// Clerk subject id (`user_xxx`), unique.
    pub clerk_user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Verified profile data used to create or refresh a [`User`].
#[derive(Debug, Clone)]
pub struct UserProfile {
    pub clerk_user_id: String,
    pub name: String,
    pub email: Option<String>,
    pub avatar_url: Option<String>,
}

impl User {
    /// Refreshes mutable profile fields from a newly verified identity.
    ///
    /// Blank incoming values never clobber existing data: a user who removed
    /// their name upstream keeps the last known one locally.
    pub fn refresh_from(&mut self, profile: &UserProfile, now: DateTime<Utc>) {
        if !profile.name.trim().is_empty() {
            self.name = profile.name.clone();
        }
        if profile.email.is_some() {
            self.email = profile.email.clone();
        }
        self.avatar_url = profile.avatar_url.clone();
        self.updated_at = now;
    }
}

/// A linked external account (social login) reported by the identity provider.
#[derive(Debug, Clone, Serialize)]
pub struct UserIdentity {
    pub id: i64,
    pub user_id: i64,
    pub provider: String,
    /// The external account's unique id; the upsert key.
    pub provider_uid: String,
    pub email: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_user() -> User {
        User {
            id: 1,
            clerk_user_id: "user_abc".to_string(),
            name: "Ada".to_string(),
            email: Some("ada@example.com".to_string()),
            avatar_url: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn refresh_updates_profile_fields() {
        let mut user = test_user();
        let profile = UserProfile {
            clerk_user_id: "user_abc".to_string(),
            name: "Ada Lovelace".to_string(),
            email: Some("ada@new.example.com".to_string()),
            avatar_url: Some("https://img.example.com/a.png".to_string()),
        };

        user.refresh_from(&profile, Utc::now());

        assert_eq!(user.name, "Ada Lovelace");
        assert_eq!(user.email.as_deref(), Some("ada@new.example.com"));
        assert_eq!(user.avatar_url.as_deref(), Some("https://img.example.com/a.png"));
    }

    #[test]
    fn refresh_keeps_existing_name_when_incoming_blank() {
        let mut user = test_user();
        let profile = UserProfile {
            clerk_user_id: "user_abc".to_string(),
            name: "  ".to_string(),
            email: None,
            avatar_url: None,
        };

        user.refresh_from(&profile, Utc::now());

        assert_eq!(user.name, "Ada");
        assert_eq!(user.email.as_deref(), Some("ada@example.com"));
    }
}
