//! Authentication middleware for the `/api` surface.
//!
//! Verifies the bearer token with the identity provider, upserts the local
//! user row and its identity links, and injects [`CurrentUser`] into the
//! request extensions. Handlers receive the caller explicitly through the
//! extractor; nothing reads authentication from ambient state.

use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::adapters::http::error::ErrorResponse;
use crate::adapters::http::AppState;
use crate::domain::billing::{User, UserProfile};
use crate::domain::foundation::DomainError;
use crate::ports::{AuthError, VerifiedIdentity};

/// The authenticated caller, resolved to a local user row.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Validates the bearer token and injects [`CurrentUser`].
///
/// Requests without an `Authorization` header pass through untouched; the
/// [`CurrentUser`] extractor rejects them at the handler. An invalid token
/// is rejected here with 401.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "));

    let Some(token) = token else {
        return next.run(request).await;
    };

    let identity = match state.identity_provider.verify(token).await {
        Ok(identity) => identity,
        Err(err) => return auth_error_response(err),
    };

    match sync_user(&state, &identity).await {
        Ok(user) => {
            request.extensions_mut().insert(CurrentUser(user));
            next.run(request).await
        }
        Err(err) => {
            tracing::error!(error = %err, "Failed to sync authenticated user");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("INTERNAL_ERROR", "Internal server error")),
            )
                .into_response()
        }
    }
}

/// Creates or refreshes the local user for a verified identity, and upserts
/// one identity-link row per linked external account.
async fn sync_user(state: &AppState, identity: &VerifiedIdentity) -> Result<User, DomainError> {
    let profile = UserProfile {
        clerk_user_id: identity.subject.clone(),
        name: identity.name.clone(),
        email: identity.email.clone(),
        avatar_url: identity.avatar_url.clone(),
    };

    let user = match state.users.find_by_clerk_user_id(&identity.subject).await? {
        Some(mut user) => {
            user.refresh_from(&profile, chrono::Utc::now());
            state.users.update(&user).await?;
            user
        }
        None => {
            let user = state.users.create(&profile).await?;
            tracing::info!(user_id = user.id, "Created user from verified identity");
            user
        }
    };

    for account in &identity.external_accounts {
        state
            .users
            .upsert_identity(
                user.id,
                &account.provider,
                &account.id,
                account.email.as_deref(),
            )
            .await?;
    }

    Ok(user)
}

fn auth_error_response(err: AuthError) -> Response {
    let message = match &err {
        AuthError::MissingCredentials => "Missing bearer token",
        AuthError::MalformedToken => "Malformed bearer token",
        AuthError::Unverified(_) => "Unverified identity",
        AuthError::Transport(msg) => {
            tracing::error!("Identity provider unavailable: {}", msg);
            "Authentication failed"
        }
    };
    (
        StatusCode::UNAUTHORIZED,
        Json(ErrorResponse::new("UNAUTHORIZED", message)),
    )
        .into_response()
}

/// Rejection for requests that reached a protected handler unauthenticated.
#[derive(Debug, Clone)]
pub struct AuthenticationRequired;

impl IntoResponse for AuthenticationRequired {
    fn into_response(self) -> Response {
        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse::new("UNAUTHORIZED", "Authentication required")),
        )
            .into_response()
    }
}

impl<S> axum::extract::FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AuthenticationRequired;

    fn from_request_parts<'life0, 'life1, 'async_trait>(
        parts: &'life0 mut axum::http::request::Parts,
        _state: &'life1 S,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self, Self::Rejection>> + Send + 'async_trait>,
    >
    where
        'life0: 'async_trait,
        'life1: 'async_trait,
        Self: 'async_trait,
    {
        Box::pin(async move {
            parts
                .extensions
                .get::<CurrentUser>()
                .cloned()
                .ok_or(AuthenticationRequired)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::extract::FromRequestParts;
    use axum::http::Request;
    use chrono::Utc;

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

    #[tokio::test]
    async fn extractor_reads_current_user_from_extensions() {
        let mut request: Request<()> = Request::builder().uri("/test").body(()).unwrap();
        request.extensions_mut().insert(CurrentUser(test_user()));
        let (mut parts, _) = request.into_parts();

        let CurrentUser(user) = CurrentUser::from_request_parts(&mut parts, &())
            .await
            .unwrap();

        assert_eq!(user.clerk_user_id, "user_abc");
    }

    #[tokio::test]
    async fn extractor_rejects_unauthenticated_request() {
        let request: Request<()> = Request::builder().uri("/test").body(()).unwrap();
        let (mut parts, _) = request.into_parts();

        let result = CurrentUser::from_request_parts(&mut parts, &()).await;

        assert!(result.is_err());
    }

    #[test]
    fn rejection_is_401() {
        let response = AuthenticationRequired.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
