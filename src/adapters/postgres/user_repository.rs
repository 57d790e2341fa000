//! PostgreSQL implementation of UserRepository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::domain::billing::{User, UserProfile};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::UserRepository;

/// PostgreSQL implementation of the UserRepository port.
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i64,
    clerk_user_id: String,
    name: String,
    email: Option<String>,
    avatar_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            clerk_user_id: row.clerk_user_id,
            name: row.name,
            email: row.email,
            avatar_url: row.avatar_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_USER: &str = r#"
    SELECT id, clerk_user_id, name, email, avatar_url, created_at, updated_at
    FROM users
"#;

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: i64) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(&format!("{} WHERE id = $1", SELECT_USER))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Failed to find user: {}", e))
            })?;

        Ok(row.map(User::from))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> = sqlx::query_as(&format!("{} WHERE email = $1", SELECT_USER))
            .bind(email)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                DomainError::new(ErrorCode::DatabaseError, format!("Failed to find user: {}", e))
            })?;

        Ok(row.map(User::from))
    }

    async fn find_by_clerk_user_id(
        &self,
        clerk_user_id: &str,
    ) -> Result<Option<User>, DomainError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("{} WHERE clerk_user_id = $1", SELECT_USER))
                .bind(clerk_user_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    DomainError::new(
                        ErrorCode::DatabaseError,
                        format!("Failed to find user: {}", e),
                    )
                })?;

        Ok(row.map(User::from))
    }

    async fn create(&self, profile: &UserProfile) -> Result<User, DomainError> {
        let name = if profile.name.trim().is_empty() {
            "User"
        } else {
            profile.name.as_str()
        };

        let row: UserRow = sqlx::query_as(
            r#"
            INSERT INTO users (clerk_user_id, name, email, avatar_url, created_at, updated_at)
            VALUES ($1, $2, $3, $4, NOW(), NOW())
            RETURNING id, clerk_user_id, name, email, avatar_url, created_at, updated_at
            "#,
        )
        .bind(&profile.clerk_user_id)
        .bind(name)
        .bind(&profile.email)
        .bind(&profile.avatar_url)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to create user: {}", e))
        })?;

        Ok(User::from(row))
    }

    async fn update(&self, user: &User) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                name = $2,
                email = $3,
                avatar_url = $4,
                updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.avatar_url)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to update user: {}", e))
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::new(ErrorCode::UserNotFound, "User not found"));
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
        // Existing links stay untouched; provider_uid is the natural key.
        sqlx::query(
            r#"
            INSERT INTO user_identities (user_id, provider, provider_uid, email)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (provider_uid) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(provider)
        .bind(provider_uid)
        .bind(email)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Failed to upsert identity: {}", e),
            )
        })?;

        Ok(())
    }
}
