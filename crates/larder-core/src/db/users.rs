//! User database queries.
//!
//! Users are keyed by the identity provider's token identifier.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::DbPool;

/// User record from the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub token_identifier: String,
    pub created_at: String,
}

/// Input for creating a new user.
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub id: String,
    pub name: String,
    pub token_identifier: String,
}

/// Get a user by token identifier.
/// Uses idx_users_token index.
pub async fn get_user_by_token(pool: &DbPool, token_identifier: &str) -> Result<Option<User>> {
    sqlx::query_as::<_, User>(
        r#"
        SELECT * FROM users
        WHERE token_identifier = ?
        "#,
    )
    .bind(token_identifier)
    .fetch_optional(pool)
    .await
    .map_err(Error::Database)
}

/// Insert a user unless one already holds the token identifier, then
/// return whichever record owns it.
pub async fn get_or_create_user(pool: &DbPool, input: CreateUser) -> Result<User> {
    sqlx::query(
        r#"
        INSERT INTO users (id, name, token_identifier, created_at)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(token_identifier) DO NOTHING
        "#,
    )
    .bind(&input.id)
    .bind(&input.name)
    .bind(&input.token_identifier)
    .bind(chrono::Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    get_user_by_token(pool, &input.token_identifier)
        .await?
        .ok_or_else(|| {
            Error::Internal(format!(
                "User for {} vanished after insert",
                input.token_identifier
            ))
        })
}
