//! Collection (user ↔ recipe link) database queries.
//!
//! Links are not unique per (user, recipe); lookups return the oldest match.

use crate::Result;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::DbPool;

/// A saved-recipe link.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct CollectionEntry {
    pub id: String,
    pub user_id: String,
    pub recipe_id: String,
    pub created_at: String,
}

/// Insert a link. Duplicates are allowed.
pub async fn create_collection_entry(
    pool: &DbPool,
    id: &str,
    user_id: &str,
    recipe_id: &str,
) -> Result<CollectionEntry> {
    let entry = sqlx::query_as::<_, CollectionEntry>(
        r#"
        INSERT INTO user_recipes (id, user_id, recipe_id, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(recipe_id)
    .bind(chrono::Utc::now().to_rfc3339())
    .fetch_one(pool)
    .await?;

    Ok(entry)
}

/// All of a user's links, oldest first.
/// Uses idx_user_recipes_user index.
pub async fn list_collection_entries(pool: &DbPool, user_id: &str) -> Result<Vec<CollectionEntry>> {
    let entries = sqlx::query_as::<_, CollectionEntry>(
        r#"
        SELECT * FROM user_recipes
        WHERE user_id = ?
        ORDER BY created_at, rowid
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(entries)
}

/// The oldest link for (user, recipe), if any.
pub async fn find_collection_entry(
    pool: &DbPool,
    user_id: &str,
    recipe_id: &str,
) -> Result<Option<CollectionEntry>> {
    let entry = sqlx::query_as::<_, CollectionEntry>(
        r#"
        SELECT * FROM user_recipes
        WHERE user_id = ? AND recipe_id = ?
        ORDER BY created_at, rowid
        LIMIT 1
        "#,
    )
    .bind(user_id)
    .bind(recipe_id)
    .fetch_optional(pool)
    .await?;

    Ok(entry)
}

/// Delete a single link by ID.
pub async fn delete_collection_entry(pool: &DbPool, id: &str) -> Result<()> {
    sqlx::query("DELETE FROM user_recipes WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}
