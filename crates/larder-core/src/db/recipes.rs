//! Recipe database queries.
//!
//! List columns are stored as JSON text and the embedding as a BLOB; both
//! are decoded into [`Recipe`] on the way out.

use crate::models::{Recipe, RecipeDraft};
use crate::{Error, Result};
use sqlx::FromRow;

use super::vector::{blob_to_vec, rank, vec_to_blob};
use super::DbPool;

/// Raw recipe row.
#[derive(Debug, FromRow)]
struct RecipeRow {
    id: String,
    title: String,
    description: String,
    cuisine: String,
    slug: String,
    prep_time: String,
    cook_time: String,
    ingredients: String,
    method: String,
    nutritional_info: String,
    tags: String,
    source: String,
    user_id: String,
    embedding: Vec<u8>,
    created_at: String,
}

impl TryFrom<RecipeRow> for Recipe {
    type Error = Error;

    fn try_from(row: RecipeRow) -> Result<Self> {
        let list = |column: &str, raw: &str| -> Result<Vec<String>> {
            serde_json::from_str(raw).map_err(|e| {
                Error::Internal(format!("Corrupt {} on recipe {}: {}", column, row.id, e))
            })
        };

        Ok(Recipe {
            ingredients: list("ingredients", &row.ingredients)?,
            method: list("method", &row.method)?,
            tags: list("tags", &row.tags)?,
            embedding: blob_to_vec(&row.embedding),
            id: row.id,
            title: row.title,
            description: row.description,
            cuisine: row.cuisine,
            slug: row.slug,
            prep_time: row.prep_time,
            cook_time: row.cook_time,
            nutritional_info: row.nutritional_info,
            source: row.source,
            user_id: row.user_id,
            created_at: row.created_at,
        })
    }
}

/// Input for creating a recipe.
#[derive(Debug, Clone)]
pub struct CreateRecipe {
    pub id: String,
    pub slug: String,
    pub source: String,
    pub user_id: String,
    pub draft: RecipeDraft,
    pub embedding: Vec<f32>,
}

fn to_json(values: &[String]) -> Result<String> {
    serde_json::to_string(values).map_err(|e| Error::Internal(e.to_string()))
}

/// Create a new recipe.
pub async fn create_recipe(pool: &DbPool, input: CreateRecipe) -> Result<Recipe> {
    let draft = &input.draft;

    let row = sqlx::query_as::<_, RecipeRow>(
        r#"
        INSERT INTO recipes (
            id, title, description, cuisine, slug, prep_time, cook_time,
            ingredients, method, nutritional_info, tags, source, user_id,
            embedding, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING *
        "#,
    )
    .bind(&input.id)
    .bind(&draft.title)
    .bind(&draft.description)
    .bind(&draft.cuisine)
    .bind(&input.slug)
    .bind(&draft.prep_time)
    .bind(&draft.cook_time)
    .bind(to_json(&draft.ingredients)?)
    .bind(to_json(&draft.method)?)
    .bind(&draft.nutritional_info)
    .bind(to_json(&draft.tags)?)
    .bind(&input.source)
    .bind(&input.user_id)
    .bind(vec_to_blob(&input.embedding))
    .bind(chrono::Utc::now().to_rfc3339())
    .fetch_one(pool)
    .await?;

    row.try_into()
}

/// Get a recipe by ID.
pub async fn get_recipe(pool: &DbPool, id: &str) -> Result<Option<Recipe>> {
    sqlx::query_as::<_, RecipeRow>("SELECT * FROM recipes WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await?
        .map(Recipe::try_from)
        .transpose()
}

/// Get the first recipe with a slug.
/// Uses idx_recipes_slug index.
pub async fn get_recipe_by_slug(pool: &DbPool, slug: &str) -> Result<Option<Recipe>> {
    sqlx::query_as::<_, RecipeRow>(
        r#"
        SELECT * FROM recipes
        WHERE slug = ?
        ORDER BY created_at, rowid
        LIMIT 1
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await?
    .map(Recipe::try_from)
    .transpose()
}

/// Get the first recipe extracted from a source URL.
/// Uses idx_recipes_source index.
pub async fn get_recipe_by_source(pool: &DbPool, source: &str) -> Result<Option<Recipe>> {
    sqlx::query_as::<_, RecipeRow>(
        r#"
        SELECT * FROM recipes
        WHERE source = ?
        ORDER BY created_at, rowid
        LIMIT 1
        "#,
    )
    .bind(source)
    .fetch_optional(pool)
    .await?
    .map(Recipe::try_from)
    .transpose()
}

/// List all recipes, oldest first.
pub async fn list_recipes(pool: &DbPool) -> Result<Vec<Recipe>> {
    sqlx::query_as::<_, RecipeRow>("SELECT * FROM recipes ORDER BY created_at, rowid")
        .fetch_all(pool)
        .await?
        .into_iter()
        .map(Recipe::try_from)
        .collect()
}

/// Nearest stored embeddings to `vector`, best first.
///
/// Returns `(recipe_id, cosine score)` pairs, at most `limit` of them.
pub async fn nearest_recipes(
    pool: &DbPool,
    vector: &[f32],
    limit: usize,
) -> Result<Vec<(String, f32)>> {
    let rows: Vec<(String, Vec<u8>)> = sqlx::query_as("SELECT id, embedding FROM recipes")
        .fetch_all(pool)
        .await?;

    let candidates = rows
        .into_iter()
        .map(|(id, blob)| (id, blob_to_vec(&blob)));

    Ok(rank(vector, candidates, limit))
}
