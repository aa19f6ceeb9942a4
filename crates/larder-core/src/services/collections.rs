//! Collection service.
//!
//! A collection is the set of recipes a user has saved. Anonymous callers
//! have an empty collection; only adding requires a user.

use tracing::{debug, info};
use uuid::Uuid;

use crate::db::{self, CollectionEntry, DbPool, User};
use crate::error::{Error, Result};
use crate::models::Recipe;

/// Service for managing saved recipes.
#[derive(Clone)]
pub struct CollectionService {
    db: DbPool,
}

impl CollectionService {
    /// Create a new collection service.
    pub fn new(db: DbPool) -> Self {
        Self { db }
    }

    /// Save a recipe to the user's collection.
    ///
    /// Saving the same recipe twice creates a second entry.
    pub async fn add(&self, user: Option<&User>, recipe_id: &str) -> Result<CollectionEntry> {
        let user = user.ok_or(Error::Unauthenticated)?;

        if db::get_recipe(&self.db, recipe_id).await?.is_none() {
            return Err(Error::NotFound(format!("Recipe {}", recipe_id)));
        }

        let entry =
            db::create_collection_entry(&self.db, &Uuid::new_v4().to_string(), &user.id, recipe_id)
                .await?;

        info!(user_id = %user.id, recipe_id = %recipe_id, "Added recipe to collection");

        Ok(entry)
    }

    /// Remove the oldest entry for a recipe, returning its ID.
    ///
    /// No-op for anonymous callers and recipes that are not saved.
    pub async fn remove(&self, user: Option<&User>, recipe_id: &str) -> Result<Option<String>> {
        let Some(user) = user else {
            return Ok(None);
        };

        let Some(entry) = db::find_collection_entry(&self.db, &user.id, recipe_id).await? else {
            debug!(user_id = %user.id, recipe_id = %recipe_id, "Nothing to remove");
            return Ok(None);
        };

        db::delete_collection_entry(&self.db, &entry.id).await?;

        info!(user_id = %user.id, recipe_id = %recipe_id, "Removed recipe from collection");

        Ok(Some(entry.id))
    }

    /// Whether the user has saved a recipe.
    pub async fn is_in_collection(&self, user: Option<&User>, recipe_id: &str) -> Result<bool> {
        let Some(user) = user else {
            return Ok(false);
        };

        let entries = db::list_collection_entries(&self.db, &user.id).await?;
        Ok(entries.iter().any(|e| e.recipe_id == recipe_id))
    }

    /// The user's saved recipes, oldest first.
    ///
    /// Entries whose recipe no longer exists are skipped.
    pub async fn list(&self, user: Option<&User>) -> Result<Vec<Recipe>> {
        let Some(user) = user else {
            return Ok(Vec::new());
        };

        let entries = db::list_collection_entries(&self.db, &user.id).await?;

        let lookups = entries
            .iter()
            .map(|entry| db::get_recipe(&self.db, &entry.recipe_id));
        let recipes = futures::future::try_join_all(lookups).await?;

        Ok(recipes.into_iter().flatten().collect())
    }
}
