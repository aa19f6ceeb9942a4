//! Ask-the-chef: questions about a recipe answered by the LLM.
//!
//! Stateless. Callers send the whole conversation every time.

use larder_llm::{ChatMessage, LlmService};
use tracing::debug;

use crate::db::{self, DbPool};
use crate::error::{Error, Result};
use crate::models::Recipe;

/// Service for recipe Q&A.
#[derive(Clone)]
pub struct ChefService {
    db: DbPool,
    llm: LlmService,
}

impl ChefService {
    /// Create a new chef service.
    pub fn new(db: DbPool, llm: LlmService) -> Self {
        Self { db, llm }
    }

    /// Answer the latest turn of `history` in the context of a recipe.
    ///
    /// Returns the model's reply verbatim.
    pub async fn ask(&self, recipe_id: &str, history: &[ChatMessage]) -> Result<String> {
        let recipe = db::get_recipe(&self.db, recipe_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Recipe {}", recipe_id)))?;

        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(ChatMessage::system(recipe_context(&recipe)));
        messages.extend_from_slice(history);

        debug!(recipe_id = %recipe.id, turns = history.len(), "Asking the chef");

        Ok(self.llm.chat(&messages).await?)
    }
}

/// System message describing a recipe.
pub fn recipe_context(recipe: &Recipe) -> String {
    format!(
        "Here is a recipe for {} with description {}\nIngredients:\n{}\nMethod:\n{}\nThe original recipe can be found at {}",
        recipe.title,
        recipe.description,
        recipe.ingredients.join("\n"),
        recipe.method.join("\n"),
        recipe.source,
    )
}
