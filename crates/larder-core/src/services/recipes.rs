//! Recipe service.
//!
//! Handles ingestion of recipes from URLs (LLM extraction plus embedding),
//! retrieval, and semantic search over stored embeddings.

use larder_embeddings::EmbeddingService;
use larder_llm::{ChatMessage, LlmService};
use tracing::{debug, info, warn};
use url::Url;
use uuid::Uuid;

use crate::config::RecipeConfig;
use crate::db::{self, CreateRecipe, DbPool, User};
use crate::error::{Error, Result};
use crate::models::{Recipe, RecipeDraft};
use crate::slug::recipe_slug;

/// Instructions for turning a recipe page into JSON.
const EXTRACTION_PROMPT: &str = r#"You will be given a link to a recipe. Visit the page and extract the recipe. Return it as JSON matching this schema:
{
  "title": string,
  "description": string,
  "cuisine": string,
  "cookTime": string,
  "ingredients": string[],
  "method": string[],
  "nutritionalInfo": string,
  "prepTime": string,
  "tags": string[]
}

If the page does not contain a recipe, return null. Otherwise always return valid JSON. Provide at most 3 tags and keep the description to at most 100 characters."#;

/// Service for recipe ingestion and retrieval.
#[derive(Clone)]
pub struct RecipeService {
    db: DbPool,
    llm: LlmService,
    embeddings: EmbeddingService,
    config: RecipeConfig,
}

impl RecipeService {
    /// Create a new recipe service.
    pub fn new(
        db: DbPool,
        llm: LlmService,
        embeddings: EmbeddingService,
        config: RecipeConfig,
    ) -> Self {
        Self {
            db,
            llm,
            embeddings,
            config,
        }
    }

    /// List every recipe.
    pub async fn list(&self) -> Result<Vec<Recipe>> {
        db::list_recipes(&self.db).await
    }

    /// Get a recipe by ID.
    pub async fn get(&self, id: &str) -> Result<Option<Recipe>> {
        db::get_recipe(&self.db, id).await
    }

    /// Get a recipe by slug. An empty slug matches nothing.
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Recipe>> {
        if slug.is_empty() {
            return Ok(None);
        }
        db::get_recipe_by_slug(&self.db, slug).await
    }

    /// Semantic search over stored recipes, best match first.
    pub async fn search(&self, query: &str) -> Result<Vec<Recipe>> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        let vector = self.embeddings.embed(query).await?;
        let hits = db::nearest_recipes(&self.db, &vector, self.config.search_limit).await?;

        debug!(query = %query, hits = hits.len(), "Vector search complete");

        let mut recipes = Vec::with_capacity(hits.len());
        for (id, score) in hits {
            match db::get_recipe(&self.db, &id).await? {
                Some(recipe) => recipes.push(recipe),
                None => warn!(id = %id, score, "Search hit no longer resolves"),
            }
        }

        Ok(recipes)
    }

    /// Add a recipe from a URL to the caller's collection.
    ///
    /// A URL that was added before links the existing recipe. Otherwise the
    /// recipe is extracted by the LLM, embedded, stored and linked.
    pub async fn add_by_url(&self, user: Option<&User>, url: &str) -> Result<Recipe> {
        let user = user.ok_or(Error::Unauthenticated)?;
        let source = Url::parse(url)?.to_string();

        if let Some(existing) = db::get_recipe_by_source(&self.db, &source).await? {
            self.link(user, &existing).await?;
            info!(id = %existing.id, source = %source, "Linked existing recipe");
            return Ok(existing);
        }

        let reply = self
            .llm
            .chat(&[ChatMessage::system(EXTRACTION_PROMPT), ChatMessage::user(url)])
            .await?;
        let draft = parse_extraction(&reply)?;

        let embedding = self.embeddings.embed(&draft.embedding_text()).await?;

        let recipe = db::create_recipe(
            &self.db,
            CreateRecipe {
                id: Uuid::new_v4().to_string(),
                slug: recipe_slug(&draft.title, self.config.slug_max_length),
                source,
                user_id: user.id.clone(),
                draft,
                embedding,
            },
        )
        .await?;

        self.link(user, &recipe).await?;

        info!(id = %recipe.id, slug = %recipe.slug, source = %recipe.source, "Created recipe");

        Ok(recipe)
    }

    async fn link(&self, user: &User, recipe: &Recipe) -> Result<()> {
        db::create_collection_entry(&self.db, &Uuid::new_v4().to_string(), &user.id, &recipe.id)
            .await?;
        Ok(())
    }
}

/// Parse the extraction reply into a recipe draft.
///
/// A surrounding Markdown code fence is ignored. An empty reply or a literal
/// `null` means the page held no recipe.
pub fn parse_extraction(reply: &str) -> Result<RecipeDraft> {
    let body = strip_code_fence(reply.trim());

    if body.is_empty() || body == "null" {
        return Err(Error::Extraction("No recipe found".to_string()));
    }

    let value: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| Error::Extraction(format!("Invalid JSON: {}", e)))?;

    if value.is_null() {
        return Err(Error::Extraction("No recipe found".to_string()));
    }

    serde_json::from_value(value)
        .map_err(|e| Error::Extraction(format!("Recipe does not match schema: {}", e)))
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop the info string (e.g. "json") on the opening line
    let rest = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    rest.trim_end().trim_end_matches("```").trim()
}
