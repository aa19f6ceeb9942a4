//! Recipe Routes
//!
//! Routes:
//! - GET /recipes - List all recipes
//! - POST /recipes - Add a recipe by URL (requires a stored user)
//! - GET /recipes/by-slug/:slug - Get a recipe by slug, or null
//! - POST /recipes/search - Semantic search
//! - POST /recipes/:id/chef - Ask a question about a recipe

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use larder_llm::ChatMessage;
use serde::{Deserialize, Serialize};

use super::{resolve_user, ApiJson, Caller};
use crate::models::Recipe;
use crate::{AppState, Result};

/// Build recipe routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_recipes).post(add_recipe))
        .route("/by-slug/:slug", get(get_recipe_by_slug))
        .route("/search", post(search_recipes))
        .route("/:id/chef", post(ask_the_chef))
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Request to add a recipe from a web page.
#[derive(Debug, Deserialize)]
pub struct AddRecipeRequest {
    pub url: String,
}

/// Semantic search request.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: String,
}

/// Conversation so far, oldest message first.
#[derive(Debug, Deserialize)]
pub struct ChefRequest {
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Serialize)]
pub struct ChefResponse {
    pub reply: String,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /recipes
async fn list_recipes(State(state): State<AppState>) -> Result<Json<Vec<Recipe>>> {
    Ok(Json(state.recipes.list().await?))
}

/// POST /recipes
///
/// Links the existing recipe when the URL was added before.
async fn add_recipe(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(request): ApiJson<AddRecipeRequest>,
) -> Result<Json<Recipe>> {
    let user = resolve_user(&state, &caller).await?;
    let recipe = state.recipes.add_by_url(user.as_ref(), &request.url).await?;
    Ok(Json(recipe))
}

/// GET /recipes/by-slug/:slug
async fn get_recipe_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Option<Recipe>>> {
    Ok(Json(state.recipes.get_by_slug(&slug).await?))
}

/// POST /recipes/search
async fn search_recipes(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<SearchRequest>,
) -> Result<Json<Vec<Recipe>>> {
    Ok(Json(state.recipes.search(&request.query).await?))
}

/// POST /recipes/:id/chef
async fn ask_the_chef(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(request): ApiJson<ChefRequest>,
) -> Result<Json<ChefResponse>> {
    let reply = state.chef.ask(&id, &request.messages).await?;
    Ok(Json(ChefResponse { reply }))
}
