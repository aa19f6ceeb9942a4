//! Collection Routes
//!
//! The caller's saved recipes. Anonymous callers see an empty collection.
//!
//! Routes:
//! - GET /collection - List saved recipes
//! - POST /collection - Save a recipe (requires a stored user)
//! - GET /collection/:recipe_id - Whether a recipe is saved
//! - DELETE /collection/:recipe_id - Unsave a recipe

use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};

use super::{resolve_user, ApiJson, Caller};
use crate::db::CollectionEntry;
use crate::models::Recipe;
use crate::{AppState, Result};

/// Build collection routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_collection).post(add_to_collection))
        .route(
            "/:recipe_id",
            get(is_in_collection).delete(remove_from_collection),
        )
}

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct AddToCollectionRequest {
    pub recipe_id: String,
}

#[derive(Debug, Serialize)]
pub struct MembershipResponse {
    pub in_collection: bool,
}

/// ID of the removed entry, null when nothing was removed.
#[derive(Debug, Serialize)]
pub struct RemoveResponse {
    pub removed: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /collection
async fn list_collection(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Recipe>>> {
    let user = resolve_user(&state, &caller).await?;
    Ok(Json(state.collections.list(user.as_ref()).await?))
}

/// POST /collection
async fn add_to_collection(
    State(state): State<AppState>,
    caller: Caller,
    ApiJson(request): ApiJson<AddToCollectionRequest>,
) -> Result<Json<CollectionEntry>> {
    let user = resolve_user(&state, &caller).await?;
    let entry = state
        .collections
        .add(user.as_ref(), &request.recipe_id)
        .await?;
    Ok(Json(entry))
}

/// GET /collection/:recipe_id
async fn is_in_collection(
    State(state): State<AppState>,
    caller: Caller,
    Path(recipe_id): Path<String>,
) -> Result<Json<MembershipResponse>> {
    let user = resolve_user(&state, &caller).await?;
    let in_collection = state
        .collections
        .is_in_collection(user.as_ref(), &recipe_id)
        .await?;
    Ok(Json(MembershipResponse { in_collection }))
}

/// DELETE /collection/:recipe_id
async fn remove_from_collection(
    State(state): State<AppState>,
    caller: Caller,
    Path(recipe_id): Path<String>,
) -> Result<Json<RemoveResponse>> {
    let user = resolve_user(&state, &caller).await?;
    let removed = state.collections.remove(user.as_ref(), &recipe_id).await?;
    Ok(Json(RemoveResponse { removed }))
}
