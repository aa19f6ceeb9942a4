//! API Routes for Larder
//!
//! This module combines all API routes into a single router.

mod collections;
mod recipes;
pub mod status;
mod users;

use axum::extract::FromRequest;
use axum::{Extension, Router};

use crate::db::User;
use crate::middleware::{resolve_identity, Identity};
use crate::{AppState, Result};

/// JSON request body whose rejections use the API error shape.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(crate::Error))]
struct ApiJson<T>(T);

/// Identity of the caller, absent for anonymous requests.
type Caller = Option<Extension<Identity>>;

/// Build the complete API router.
///
/// Route structure:
/// - /health - Health checks (public, no identity resolution)
/// - /api/recipes/* - Recipes, search and ask-the-chef
/// - /api/collection/* - The caller's saved recipes
/// - /api/users/* - User registration and lookup
pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .merge(status::routes())
        .nest("/api", api_routes(state))
}

/// Routes that see the caller's identity when a bearer token is sent.
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/recipes", recipes::routes())
        .nest("/collection", collections::routes())
        .nest("/users", users::routes())
        .layer(axum::middleware::from_fn_with_state(state, resolve_identity))
}

/// The stored user for the caller, if any.
async fn resolve_user(state: &AppState, caller: &Caller) -> Result<Option<User>> {
    let identity = caller.as_ref().map(|Extension(identity)| identity);
    state.users.get_user_from_identity(identity).await
}
