//! User Routes
//!
//! Routes:
//! - POST /users/store - Create the caller's user record (idempotent)
//! - GET /users/me - The caller's user record, or null

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use super::{resolve_user, Caller};
use crate::db::User;
use crate::{AppState, Result};

/// Build user routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/store", post(store_user))
        .route("/me", get(current_user))
}

/// POST /users/store
async fn store_user(State(state): State<AppState>, caller: Caller) -> Result<Json<User>> {
    let identity = caller.as_ref().map(|axum::Extension(identity)| identity);
    Ok(Json(state.users.store_user(identity).await?))
}

/// GET /users/me
async fn current_user(State(state): State<AppState>, caller: Caller) -> Result<Json<Option<User>>> {
    Ok(Json(resolve_user(&state, &caller).await?))
}
