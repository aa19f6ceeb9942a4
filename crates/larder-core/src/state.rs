//! Application state for Larder.
//!
//! Contains the shared state that is passed to all handlers.

use std::sync::Arc;

use crate::config::Config;
use crate::db::DbPool;
use crate::middleware::TokenVerifier;
use crate::services::{
    ChefService, CollectionService, EmbeddingService, LlmService, RecipeService, UserService,
};
use crate::Result;

/// Application state shared across all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: DbPool,
    /// Bearer token verifier.
    pub verifier: Arc<TokenVerifier>,
    /// User lookup and registration.
    pub users: UserService,
    /// Recipe ingestion, retrieval and search.
    pub recipes: RecipeService,
    /// Saved recipes.
    pub collections: CollectionService,
    /// Recipe Q&A.
    pub chef: ChefService,
    /// Chat client shared by ingestion and Q&A.
    pub llm: LlmService,
}

impl AppState {
    /// Create application state from configuration, opening the database
    /// and applying the schema.
    pub async fn new(config: &Config) -> Result<Self> {
        let db = crate::db::init_pool(&config.database.path).await?;
        crate::db::initialize_schema(&db).await?;

        Self::with_pool(db, config)
    }

    /// Create application state over an existing pool.
    pub fn with_pool(db: DbPool, config: &Config) -> Result<Self> {
        let verifier = Arc::new(TokenVerifier::from_config(&config.auth)?);
        let llm = LlmService::new(&config.llm)?;
        let embeddings = EmbeddingService::from_config(&config.embedding)?;

        if !llm.is_available() {
            tracing::warn!("No LLM provider configured, recipe extraction and chat will fail");
        }
        if !embeddings.has_providers() {
            tracing::warn!("No embedding provider configured, using hash-based placeholder embeddings");
        }

        Ok(Self {
            users: UserService::new(db.clone()),
            recipes: RecipeService::new(
                db.clone(),
                llm.clone(),
                embeddings,
                config.recipes.clone(),
            ),
            collections: CollectionService::new(db.clone()),
            chef: ChefService::new(db.clone(), llm.clone()),
            llm,
            verifier,
            db,
        })
    }
}
