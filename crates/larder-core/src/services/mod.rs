//! Business logic services for Larder.
//!
//! Services sit between the HTTP handlers and the database, and own the
//! calls out to the LLM and embedding providers.

mod chef;
mod collections;
mod recipes;
mod users;

pub use chef::{recipe_context, ChefService};
pub use collections::CollectionService;
pub use recipes::{parse_extraction, RecipeService};
pub use users::UserService;

pub use larder_embeddings::EmbeddingService;
pub use larder_llm::LlmService;
