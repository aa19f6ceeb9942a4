//! Domain models shared by the service and API layers.

mod recipe;

pub use recipe::{Recipe, RecipeDraft};
