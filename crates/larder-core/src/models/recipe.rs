//! Recipe models.

use serde::{Deserialize, Serialize};

/// A stored recipe.
///
/// The embedding stays server-side and is never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recipe {
    pub id: String,
    pub title: String,
    pub description: String,
    pub cuisine: String,
    pub slug: String,
    pub prep_time: String,
    pub cook_time: String,
    pub ingredients: Vec<String>,
    pub method: Vec<String>,
    pub nutritional_info: String,
    pub tags: Vec<String>,
    pub source: String,
    pub user_id: String,
    #[serde(skip)]
    pub embedding: Vec<f32>,
    pub created_at: String,
}

/// Recipe fields as extracted by the model.
///
/// Field names follow the JSON schema given in the extraction prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecipeDraft {
    pub title: String,
    pub description: String,
    pub cuisine: String,
    pub cook_time: String,
    pub ingredients: Vec<String>,
    pub method: Vec<String>,
    pub nutritional_info: String,
    pub prep_time: String,
    pub tags: Vec<String>,
}

impl RecipeDraft {
    /// Text embedded for semantic search.
    pub fn embedding_text(&self) -> String {
        let tags = self.tags.join(" ");
        [
            self.title.as_str(),
            self.description.as_str(),
            self.cuisine.as_str(),
            self.cook_time.as_str(),
            tags.as_str(),
        ]
        .join("\n")
    }
}
