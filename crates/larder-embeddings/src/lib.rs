//! Embedding service for Larder.
//!
//! Supports Gemini, OpenAI-compatible and Ollama embedding APIs. The first
//! provider with credentials (lowest priority number) serves every call.
//! Falls back to hash-based placeholders when no providers are configured.
//!
//! # Example
//!
//! ```no_run
//! use larder_embeddings::{EmbeddingService, EmbeddingConfig, EmbeddingProviderConfig};
//!
//! # async fn example() -> Result<(), larder_embeddings::Error> {
//! let config = EmbeddingConfig {
//!     providers: vec![
//!         EmbeddingProviderConfig {
//!             name: "openai".to_string(),
//!             base_url: "https://api.openai.com/v1".to_string(),
//!             model: "text-embedding-ada-002".to_string(),
//!             api_key: "your-api-key".to_string(),
//!             priority: 1,
//!         },
//!     ],
//!     dimension: 1536,
//! };
//!
//! let service = EmbeddingService::from_config(&config)?;
//! let embedding = service.embed("chocolate cake").await?;
//! assert_eq!(embedding.len(), 1536);
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, warn};

// ============================================================================
// Error types
// ============================================================================

/// Errors that can occur in the embedding service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Internal error (HTTP client, parsing, etc.)
    #[error("Internal error: {0}")]
    Internal(String),

    /// Provider API error
    #[error("Provider error: {0}")]
    Provider(String),

    /// Provider returned a vector of the wrong length
    #[error("Embedding dimension mismatch: expected {expected}, got {actual}")]
    Dimension { expected: usize, actual: usize },
}

/// Result type for embedding operations.
pub type Result<T> = std::result::Result<T, Error>;

// ============================================================================
// Configuration types
// ============================================================================

/// Configuration for the embedding service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    /// List of embedding providers.
    pub providers: Vec<EmbeddingProviderConfig>,
    /// Length of every vector the service returns.
    pub dimension: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            dimension: 1536,
        }
    }
}

/// Configuration for a single embedding provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingProviderConfig {
    /// Provider name (e.g., "gemini", "openai", "ollama").
    pub name: String,
    /// Base URL for the API.
    pub base_url: String,
    /// Model name to use.
    pub model: String,
    /// API key for authentication (empty for Ollama).
    pub api_key: String,
    /// Priority (lower = higher priority).
    pub priority: u8,
}

impl EmbeddingProviderConfig {
    /// Ollama runs unauthenticated; everything else needs a key.
    fn has_credentials(&self) -> bool {
        self.name == "ollama" || !self.api_key.is_empty()
    }
}

// ============================================================================
// Default values
// ============================================================================

/// Get default endpoint for a provider.
pub fn default_endpoint(name: &str) -> String {
    match name {
        "gemini" => "https://generativelanguage.googleapis.com/v1beta".to_string(),
        "ollama" => "http://localhost:11434".to_string(),
        _ => "https://api.openai.com/v1".to_string(),
    }
}

/// Get default model for a provider.
pub fn default_model(name: &str) -> String {
    match name {
        "gemini" => "text-embedding-004".to_string(),
        "ollama" => "nomic-embed-text".to_string(),
        _ => "text-embedding-ada-002".to_string(),
    }
}

/// Get default dimension for a model.
pub fn default_dimension(model: &str) -> usize {
    if model.contains("text-embedding-004") || model.contains("embedding-001") {
        768
    } else if model.contains("text-embedding-3-small") {
        1536
    } else if model.contains("text-embedding-3-large") {
        3072
    } else if model.contains("text-embedding-ada-002") {
        1536
    } else if model.contains("nomic-embed-text") {
        768
    } else if model.contains("mxbai-embed-large") {
        1024
    } else {
        1536 // Default
    }
}

// ============================================================================
// API response types
// ============================================================================

/// Gemini embedding response.
#[derive(Debug, Deserialize)]
struct GeminiEmbedResponse {
    embedding: Option<GeminiEmbedding>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
struct GeminiEmbedding {
    values: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
    code: Option<i32>,
}

/// OpenAI embedding response.
#[derive(Debug, Deserialize)]
struct OpenAIEmbedResponse {
    data: Option<Vec<OpenAIEmbedding>>,
    error: Option<OpenAIError>,
}

#[derive(Debug, Deserialize)]
struct OpenAIEmbedding {
    embedding: Vec<f32>,
}

#[derive(Debug, Deserialize)]
struct OpenAIError {
    message: String,
}

/// Ollama embedding response.
#[derive(Debug, Deserialize)]
struct OllamaEmbedResponse {
    embedding: Option<Vec<f32>>,
    error: Option<String>,
}

// ============================================================================
// Embedding service
// ============================================================================

/// Service for generating text embeddings.
#[derive(Clone)]
pub struct EmbeddingService {
    inner: Arc<EmbeddingServiceInner>,
}

struct EmbeddingServiceInner {
    /// Sorted by ascending priority.
    providers: Vec<EmbeddingProviderConfig>,
    dimension: usize,
    client: Client,
}

impl EmbeddingService {
    /// Create a new embedding service from configuration.
    pub fn from_config(config: &EmbeddingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Internal(format!("Failed to create HTTP client: {}", e)))?;

        let mut providers = config.providers.clone();
        providers.sort_by_key(|p| p.priority);

        if providers.is_empty() {
            warn!(
                dimension = config.dimension,
                "No embedding providers configured - using hash-based placeholders"
            );
        } else {
            info!(
                providers = ?providers.iter().map(|p| &p.name).collect::<Vec<_>>(),
                dimension = config.dimension,
                "Embedding service initialized from config"
            );
        }

        Ok(Self {
            inner: Arc::new(EmbeddingServiceInner {
                providers,
                dimension: config.dimension,
                client,
            }),
        })
    }

    /// Get the embedding dimension.
    pub fn dimension(&self) -> usize {
        self.inner.dimension
    }

    /// Check if real embedding providers are available.
    pub fn has_providers(&self) -> bool {
        !self.inner.providers.is_empty()
    }

    /// Generate the embedding for one text.
    ///
    /// Vectors whose length differs from [`dimension`](Self::dimension) are
    /// rejected.
    pub async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let dim = self.inner.dimension;

        if self.inner.providers.is_empty() {
            debug!("Generating hash-based placeholder embedding");
            return Ok(self.hash_embed(text, dim));
        }

        let provider = self
            .inner
            .providers
            .iter()
            .find(|p| p.has_credentials())
            .ok_or_else(|| Error::Provider("No embedding provider has credentials".to_string()))?;

        debug!(provider = %provider.name, model = %provider.model, "Generating API embedding");

        let embedding = match provider.name.as_str() {
            "gemini" => self.call_gemini(provider, text).await?,
            "ollama" => self.call_ollama(provider, text).await?,
            _ => self.call_openai(provider, text).await?,
        };

        if embedding.len() != dim {
            return Err(Error::Dimension {
                expected: dim,
                actual: embedding.len(),
            });
        }

        Ok(embedding)
    }

    /// Call Gemini embedding API.
    async fn call_gemini(&self, provider: &EmbeddingProviderConfig, text: &str) -> Result<Vec<f32>> {
        let url = format!(
            "{}/models/{}:embedContent?key={}",
            provider.base_url, provider.model, provider.api_key
        );

        let body = json!({
            "model": format!("models/{}", provider.model),
            "content": {
                "parts": [{"text": text}]
            }
        });

        let response = self
            .inner
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Internal(format!("Gemini request failed: {}", e)))?;

        let status = response.status();
        let resp: GeminiEmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Internal(format!("Failed to parse Gemini response: {}", e)))?;

        if let Some(error) = resp.error {
            return Err(Error::Provider(format!(
                "Gemini error ({}): {}",
                error.code.unwrap_or(status.as_u16() as i32),
                error.message
            )));
        }

        resp.embedding
            .map(|e| e.values)
            .ok_or_else(|| Error::Internal("No embedding in Gemini response".to_string()))
    }

    /// Call OpenAI-compatible embedding API.
    async fn call_openai(&self, provider: &EmbeddingProviderConfig, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/embeddings", provider.base_url);

        let mut body = json!({
            "model": provider.model,
            "input": text,
        });

        // Only the v3 models accept a reduced output size.
        if provider.model.starts_with("text-embedding-3") {
            body["dimensions"] = json!(self.inner.dimension);
        }

        let response = self
            .inner
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", provider.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Internal(format!("OpenAI request failed: {}", e)))?;

        let resp: OpenAIEmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Internal(format!("Failed to parse OpenAI response: {}", e)))?;

        if let Some(error) = resp.error {
            return Err(Error::Provider(format!("OpenAI error: {}", error.message)));
        }

        resp.data
            .and_then(|d| d.into_iter().next())
            .map(|e| e.embedding)
            .ok_or_else(|| Error::Internal("No embedding in OpenAI response".to_string()))
    }

    /// Call Ollama embedding API.
    async fn call_ollama(&self, provider: &EmbeddingProviderConfig, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", provider.base_url);

        let body = json!({
            "model": provider.model,
            "prompt": text
        });

        let response = self
            .inner
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Internal(format!("Ollama request failed: {}", e)))?;

        let resp: OllamaEmbedResponse = response
            .json()
            .await
            .map_err(|e| Error::Internal(format!("Failed to parse Ollama response: {}", e)))?;

        if let Some(error) = resp.error {
            return Err(Error::Provider(format!("Ollama error: {}", error)));
        }

        resp.embedding
            .ok_or_else(|| Error::Internal("No embedding in Ollama response".to_string()))
    }

    /// Generate a deterministic embedding from text using hashing.
    /// This is NOT semantic - just a fallback for development/testing.
    pub fn hash_embed(&self, text: &str, dim: usize) -> Vec<f32> {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut embedding: Vec<f32> = (0..dim as u64)
            .map(|i| {
                let mut hasher = DefaultHasher::new();
                text.hash(&mut hasher);
                i.hash(&mut hasher);
                let hash = hasher.finish();

                // Convert to float in [-1, 1] range
                ((hash as f64 / u64::MAX as f64) * 2.0 - 1.0) as f32
            })
            .collect();

        // Normalize to unit length
        let norm: f32 = embedding.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for x in &mut embedding {
                *x /= norm;
            }
        }

        embedding
    }
}

// ============================================================================
// Tests
// ============================================================================
