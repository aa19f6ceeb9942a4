//! Configuration management for Larder.
//!
//! Loads configuration from environment variables (with `.env` support) into
//! a process-wide [`Config`]. The LLM and embedding sections are the client
//! crates' own config types so they can be handed over unchanged.

use std::env;
use std::sync::OnceLock;

use larder_embeddings::{EmbeddingConfig, EmbeddingProviderConfig};
use larder_llm::{LlmConfig, LlmProviderConfig};

/// Global configuration instance
static CONFIG: OnceLock<Config> = OnceLock::new();

/// Get the global configuration
pub fn config() -> &'static Config {
    CONFIG.get_or_init(Config::from_env)
}

/// Initialize configuration (call once at startup)
pub fn init() -> &'static Config {
    config()
}

#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub llm: LlmConfig,
    pub embedding: EmbeddingConfig,
    pub recipes: RecipeConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

/// Bearer token verification settings.
///
/// With neither a secret nor a public key every token is rejected.
#[derive(Debug, Clone, Default)]
pub struct AuthConfig {
    /// HS256 shared secret.
    pub jwt_secret: Option<String>,
    /// RS256 PEM public key file; preferred over `jwt_secret`.
    pub jwt_public_key_path: Option<String>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RecipeConfig {
    /// Maximum hits returned by the vector query.
    pub search_limit: usize,
    /// Cap on the title-derived part of a slug.
    pub slug_max_length: usize,
}

impl Default for RecipeConfig {
    fn default() -> Self {
        Self {
            search_limit: 16,
            slug_max_length: 60,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    pub json: bool,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from any key lookup.
    pub fn from_lookup<F>(get: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let env_or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let defaults = RecipeConfig::default();

        Self {
            server: ServerConfig {
                host: env_or("HOST", "0.0.0.0"),
                port: env_or("PORT", "8787").parse().unwrap_or(8787),
            },
            database: DatabaseConfig {
                path: env_or("DATABASE_PATH", "./data/larder.db"),
            },
            auth: AuthConfig {
                jwt_secret: get("AUTH_JWT_SECRET"),
                jwt_public_key_path: get("AUTH_JWT_PUBLIC_KEY_PATH"),
                issuer: get("AUTH_ISSUER"),
                audience: get("AUTH_AUDIENCE"),
            },
            llm: LlmConfig {
                providers: parse_llm_providers(&get),
                max_tokens: env_or("LLM_MAX_TOKENS", "2048").parse().unwrap_or(2048),
            },
            embedding: parse_embedding_config(&get),
            recipes: RecipeConfig {
                search_limit: get("RECIPE_SEARCH_LIMIT")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.search_limit),
                slug_max_length: get("SLUG_MAX_LENGTH")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.slug_max_length),
            },
            logging: LoggingConfig {
                json: get("LOG_FORMAT")
                    .map(|v| v.eq_ignore_ascii_case("json"))
                    .unwrap_or(false),
            },
        }
    }
}

/// The OpenAI key under either spelling.
fn openai_key<F>(get: &F) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    get("OPENAI_API_KEY").or_else(|| get("OPEN_API_KEY"))
}

/// Parse chat providers from environment.
/// OpenAI first, then Anthropic, then Gemini.
fn parse_llm_providers<F>(get: &F) -> Vec<LlmProviderConfig>
where
    F: Fn(&str) -> Option<String>,
{
    let mut providers = Vec::new();

    if let Some(api_key) = openai_key(get) {
        providers.push(LlmProviderConfig {
            name: "openai".to_string(),
            base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| larder_llm::default_endpoint("openai")),
            model: get("OPENAI_MODEL").unwrap_or_else(|| larder_llm::default_model("openai")),
            api_key,
            priority: 1,
        });
    }

    if let Some(api_key) = get("ANTHROPIC_API_KEY") {
        providers.push(LlmProviderConfig {
            name: "anthropic".to_string(),
            base_url: larder_llm::default_endpoint("anthropic"),
            model: get("ANTHROPIC_MODEL")
                .unwrap_or_else(|| larder_llm::default_model("anthropic")),
            api_key,
            priority: 2,
        });
    }

    if let Some(api_key) = get("GOOGLE_API_KEY") {
        providers.push(LlmProviderConfig {
            name: "gemini".to_string(),
            base_url: larder_llm::default_endpoint("gemini"),
            model: get("GEMINI_MODEL").unwrap_or_else(|| larder_llm::default_model("gemini")),
            api_key,
            priority: 3,
        });
    }

    providers
}

/// Parse embedding providers from environment.
fn parse_embedding_config<F>(get: &F) -> EmbeddingConfig
where
    F: Fn(&str) -> Option<String>,
{
    let mut providers = Vec::new();

    if let Some(api_key) = openai_key(get) {
        providers.push(EmbeddingProviderConfig {
            name: "openai".to_string(),
            base_url: get("OPENAI_BASE_URL")
                .unwrap_or_else(|| larder_embeddings::default_endpoint("openai")),
            model: get("OPENAI_EMBEDDING_MODEL")
                .unwrap_or_else(|| larder_embeddings::default_model("openai")),
            api_key,
            priority: 1,
        });
    }

    if let Some(api_key) = get("GOOGLE_API_KEY") {
        providers.push(EmbeddingProviderConfig {
            name: "gemini".to_string(),
            base_url: larder_embeddings::default_endpoint("gemini"),
            model: get("GEMINI_EMBEDDING_MODEL")
                .unwrap_or_else(|| larder_embeddings::default_model("gemini")),
            api_key,
            priority: 2,
        });
    }

    // Ollama - local/self-hosted
    if let Some(ollama_url) = get("OLLAMA_URL") {
        let priority = get("OLLAMA_PRIORITY")
            .and_then(|v| v.parse().ok())
            .unwrap_or(3);
        providers.push(EmbeddingProviderConfig {
            name: "ollama".to_string(),
            base_url: ollama_url,
            model: get("OLLAMA_EMBEDDING_MODEL")
                .unwrap_or_else(|| larder_embeddings::default_model("ollama")),
            api_key: String::new(), // No authentication needed
            priority,
        });
    }

    providers.sort_by_key(|p| p.priority);

    let default_dim = providers
        .first()
        .map(|p| larder_embeddings::default_dimension(&p.model))
        .unwrap_or(1536);

    let dimension = get("EMBEDDING_DIMENSION")
        .and_then(|v| v.parse().ok())
        .unwrap_or(default_dim);

    EmbeddingConfig {
        providers,
        dimension,
    }
}
