//! Chat-completion client for Larder.
//!
//! Speaks the OpenAI-compatible, Anthropic and Gemini wire formats. A single
//! provider (the highest-priority one with credentials) serves every call;
//! failures are returned to the caller as-is, with no retry or fallback.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{debug, info};

/// HTTP timeout for a single completion.
const REQUEST_TIMEOUT_SECS: u64 = 60;

/// Error types for the LLM service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("No providers configured")]
    NoProviders,

    #[error("Request failed: {0}")]
    Request(String),
}

/// Result type for LLM operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Configuration for an LLM provider.
#[derive(Debug, Clone)]
pub struct LlmProviderConfig {
    pub name: String,
    pub base_url: String,
    pub model: String,
    pub api_key: String,
    pub priority: u8,
}

/// Configuration for the LLM service.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    pub providers: Vec<LlmProviderConfig>,
    /// Output cap sent to APIs that require one (Anthropic, Gemini).
    pub max_tokens: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            max_tokens: 2048,
        }
    }
}

/// Get default endpoint for a provider
pub fn default_endpoint(name: &str) -> String {
    match name {
        "gemini" => "https://generativelanguage.googleapis.com/v1beta".to_string(),
        "anthropic" => "https://api.anthropic.com/v1".to_string(),
        "openrouter" => "https://openrouter.ai/api/v1".to_string(),
        _ => "https://api.openai.com/v1".to_string(),
    }
}

/// Get default model for a provider
pub fn default_model(name: &str) -> String {
    match name {
        "gemini" => "gemini-1.5-flash".to_string(),
        "anthropic" => "claude-3-5-haiku-20241022".to_string(),
        "openrouter" => "meta-llama/llama-3-8b-instruct:free".to_string(),
        _ => "gpt-4".to_string(),
    }
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One entry of a chat transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Chat-completion service.
#[derive(Clone)]
pub struct LlmService {
    inner: Arc<LlmServiceInner>,
}

struct LlmServiceInner {
    /// Sorted by ascending priority.
    providers: Vec<LlmProviderConfig>,
    max_tokens: u32,
    client: Client,
}

/// Response from LLM API
#[derive(Debug, Deserialize)]
struct LlmResponse {
    choices: Option<Vec<Choice>>,
    candidates: Option<Vec<Candidate>>,     // Gemini format
    content: Option<Vec<AnthropicContent>>, // Anthropic format
    error: Option<LlmError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Option<Message>,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: CandidateContent,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicContent {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LlmError {
    message: String,
}

impl LlmService {
    /// Create LLM service from config.
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| Error::Request(format!("Failed to create HTTP client: {}", e)))?;

        let mut providers = config.providers.clone();
        providers.sort_by_key(|p| p.priority);

        info!(
            providers = ?providers.iter().map(|p| &p.name).collect::<Vec<_>>(),
            "LLM service initialized from config"
        );

        Ok(Self {
            inner: Arc::new(LlmServiceInner {
                providers,
                max_tokens: config.max_tokens,
                client,
            }),
        })
    }

    /// Get provider names in priority order
    pub fn providers(&self) -> Vec<String> {
        self.inner.providers.iter().map(|p| p.name.clone()).collect()
    }

    /// Whether any provider has credentials.
    pub fn is_available(&self) -> bool {
        self.active_provider().is_some()
    }

    fn active_provider(&self) -> Option<&LlmProviderConfig> {
        self.inner.providers.iter().find(|p| !p.api_key.is_empty())
    }

    /// Send a transcript and return the model's reply text unchanged.
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<String> {
        let provider = self.active_provider().ok_or(Error::NoProviders)?;
        self.call_provider(provider, messages).await
    }

    /// Make the actual API call to a provider.
    async fn call_provider(
        &self,
        provider: &LlmProviderConfig,
        messages: &[ChatMessage],
    ) -> Result<String> {
        debug!(
            provider = %provider.name,
            model = %provider.model,
            messages = messages.len(),
            "Calling LLM provider"
        );

        let max_tokens = self.inner.max_tokens;
        let (url, body) = match provider.name.as_str() {
            "gemini" => build_gemini_request(provider, messages, max_tokens),
            "anthropic" => build_anthropic_request(provider, messages, max_tokens),
            _ => build_openai_request(provider, messages),
        };

        let mut request = self
            .inner
            .client
            .post(&url)
            .header("Content-Type", "application/json");

        request = match provider.name.as_str() {
            "anthropic" => request
                .header("x-api-key", &provider.api_key)
                .header("anthropic-version", "2023-06-01"),
            "gemini" => request,
            _ => request.header("Authorization", format!("Bearer {}", provider.api_key)),
        };

        let response = request
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::Request(format!("Request failed: {}", e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::Request(format!("Failed to read response: {}", e)))?;

        if status.as_u16() == 429 {
            return Err(Error::RateLimitExceeded);
        }

        if !status.is_success() {
            return Err(Error::Llm(format!(
                "Provider returned {}: {}",
                status, text
            )));
        }

        parse_response(&provider.name, &text)
    }
}

/// Build request for OpenAI-compatible APIs (OpenAI, OpenRouter)
fn build_openai_request(provider: &LlmProviderConfig, messages: &[ChatMessage]) -> (String, Value) {
    let url = format!("{}/chat/completions", provider.base_url);

    let body = json!({
        "model": provider.model,
        "messages": messages,
    });

    (url, body)
}

/// Build request for Anthropic Claude API.
///
/// System messages are not allowed in `messages`; they are joined into the
/// top-level `system` field.
fn build_anthropic_request(
    provider: &LlmProviderConfig,
    messages: &[ChatMessage],
    max_tokens: u32,
) -> (String, Value) {
    let url = format!("{}/messages", provider.base_url);

    let system = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n\n");

    let mut turns: Vec<Value> = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| json!({"role": m.role.as_str(), "content": m.content}))
        .collect();

    // At least one turn is required; a system-only transcript becomes the user turn
    let system_as_turn = turns.is_empty() && !system.is_empty();
    if system_as_turn {
        turns.push(json!({"role": "user", "content": system.clone()}));
    }

    let mut body = json!({
        "model": provider.model,
        "messages": turns,
        "max_tokens": max_tokens,
    });

    if !system.is_empty() && !system_as_turn {
        body["system"] = json!(system);
    }

    (url, body)
}

/// Build request for Gemini API
fn build_gemini_request(
    provider: &LlmProviderConfig,
    messages: &[ChatMessage],
    max_tokens: u32,
) -> (String, Value) {
    let url = format!(
        "{}/models/{}:generateContent?key={}",
        provider.base_url, provider.model, provider.api_key
    );

    let system: Vec<Value> = messages
        .iter()
        .filter(|m| m.role == Role::System)
        .map(|m| json!({"text": m.content}))
        .collect();

    let mut contents: Vec<Value> = messages
        .iter()
        .filter(|m| m.role != Role::System)
        .map(|m| {
            let role = match m.role {
                Role::Assistant => "model",
                _ => "user",
            };
            json!({"role": role, "parts": [{"text": m.content}]})
        })
        .collect();

    // Same rule as Anthropic: contents must not be empty
    let system_as_turn = contents.is_empty() && !system.is_empty();
    if system_as_turn {
        contents.push(json!({"role": "user", "parts": system.clone()}));
    }

    let mut body = json!({
        "contents": contents,
        "generationConfig": {
            "maxOutputTokens": max_tokens
        }
    });

    if !system.is_empty() && !system_as_turn {
        body["systemInstruction"] = json!({ "parts": system });
    }

    (url, body)
}

/// Parse response from different API formats
fn parse_response(provider: &str, text: &str) -> Result<String> {
    let response: LlmResponse = serde_json::from_str(text)
        .map_err(|e| Error::Llm(format!("Failed to parse response: {}", e)))?;

    if let Some(error) = response.error {
        return Err(Error::Llm(error.message));
    }

    // Try Anthropic format first
    if let Some(content) = response.content {
        if let Some(content_block) = content.into_iter().next() {
            return Ok(content_block.text.unwrap_or_default());
        }
    }

    // Try Gemini format
    if let Some(candidates) = response.candidates {
        if let Some(candidate) = candidates.into_iter().next() {
            if let Some(part) = candidate.content.parts.into_iter().next() {
                return Ok(part.text);
            }
        }
    }

    // Try OpenAI format
    if let Some(choices) = response.choices {
        if let Some(choice) = choices.into_iter().next() {
            if let Some(message) = choice.message {
                return Ok(message.content.unwrap_or_default());
            }
            if let Some(text) = choice.text {
                return Ok(text);
            }
        }
    }

    Err(Error::Llm(format!("No content in {} response", provider)))
}
