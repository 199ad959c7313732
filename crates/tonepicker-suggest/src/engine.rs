use async_trait::async_trait;
use llm::builder::{LLMBackend, LLMBuilder};
use llm::chat::ChatMessage;
use llm::error::LLMError;
use once_cell::sync::Lazy;
use regex::Regex;

use tonepicker_core::AiSettings;

/// Sampling knobs sent with every completion request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ModelParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ModelParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 1000,
        }
    }
}

/// Upstream failures, already sorted into the classes callers act on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error("rate limited: {0}")]
    RateLimited(String),
    #[error("model call failed: {0}")]
    Unavailable(String),
}

/// A single-turn text completion backend.
#[async_trait]
pub trait ToneModel: Send + Sync {
    async fn complete(&self, prompt: &str, params: ModelParams) -> Result<String, ModelError>;
}

fn map_backend(provider: &str) -> Result<LLMBackend, ModelError> {
    match provider {
        "openai" => Ok(LLMBackend::OpenAI),
        "anthropic" => Ok(LLMBackend::Anthropic),
        "google" => Ok(LLMBackend::Google),
        "ollama" => Ok(LLMBackend::Ollama),
        "groq" => Ok(LLMBackend::Groq),
        "mistral" => Ok(LLMBackend::Mistral),
        "deepseek" => Ok(LLMBackend::DeepSeek),
        other => Err(ModelError::Unavailable(format!("unknown provider: {other}"))),
    }
}

/// [`ToneModel`] backed by the `llm` crate. A fresh client is built per call
/// so settings changes never need a restart.
pub struct LlmToneModel {
    settings: AiSettings,
}

impl LlmToneModel {
    pub fn new(settings: AiSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl ToneModel for LlmToneModel {
    async fn complete(&self, prompt: &str, params: ModelParams) -> Result<String, ModelError> {
        let backend = map_backend(&self.settings.provider)?;

        let mut builder = LLMBuilder::new()
            .backend(backend)
            .model(&self.settings.model)
            .temperature(params.temperature)
            .max_tokens(params.max_tokens);

        if !self.settings.api_key.is_empty() {
            builder = builder.api_key(&self.settings.api_key);
        }

        let llm = builder.build().map_err(classify)?;

        let messages = vec![ChatMessage::user().content(prompt).build()];

        let response = llm.chat(&messages).await.map_err(classify)?;

        match response.text() {
            Some(text) if !text.trim().is_empty() => Ok(text),
            Some(_) => Err(ModelError::Unavailable("LLM returned empty text".to_string())),
            None => Err(ModelError::Unavailable("LLM returned no text".to_string())),
        }
    }
}

/// Sort an `llm` error into auth / rate-limit / everything else.
pub fn classify(err: LLMError) -> ModelError {
    match err {
        LLMError::AuthError(msg) => ModelError::Auth(msg),
        other => classify_message(other.to_string()),
    }
}

/// Providers report most failures as free-form text, so fall back to
/// looking for the usual markers. Auth markers win over rate-limit ones.
fn classify_message(message: String) -> ModelError {
    if AUTH_MARKER.is_match(&message) {
        ModelError::Auth(message)
    } else if RATE_LIMIT_MARKER.is_match(&message) {
        ModelError::RateLimited(message)
    } else {
        ModelError::Unavailable(message)
    }
}

static AUTH_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)api key|unauthorized|\b401\b").unwrap());
static RATE_LIMIT_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)rate limit|too many requests|\b429\b").unwrap());
