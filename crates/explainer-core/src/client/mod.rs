//! Explanation provider abstraction.
//!
//! The client is the only component that talks to the remote LLM service.
//! Transport, authentication and response parsing live behind
//! [`ExplanationClient`]; callers only see a classified [`ExplanationError`].

pub mod openai;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub use openai::OpenAiClient;

/// Classified failure from one explanation request.
///
/// The retry engine picks a policy per variant, so adapters must map every
/// transport or API failure onto exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ExplanationError {
    /// Soft rate limit; retry after a fixed cooldown
    #[error("rate limited: {0}")]
    RateLimited(String),

    /// Connection failure or server-side error; retry with backoff
    #[error("transient API error: {0}")]
    Transient(String),

    /// Quota exhausted or invalid request; never retried
    #[error("request rejected: {0}")]
    NonRetryable(String),

    /// Anything the adapter could not classify; never retried
    #[error("unexpected error: {0}")]
    Unclassified(String),
}

/// Produces an explanation for one slide's text.
#[async_trait]
pub trait ExplanationClient: Send + Sync {
    /// Request an explanation of `text`.
    async fn explain(&self, text: &str) -> Result<String, ExplanationError>;

    /// Get the model identifier
    fn model_id(&self) -> &str;
}

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_MAX_TOKENS: u32 = 1500;
pub const DEFAULT_TEMPERATURE: f32 = 0.5;

/// Connection settings for an OpenAI-compatible endpoint.
///
/// Passed explicitly to the client constructor; there is no process-wide
/// credential.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(skip_serializing, default)]
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl ClientConfig {
    /// Config with default model and endpoint for the given key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_config_defaults() {
        let config = ClientConfig::new("sk-test").with_model("gpt-4o-mini");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.max_tokens, 1500);
    }

    #[test]
    fn test_api_key_is_not_serialized() {
        let json = serde_json::to_string(&ClientConfig::new("sk-secret")).unwrap();
        assert!(!json.contains("sk-secret"));
    }
}
