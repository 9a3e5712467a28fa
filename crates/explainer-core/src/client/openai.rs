//! OpenAI chat-completions client
//!
//! Uses reqwest against any OpenAI-compatible `/chat/completions` endpoint and
//! maps every failure onto an [`ExplanationError`] class.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{ClientConfig, ExplanationClient, ExplanationError};

const SYSTEM_PROMPT: &str = "You are a helpful assistant.";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Error code OpenAI attaches to 429 responses when the account is out of credit.
const INSUFFICIENT_QUOTA: &str = "insufficient_quota";

/// OpenAI API client
pub struct OpenAiClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl OpenAiClient {
    /// Create a new client from explicit configuration
    pub fn new(config: ClientConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/chat/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn headers(&self) -> Result<HeaderMap, ExplanationError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        let bearer = HeaderValue::from_str(&format!("Bearer {}", self.config.api_key))
            .map_err(|_| ExplanationError::Unclassified("Invalid API key format".to_string()))?;
        headers.insert(AUTHORIZATION, bearer);
        Ok(headers)
    }
}

/// Build the user prompt for one slide.
pub fn slide_prompt(text: &str) -> String {
    format!("Explain the following presentation slide content succinctly:\n\n{text}")
}

#[async_trait]
impl ExplanationClient for OpenAiClient {
    async fn explain(&self, text: &str) -> Result<String, ExplanationError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: slide_prompt(text),
                },
            ],
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        let response = self
            .client
            .post(self.endpoint())
            .headers(self.headers()?)
            .json(&request)
            .send()
            .await
            .map_err(classify_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(classify_transport)?;

        if !status.is_success() {
            return Err(classify_status(status, &body));
        }

        let explanation = parse_completion(&body)?;
        debug!(
            model = %self.config.model,
            chars = explanation.len(),
            "Received explanation"
        );
        Ok(explanation)
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}

/// Transport-level failures (connect, timeout, broken body) are retryable.
fn classify_transport(err: reqwest::Error) -> ExplanationError {
    if err.is_decode() || err.is_builder() {
        ExplanationError::Unclassified(err.to_string())
    } else {
        ExplanationError::Transient(err.to_string())
    }
}

/// Map a non-success HTTP response onto a failure class.
pub fn classify_status(status: StatusCode, body: &str) -> ExplanationError {
    let api_error = serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .map(|e| e.error);
    let message = api_error
        .as_ref()
        .map(|e| e.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("HTTP {status}"));
    let code = api_error.and_then(|e| e.code);

    match status {
        StatusCode::TOO_MANY_REQUESTS if code.as_deref() == Some(INSUFFICIENT_QUOTA) => {
            ExplanationError::NonRetryable(message)
        }
        StatusCode::TOO_MANY_REQUESTS => ExplanationError::RateLimited(message),
        StatusCode::BAD_REQUEST | StatusCode::NOT_FOUND | StatusCode::UNPROCESSABLE_ENTITY => {
            ExplanationError::NonRetryable(message)
        }
        s if s.is_server_error() => ExplanationError::Transient(message),
        _ => ExplanationError::Unclassified(message),
    }
}

/// Extract the first choice's content from a successful response body.
pub fn parse_completion(body: &str) -> Result<String, ExplanationError> {
    let response: ChatResponse = serde_json::from_str(body)
        .map_err(|e| ExplanationError::Unclassified(format!("Invalid response body: {e}")))?;

    response
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
        .map(|content| content.trim().to_string())
        .ok_or_else(|| ExplanationError::Unclassified("Response contained no choices".to_string()))
}

// Request/response types

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: String,
    #[serde(default)]
    code: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn error_body(message: &str, code: Option<&str>) -> String {
        serde_json::json!({
            "error": { "message": message, "type": "test", "code": code }
        })
        .to_string()
    }

    #[test]
    fn test_rate_limit_is_retryable() {
        let err = classify_status(
            StatusCode::TOO_MANY_REQUESTS,
            &error_body("Rate limit reached", Some("rate_limit_exceeded")),
        );
        assert_eq!(
            err,
            ExplanationError::RateLimited("Rate limit reached".to_string())
        );
    }

    #[test]
    fn test_insufficient_quota_is_not_retryable() {
        let err = classify_status(
            StatusCode::TOO_MANY_REQUESTS,
            &error_body("You exceeded your current quota", Some("insufficient_quota")),
        );
        assert!(matches!(err, ExplanationError::NonRetryable(_)));
    }

    #[test]
    fn test_invalid_request_is_not_retryable() {
        let err = classify_status(
            StatusCode::BAD_REQUEST,
            &error_body("maximum context length exceeded", None),
        );
        assert!(matches!(err, ExplanationError::NonRetryable(_)));
    }

    #[test]
    fn test_server_errors_are_transient() {
        let err = classify_status(StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert_eq!(err, ExplanationError::Transient("HTTP 502 Bad Gateway".to_string()));
    }

    #[test]
    fn test_auth_failure_is_unclassified() {
        let err = classify_status(StatusCode::UNAUTHORIZED, &error_body("Bad key", None));
        assert_eq!(err, ExplanationError::Unclassified("Bad key".to_string()));
    }

    #[test]
    fn test_parse_completion_trims_content() {
        let body = serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "  An explanation.\n" } }]
        })
        .to_string();
        assert_eq!(parse_completion(&body).unwrap(), "An explanation.");
    }

    #[test]
    fn test_parse_completion_rejects_empty_choices() {
        let err = parse_completion(r#"{"choices": []}"#).unwrap_err();
        assert!(matches!(err, ExplanationError::Unclassified(_)));
    }

    #[test]
    fn test_slide_prompt_embeds_text() {
        assert!(slide_prompt("Rust ownership").ends_with("\n\nRust ownership"));
    }
}
