//! OpenAI-compatible chat completion provider
//!
//! Works against any server exposing `POST {api_base}/chat/completions`:
//! Ollama and LM Studio locally, or the hosted OpenAI API.
//! See: https://platform.openai.com/docs/api-reference/chat
//!
//! # Examples
//!
//! ```no_run
//! use research_llm::{CompletionRequest, Message, LLMProvider};
//! use research_llm::providers::{OpenAIProvider, OpenAIConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Local Ollama server, no key required
//!     let provider = OpenAIProvider::with_config(OpenAIConfig::default())?;
//!
//!     let request = CompletionRequest::builder("llama3")
//!         .add_message(Message::user("Summarize NVDA in one line"))
//!         .max_tokens(100)
//!         .build();
//!
//!     let response = provider.complete(request).await?;
//!     println!("{}", response.message.text());
//!     Ok(())
//! }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, Result, Role,
    StopReason, TokenUsage,
};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

/// Ollama's OpenAI-compatible endpoint
const DEFAULT_API_BASE: &str = "http://localhost:11434/v1";
const DEFAULT_API_KEY: &str = "not-needed";
const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Configuration for the OpenAI-compatible provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAIConfig {
    /// Bearer token; local servers ignore it
    pub api_key: String,

    /// Base URL, e.g. "http://localhost:1234/v1" for LM Studio
    pub api_base: String,

    /// Request timeout in seconds (default: 120)
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Create config from `OPENAI_API_KEY` and `OPENAI_API_BASE`
    ///
    /// Both are optional; unset values keep the local Ollama defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.api_key = key;
        }
        if let Ok(base) = std::env::var("OPENAI_API_BASE") {
            config.api_base = base;
        }
        config
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: DEFAULT_API_KEY.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Provider for OpenAI-compatible chat endpoints
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        if config.timeout_secs == 0 {
            return Err(LLMError::ConfigurationError(
                "timeout_secs must be greater than 0".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Create a provider from environment variables
    pub fn from_env() -> Result<Self> {
        Self::with_config(OpenAIConfig::from_env())
    }

    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.api_base.trim_end_matches('/'))
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        debug!("Sending chat completion to {}", self.config.api_base);

        let openai_request = OpenAIRequest {
            model: request.model.clone(),
            messages: build_openai_messages(request.system, request.messages),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&openai_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;

            return Err(match status.as_u16() {
                401 => LLMError::AuthenticationFailed,
                429 => LLMError::RateLimitExceeded(error_text),
                400 => LLMError::InvalidRequest(error_text),
                404 => LLMError::ModelNotFound(request.model),
                _ => LLMError::RequestFailed(format!("HTTP {status}: {error_text}")),
            });
        }

        let openai_response: OpenAIResponse = response.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse response: {e}"))
        })?;

        into_completion(openai_response)
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

#[derive(Debug, Serialize)]
struct OpenAIRequest {
    model: String,
    messages: Vec<OpenAIMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OpenAIMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    // Some local servers omit usage
    #[serde(default)]
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

/// System prompt goes first in the messages array
fn build_openai_messages(system: Option<String>, messages: Vec<Message>) -> Vec<OpenAIMessage> {
    system
        .map(Message::system)
        .into_iter()
        .chain(messages)
        .map(|msg| OpenAIMessage {
            role: role_name(msg.role).to_string(),
            content: Some(msg.content),
        })
        .collect()
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::User => "user",
        Role::Assistant => "assistant",
        Role::System => "system",
    }
}

fn into_completion(response: OpenAIResponse) -> Result<CompletionResponse> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| LLMError::UnexpectedResponse("No choices in response".to_string()))?;

    let usage = response
        .usage
        .map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        })
        .unwrap_or_default();

    let stop_reason = map_stop_reason(choice.finish_reason.as_deref().unwrap_or("stop"));
    debug!(
        "Received response - stop_reason: {:?}, tokens: {}/{}",
        stop_reason, usage.input_tokens, usage.output_tokens
    );

    Ok(CompletionResponse {
        message: Message::assistant(choice.message.content.unwrap_or_default()),
        stop_reason,
        usage,
    })
}

fn map_stop_reason(reason: &str) -> StopReason {
    match reason {
        "stop" => StopReason::EndTurn,
        "length" => StopReason::MaxTokens,
        "content_filter" => StopReason::ContentFilter,
        _ => {
            debug!("Unknown stop reason: {}", reason);
            StopReason::EndTurn
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_config_targets_local_ollama() {
        let provider = OpenAIProvider::with_config(OpenAIConfig::default()).unwrap();
        assert_eq!(provider.name(), "openai");
        assert_eq!(provider.config().api_base, "http://localhost:11434/v1");
        assert_eq!(provider.config().api_key, "not-needed");
        assert_eq!(
            provider.endpoint(),
            "http://localhost:11434/v1/chat/completions"
        );
    }

    #[test]
    fn test_custom_config() {
        let config = OpenAIConfig::new("sk-test")
            .with_api_base("http://localhost:1234/v1/")
            .with_timeout(60);

        let provider = OpenAIProvider::with_config(config).unwrap();
        assert_eq!(provider.config().api_key, "sk-test");
        assert_eq!(provider.config().timeout_secs, 60);
        assert_eq!(provider.endpoint(), "http://localhost:1234/v1/chat/completions");
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let result = OpenAIProvider::with_config(OpenAIConfig::default().with_timeout(0));
        assert!(matches!(result, Err(LLMError::ConfigurationError(_))));
    }

    #[test]
    fn test_config_from_env() {
        unsafe {
            std::env::set_var("OPENAI_API_KEY", "test-key-from-env");
            std::env::set_var("OPENAI_API_BASE", "http://localhost:1234/v1");
        }

        let config = OpenAIConfig::from_env();
        assert_eq!(config.api_key, "test-key-from-env");
        assert_eq!(config.api_base, "http://localhost:1234/v1");

        unsafe {
            std::env::remove_var("OPENAI_API_KEY");
            std::env::remove_var("OPENAI_API_BASE");
        }
    }

    #[test]
    fn test_system_prompt_comes_first() {
        let messages = build_openai_messages(
            Some("You are an equity analyst".to_string()),
            vec![Message::user("Analyze NVDA")],
        );

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[0].content.as_deref(), Some("You are an equity analyst"));
        assert_eq!(messages[1].role, "user");
    }

    #[test]
    fn test_request_serialization() {
        let request = OpenAIRequest {
            model: "llama3".to_string(),
            messages: build_openai_messages(None, vec![Message::user("Hi")]),
            max_tokens: 256,
            temperature: Some(0.2),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["messages"][0], json!({"role": "user", "content": "Hi"}));
        assert_eq!(value["max_tokens"], 256);
    }

    #[test]
    fn test_response_parsing() {
        let response: OpenAIResponse = serde_json::from_value(json!({
            "choices": [{
                "message": {"role": "assistant", "content": "Hold."},
                "finish_reason": "length"
            }],
            "usage": {"prompt_tokens": 120, "completion_tokens": 3}
        }))
        .unwrap();

        let completion = into_completion(response).unwrap();
        assert_eq!(completion.message.text(), "Hold.");
        assert_eq!(completion.stop_reason, StopReason::MaxTokens);
        assert_eq!(completion.usage.total(), 123);
    }

    #[test]
    fn test_response_without_usage_or_choices() {
        let response: OpenAIResponse = serde_json::from_value(json!({
            "choices": [{"message": {"role": "assistant", "content": "Buy."}}]
        }))
        .unwrap();
        let completion = into_completion(response).unwrap();
        assert_eq!(completion.usage, TokenUsage::default());
        assert_eq!(completion.stop_reason, StopReason::EndTurn);

        let empty: OpenAIResponse = serde_json::from_value(json!({"choices": []})).unwrap();
        assert!(matches!(
            into_completion(empty),
            Err(LLMError::UnexpectedResponse(_))
        ));
    }

    #[test]
    fn test_stop_reason_mapping() {
        assert_eq!(map_stop_reason("stop"), StopReason::EndTurn);
        assert_eq!(map_stop_reason("length"), StopReason::MaxTokens);
        assert_eq!(map_stop_reason("content_filter"), StopReason::ContentFilter);
        assert_eq!(map_stop_reason("unknown"), StopReason::EndTurn);
    }
}
