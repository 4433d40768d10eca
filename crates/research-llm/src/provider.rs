//! LLM provider trait definition

use crate::{CompletionRequest, CompletionResponse, Result};
use async_trait::async_trait;

/// A chat completion backend
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion for the request's conversation
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Short provider name for logs, e.g. "openai"
    fn name(&self) -> &'static str;
}
