//! LLM narratives for stock research reports
//!
//! This crate turns a [`research_core::StockReport`] into a written analysis
//! through any OpenAI-compatible chat endpoint. It includes:
//!
//! - Message and completion types
//! - The [`LLMProvider`] trait
//! - An OpenAI-compatible provider, defaulting to a local Ollama server
//! - [`Narrator`], which renders the report into a prompt and returns the answer

pub mod completion;
pub mod error;
pub mod messages;
pub mod narrative;
pub mod provider;
pub mod providers;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{Message, Role};
pub use narrative::{NarrativeConfig, NarrativeRequest, Narrator};
pub use provider::LLMProvider;
