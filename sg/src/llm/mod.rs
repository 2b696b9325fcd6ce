//! LLM Client module for SpecGen
//!
//! Provides the model client trait, provider implementations, and the
//! factory that picks one from configuration.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::HeaderMap;
use tracing::debug;

mod anthropic;
pub mod client;
mod error;
mod openai;
mod types;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use error::LlmError;
pub use openai::OpenAIClient;
pub use types::{
    CompletionRequest, CompletionResponse, Generation, Message, OutputSchema, RawModelOutput, Role, StopReason,
    TokenUsage,
};

use crate::config::{Provider, ResolvedLlmConfig};

/// Default wait suggested to callers when a 429 carries no `retry-after`
const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Create an LLM client for the resolved provider
pub fn create_client(config: &ResolvedLlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    match config.provider {
        Provider::Anthropic => {
            debug!("create_client: creating Anthropic client");
            Ok(Arc::new(AnthropicClient::from_config(config)?))
        }
        Provider::OpenAI | Provider::Gemini => {
            debug!("create_client: creating chat-completions client");
            Ok(Arc::new(OpenAIClient::from_config(config)?))
        }
    }
}

/// Read the `retry-after` header of a rate-limited response
pub(crate) fn retry_after_header(headers: &HeaderMap) -> Duration {
    let secs = headers
        .get("retry-after")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
    Duration::from_secs(secs)
}
