//! LlmClient trait definition

use async_trait::async_trait;
use tracing::debug;

use super::{CompletionRequest, CompletionResponse, Generation, LlmError, RawModelOutput};

/// Stateless LLM client - each call is independent (fresh context)
///
/// Every pipeline stage is a single call; no conversation state is kept
/// between calls, so one client can serve any number of sequential runs.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Whether the provider can constrain output to a JSON schema
    fn supports_structured_output(&self) -> bool {
        false
    }

    /// Model identifier, for logs and reports
    fn model(&self) -> &str;

    /// One request in, text or a schema-conforming value out
    ///
    /// When the request carries an output schema and the provider honoured it,
    /// the structured value is returned; otherwise the raw text. The stop
    /// reason and token usage travel with the output.
    async fn generate(&self, request: CompletionRequest) -> Result<Generation, LlmError> {
        let wants_schema = request.output_schema.is_some();
        debug!(%wants_schema, "LlmClient::generate: called");

        let response = self.complete(request).await?;
        let CompletionResponse {
            content,
            structured,
            stop_reason,
            usage,
        } = response;

        let output = match (structured, content) {
            (Some(value), _) => {
                debug!("LlmClient::generate: structured output");
                RawModelOutput::Structured(value)
            }
            (None, Some(text)) => {
                debug!(text_len = text.len(), "LlmClient::generate: text output");
                RawModelOutput::Text(text)
            }
            (None, None) => {
                debug!("LlmClient::generate: empty response");
                return Err(LlmError::InvalidResponse("Model returned no content".to_string()));
            }
        };

        Ok(Generation {
            output,
            stop_reason,
            usage,
        })
    }
}
