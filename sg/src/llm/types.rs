//! LLM request/response types for SpecGen
//!
//! Provider-agnostic shapes for one completion call. Each pipeline stage sends
//! exactly one user message; there is no conversation state between calls.

use serde::{Deserialize, Serialize};
use tracing::debug;

/// A completion request - everything needed for one LLM call
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System prompt (may be empty)
    pub system_prompt: String,

    /// User messages (one per stage)
    pub messages: Vec<Message>,

    /// Target schema for constrained output, if any
    pub output_schema: Option<OutputSchema>,

    /// Max tokens for response (capped by the client's configured limit)
    pub max_tokens: u32,

    /// Sampling temperature; provider default when `None`
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// Build a request holding a single user prompt
    pub fn prompt(text: impl Into<String>, max_tokens: u32) -> Self {
        debug!(%max_tokens, "CompletionRequest::prompt: called");
        Self {
            system_prompt: String::new(),
            messages: vec![Message::user(text)],
            output_schema: None,
            max_tokens,
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_schema(mut self, schema: OutputSchema) -> Self {
        self.output_schema = Some(schema);
        self
    }
}

/// A message in the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    /// Create a user message
    pub fn user(text: impl Into<String>) -> Self {
        debug!("Message::user: called");
        Self {
            role: Role::User,
            content: text.into(),
        }
    }
}

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
        }
    }
}

/// Named JSON schema the model output must conform to
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    pub name: String,
    pub description: String,
    pub schema: serde_json::Value,
}

impl OutputSchema {
    /// Create a new output schema
    pub fn new(name: impl Into<String>, description: impl Into<String>, schema: serde_json::Value) -> Self {
        let name = name.into();
        debug!(%name, "OutputSchema::new: called");
        Self {
            name,
            description: description.into(),
            schema,
        }
    }

    /// Anthropic: a tool whose input is the structured value
    pub fn to_anthropic_tool(&self) -> serde_json::Value {
        debug!(%self.name, "OutputSchema::to_anthropic_tool: called");
        serde_json::json!({
            "name": self.name,
            "description": self.description,
            "input_schema": self.schema,
        })
    }

    /// OpenAI-compatible `response_format` block
    pub fn to_openai_response_format(&self) -> serde_json::Value {
        debug!(%self.name, "OutputSchema::to_openai_response_format: called");
        serde_json::json!({
            "type": "json_schema",
            "json_schema": {
                "name": self.name,
                "description": self.description,
                "schema": self.schema,
            }
        })
    }
}

/// Response from a completion request
#[derive(Debug, Clone, Default)]
pub struct CompletionResponse {
    /// Text content (if any)
    pub content: Option<String>,

    /// Value conforming to the requested schema, when the provider produced one
    pub structured: Option<serde_json::Value>,

    /// Why the model stopped
    pub stop_reason: StopReason,

    /// Token usage
    pub usage: TokenUsage,
}

impl CompletionResponse {
    /// Plain text response (handy for mocks)
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Structured response (handy for mocks)
    pub fn structured(value: serde_json::Value) -> Self {
        Self {
            structured: Some(value),
            stop_reason: StopReason::ToolUse,
            ..Default::default()
        }
    }
}

/// What a single `generate` call produced
#[derive(Debug, Clone, PartialEq)]
pub enum RawModelOutput {
    /// Free-form text
    Text(String),
    /// A value already conforming to the requested schema
    Structured(serde_json::Value),
}

impl RawModelOutput {
    /// Text view of the output, for diagnostics
    pub fn to_display_text(&self) -> String {
        match self {
            RawModelOutput::Text(text) => text.clone(),
            RawModelOutput::Structured(value) => value.to_string(),
        }
    }
}

/// One `generate` call: the output plus how the model finished
#[derive(Debug, Clone, PartialEq)]
pub struct Generation {
    pub output: RawModelOutput,
    pub stop_reason: StopReason,
    pub usage: TokenUsage,
}

impl Generation {
    /// The model ran into its token budget before finishing
    pub fn is_truncated(&self) -> bool {
        self.stop_reason == StopReason::MaxTokens
    }
}

/// Why the model stopped generating
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StopReason {
    #[default]
    EndTurn,
    ToolUse,
    MaxTokens,
    StopSequence,
}

impl StopReason {
    /// Parse from Anthropic API stop_reason string
    pub fn from_anthropic(s: &str) -> Self {
        debug!(%s, "StopReason::from_anthropic: called");
        match s {
            "end_turn" => StopReason::EndTurn,
            "tool_use" => StopReason::ToolUse,
            "max_tokens" => StopReason::MaxTokens,
            "stop_sequence" => StopReason::StopSequence,
            _ => {
                debug!("StopReason::from_anthropic: unknown, defaulting to EndTurn");
                StopReason::EndTurn
            }
        }
    }

    /// Parse from OpenAI finish_reason string
    pub fn from_openai(s: Option<&str>) -> Self {
        debug!(?s, "StopReason::from_openai: called");
        match s {
            Some("tool_calls") => StopReason::ToolUse,
            Some("length") => StopReason::MaxTokens,
            _ => StopReason::EndTurn,
        }
    }
}

/// Token usage
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

impl TokenUsage {
    pub fn total(&self) -> u64 {
        self.input_tokens + self.output_tokens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_user() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");
    }

    #[test]
    fn test_prompt_request() {
        let req = CompletionRequest::prompt("Decompose this", 4096).with_temperature(0.3);
        assert_eq!(req.messages.len(), 1);
        assert_eq!(req.messages[0].role, Role::User);
        assert_eq!(req.temperature, Some(0.3));
        assert!(req.output_schema.is_none());
    }

    #[test]
    fn test_stop_reason_from_anthropic() {
        assert_eq!(StopReason::from_anthropic("end_turn"), StopReason::EndTurn);
        assert_eq!(StopReason::from_anthropic("tool_use"), StopReason::ToolUse);
        assert_eq!(StopReason::from_anthropic("max_tokens"), StopReason::MaxTokens);
        assert_eq!(StopReason::from_anthropic("stop_sequence"), StopReason::StopSequence);
        assert_eq!(StopReason::from_anthropic("unknown"), StopReason::EndTurn);
    }

    #[test]
    fn test_stop_reason_from_openai() {
        assert_eq!(StopReason::from_openai(Some("stop")), StopReason::EndTurn);
        assert_eq!(StopReason::from_openai(Some("length")), StopReason::MaxTokens);
        assert_eq!(StopReason::from_openai(None), StopReason::EndTurn);
    }

    #[test]
    fn test_output_schema_formats() {
        let schema = OutputSchema::new(
            "record",
            "Final record",
            serde_json::json!({"type": "object", "properties": {"a": {"type": "string"}}}),
        );

        let tool = schema.to_anthropic_tool();
        assert_eq!(tool["name"], "record");
        assert!(tool["input_schema"].is_object());

        let format = schema.to_openai_response_format();
        assert_eq!(format["type"], "json_schema");
        assert_eq!(format["json_schema"]["name"], "record");
        assert_eq!(format["json_schema"]["schema"]["type"], "object");
    }

    #[test]
    fn test_generation_truncation() {
        let generation = Generation {
            output: RawModelOutput::Text("[\"As a user".to_string()),
            stop_reason: StopReason::MaxTokens,
            usage: TokenUsage {
                input_tokens: 120,
                output_tokens: 2048,
            },
        };
        assert!(generation.is_truncated());
        assert_eq!(generation.usage.total(), 2168);

        let finished = Generation {
            stop_reason: StopReason::EndTurn,
            ..generation
        };
        assert!(!finished.is_truncated());
    }
}
