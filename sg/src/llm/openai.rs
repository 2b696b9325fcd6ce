//! OpenAI-compatible Chat Completions client
//!
//! Serves both OpenAI and Gemini (through Google's OpenAI-compatible
//! endpoint). Structured output uses `response_format: json_schema`; the
//! message content is then parsed into the structured value.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use super::{CompletionRequest, CompletionResponse, LlmClient, LlmError, StopReason, TokenUsage};
use crate::config::ResolvedLlmConfig;

/// OpenAI-compatible API client
pub struct OpenAIClient {
    model: String,
    api_key: String,
    base_url: String,
    http: Client,
    max_tokens: u32,
}

impl OpenAIClient {
    /// Create a new client from resolved configuration
    pub fn from_config(config: &ResolvedLlmConfig) -> Result<Self, LlmError> {
        debug!(?config, "from_config: called");
        let timeout = Duration::from_millis(config.timeout_ms);
        let http = Client::builder().timeout(timeout).build().map_err(LlmError::Network)?;

        Ok(Self {
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            base_url: config.base_url.clone(),
            http,
            max_tokens: config.max_tokens,
        })
    }

    /// Build the request body for the Chat Completions API
    fn build_request_body(&self, request: &CompletionRequest) -> serde_json::Value {
        debug!(%self.model, %request.max_tokens, "build_request_body: called");

        let mut messages = Vec::new();
        if !request.system_prompt.is_empty() {
            messages.push(serde_json::json!({
                "role": "system",
                "content": request.system_prompt,
            }));
        }
        messages.extend(request.messages.iter().map(|msg| {
            serde_json::json!({
                "role": msg.role.as_str(),
                "content": msg.content,
            })
        }));

        let max_tokens = request.max_tokens.min(self.max_tokens);

        // GPT-5.x and o1/o3 models use max_completion_tokens instead of max_tokens
        let uses_completion_tokens =
            self.model.starts_with("gpt-5") || self.model.starts_with("o1") || self.model.starts_with("o3");

        let mut body = serde_json::json!({
            "model": self.model,
            "messages": messages,
        });

        if uses_completion_tokens {
            body["max_completion_tokens"] = serde_json::json!(max_tokens);
        } else {
            body["max_tokens"] = serde_json::json!(max_tokens);
        }

        if let Some(temperature) = request.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }

        if let Some(schema) = &request.output_schema {
            debug!(name = %schema.name, "build_request_body: adding response_format");
            body["response_format"] = schema.to_openai_response_format();
        }

        body
    }

    /// Parse the API response
    fn parse_response(&self, api_response: OpenAIResponse, wants_schema: bool) -> CompletionResponse {
        debug!(choices = api_response.choices.len(), "parse_response: called");
        let usage = api_response
            .usage
            .map(|u| TokenUsage {
                input_tokens: u.prompt_tokens,
                output_tokens: u.completion_tokens,
            })
            .unwrap_or_default();

        let Some(choice) = api_response.choices.into_iter().next() else {
            debug!("parse_response: no choices");
            return CompletionResponse {
                usage,
                ..Default::default()
            };
        };

        let content = choice.message.content;
        let structured = match (&content, wants_schema) {
            (Some(text), true) => match serde_json::from_str::<serde_json::Value>(text) {
                Ok(value) if value.is_object() => Some(value),
                Ok(_) | Err(_) => {
                    warn!("parse_response: schema requested but content is not a JSON object");
                    None
                }
            },
            _ => None,
        };

        CompletionResponse {
            content,
            structured,
            stop_reason: StopReason::from_openai(choice.finish_reason.as_deref()),
            usage,
        }
    }
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        debug!(%self.model, %request.max_tokens, "complete: called");
        let url = format!("{}/chat/completions", self.base_url);
        let body = self.build_request_body(&request);

        let response = self
            .http
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(LlmError::Network)?;

        let status = response.status().as_u16();

        if status == 429 {
            debug!("complete: rate limited (429)");
            return Err(LlmError::RateLimited {
                retry_after: super::retry_after_header(response.headers()),
            });
        }

        if !response.status().is_success() {
            debug!(%status, "complete: API error");
            let text = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError { status, message: text });
        }

        debug!("complete: success");
        let api_response: OpenAIResponse = response.json().await?;
        Ok(self.parse_response(api_response, request.output_schema.is_some()))
    }

    fn supports_structured_output(&self) -> bool {
        true
    }

    fn model(&self) -> &str {
        &self.model
    }
}

// OpenAI API response types

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
    usage: Option<OpenAIUsage>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIUsage {
    prompt_tokens: u64,
    completion_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::OutputSchema;

    fn test_client(model: &str, max_tokens: u32) -> OpenAIClient {
        OpenAIClient {
            model: model.to_string(),
            api_key: "test-key".to_string(),
            base_url: "https://api.openai.com/v1".to_string(),
            http: Client::new(),
            max_tokens,
        }
    }

    #[test]
    fn test_build_request_body_basic() {
        let client = test_client("gpt-4o", 8192);
        let mut request = CompletionRequest::prompt("Hello", 1000);
        request.system_prompt = "You are helpful".to_string();

        let body = client.build_request_body(&request);

        assert_eq!(body["model"], "gpt-4o");
        assert_eq!(body["max_tokens"], 1000);
        assert_eq!(body["messages"][0]["role"], "system");
        assert_eq!(body["messages"][0]["content"], "You are helpful");
        assert_eq!(body["messages"][1]["role"], "user");
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn test_max_tokens_capped() {
        let client = test_client("gpt-4o", 1000);
        let body = client.build_request_body(&CompletionRequest::prompt("Test", 5000));
        assert_eq!(body["max_tokens"], 1000);
    }

    #[test]
    fn test_completion_tokens_for_reasoning_models() {
        let client = test_client("o3-mini", 1000);
        let body = client.build_request_body(&CompletionRequest::prompt("Test", 500));
        assert_eq!(body["max_completion_tokens"], 500);
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn test_build_request_body_with_schema() {
        let client = test_client("gemini-2.5-flash", 8192);
        let schema = OutputSchema::new("specification_record", "Final record", serde_json::json!({"type": "object"}));
        let body = client.build_request_body(&CompletionRequest::prompt("Audit", 1000).with_schema(schema));

        assert_eq!(body["response_format"]["type"], "json_schema");
        assert_eq!(body["response_format"]["json_schema"]["name"], "specification_record");
    }

    #[test]
    fn test_parse_response_structured() {
        let client = test_client("gpt-4o", 1000);
        let raw = serde_json::json!({
            "choices": [{
                "message": {"content": "{\"validation_status\": \"Validated\"}"},
                "finish_reason": "stop"
            }],
            "usage": {"prompt_tokens": 3, "completion_tokens": 4}
        });
        let api_response: OpenAIResponse = serde_json::from_value(raw).unwrap();

        let response = client.parse_response(api_response, true);
        assert_eq!(response.structured.unwrap()["validation_status"], "Validated");
        assert_eq!(response.usage.total(), 7);
    }

    #[test]
    fn test_parse_response_unparseable_structured_keeps_text() {
        let client = test_client("gpt-4o", 1000);
        let raw = serde_json::json!({
            "choices": [{
                "message": {"content": "```json\n{\"a\": 1,}\n```"},
                "finish_reason": "stop"
            }]
        });
        let api_response: OpenAIResponse = serde_json::from_value(raw).unwrap();

        let response = client.parse_response(api_response, true);
        assert!(response.structured.is_none());
        assert!(response.content.unwrap().contains("\"a\": 1"));
    }

    #[test]
    fn test_parse_response_no_choices() {
        let client = test_client("gpt-4o", 1000);
        let api_response: OpenAIResponse = serde_json::from_value(serde_json::json!({"choices": []})).unwrap();
        let response = client.parse_response(api_response, false);
        assert!(response.content.is_none());
    }
}
