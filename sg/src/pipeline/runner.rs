//! SpecPipeline - decompose, draft and validate in strict sequence
//!
//! Each stage is one stateless model call. A stage never starts before the
//! previous stage's output is available, and any stage error ends the run.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::{OutputMode, Stage};
use crate::domain::{FeatureContext, SpecificationRecord, ValidationStatus};
use crate::error::PipelineError;
use crate::extract::{JsonKind, extract_json};
use crate::llm::{CompletionRequest, Generation, LlmClient, OutputSchema, RawModelOutput};
use crate::prompts::{PromptContext, PromptLoader};

/// Fewest user needs a decomposition may yield
pub const MIN_USER_NEEDS: usize = 3;

/// Most user needs the decompose prompt asks for
pub const MAX_USER_NEEDS: usize = 8;

/// Name of the schema handed to providers in structured mode
pub const RECORD_SCHEMA_NAME: &str = "specification_record";

/// Result of one complete run
#[derive(Debug, Clone)]
pub struct GenerationRun {
    /// The final record
    pub record: SpecificationRecord,
    /// Stage 2 output, before any audit corrections
    pub draft_markdown: String,
    /// Stage 2 hit its token limit, so the draft may end mid-sentence
    pub draft_truncated: bool,
    /// Model that served the run
    pub model: String,
    /// The concrete mode the validate stage used
    pub output_mode: OutputMode,
    /// Wall-clock time for all three stages
    pub elapsed: Duration,
}

/// Stage 2 output
#[derive(Debug, Clone, PartialEq)]
pub struct Draft {
    pub markdown: String,
    /// The model stopped at the token limit
    pub truncated: bool,
}

/// Fields the validate stage must produce
#[derive(Debug, Deserialize)]
struct ValidationPayload {
    detailed_spec_markdown: String,
    validation_status: String,
    validation_critique: String,
}

/// Schema for the validate stage's structured output
pub fn record_schema() -> OutputSchema {
    OutputSchema::new(
        RECORD_SCHEMA_NAME,
        "Submit the audited specification. Call this once with the corrected document.",
        serde_json::json!({
            "type": "object",
            "properties": {
                "detailed_spec_markdown": {
                    "type": "string",
                    "description": "The complete, corrected specification in Markdown, including FR/NFR sections and the Mermaid diagram"
                },
                "validation_status": {
                    "type": "string",
                    "enum": [ValidationStatus::VALIDATED, ValidationStatus::NEEDS_REVISION],
                    "description": "Final audit status"
                },
                "validation_critique": {
                    "type": "string",
                    "description": "Checks performed (testability, consistency, completeness, format), flaws found and corrections made"
                }
            },
            "required": ["detailed_spec_markdown", "validation_status", "validation_critique"]
        }),
    )
}

/// Runs the three stages against one model client
pub struct SpecPipeline {
    llm: Arc<dyn LlmClient>,
    prompts: PromptLoader,
    output_mode: OutputMode,
}

impl SpecPipeline {
    /// Create a pipeline in `auto` output mode
    pub fn new(llm: Arc<dyn LlmClient>, prompts: PromptLoader) -> Self {
        debug!(model = %llm.model(), "SpecPipeline::new: called");
        Self {
            llm,
            prompts,
            output_mode: OutputMode::default(),
        }
    }

    pub fn with_output_mode(mut self, output_mode: OutputMode) -> Self {
        self.output_mode = output_mode;
        self
    }

    /// Mode the validate stage will actually use with this client
    pub fn effective_output_mode(&self) -> OutputMode {
        self.output_mode.resolve(self.llm.supports_structured_output())
    }

    /// Turn a feature goal into a validated specification record
    pub async fn run(&self, goal: &str, context: &FeatureContext) -> Result<GenerationRun, PipelineError> {
        let goal = goal.trim();
        if goal.is_empty() {
            return Err(PipelineError::InvalidInput("Feature goal must not be empty".to_string()));
        }

        let started = Instant::now();
        info!(model = %self.llm.model(), goal_len = goal.len(), "Starting specification run");

        let needs = self.decompose(goal, context).await?;
        let draft = self.draft(&needs, context).await?;
        let record = self.validate(goal, &needs, &draft.markdown).await?;

        let elapsed = started.elapsed();
        info!(
            status = %record.validation_status,
            elapsed_ms = elapsed.as_millis() as u64,
            "Specification run complete"
        );

        Ok(GenerationRun {
            record,
            draft_markdown: draft.markdown,
            draft_truncated: draft.truncated,
            model: self.llm.model().to_string(),
            output_mode: self.effective_output_mode(),
            elapsed,
        })
    }

    /// Stage 1: feature goal to user needs
    pub async fn decompose(&self, goal: &str, context: &FeatureContext) -> Result<Vec<String>, PipelineError> {
        let stage = Stage::Decompose;
        info!(stage = %stage, "Stage {}/{}: decomposing goal into user needs", stage.number(), Stage::ALL.len());

        let prompt = self.render(stage, &PromptContext::decompose(goal, context))?;
        let generation = self.call(stage, self.request(stage, prompt)).await?;
        let truncated = generation.is_truncated();

        let needs = match generation.output {
            RawModelOutput::Structured(value @ Value::Array(_)) => user_needs_from_value(value, String::new()),
            other => parse_user_needs(&other.to_display_text()),
        }
        .map_err(|e| if truncated { e.truncated_at(stage.max_tokens()) } else { e })?;

        info!(stage = %stage, need_count = needs.len(), "Decomposed goal into {} user needs", needs.len());
        Ok(needs)
    }

    /// Stage 2: user needs to draft markdown
    pub async fn draft(&self, needs: &[String], context: &FeatureContext) -> Result<Draft, PipelineError> {
        let stage = Stage::Draft;
        info!(stage = %stage, "Stage {}/{}: drafting specification", stage.number(), Stage::ALL.len());

        let prompt = self.render(stage, &PromptContext::draft(needs, context))?;
        let generation = self.call(stage, self.request(stage, prompt)).await?;
        let draft = Draft {
            truncated: generation.is_truncated(),
            markdown: generation.output.to_display_text(),
        };

        if draft.markdown.trim().is_empty() {
            warn!(stage = %stage, "Draft stage returned empty markdown");
        }
        if draft.truncated {
            warn!(
                stage = %stage,
                max_tokens = stage.max_tokens(),
                "Draft hit the token limit; the specification may be incomplete"
            );
        }
        info!(stage = %stage, draft_len = draft.markdown.len(), "Draft complete");
        Ok(draft)
    }

    /// Stage 3: audit the draft and build the record
    pub async fn validate(&self, goal: &str, needs: &[String], draft: &str) -> Result<SpecificationRecord, PipelineError> {
        let stage = Stage::Validate;
        let mode = self.effective_output_mode();
        info!(
            stage = %stage,
            mode = %mode,
            "Stage {}/{}: validating specification",
            stage.number(),
            Stage::ALL.len()
        );

        let prompt = self.render(stage, &PromptContext::validate(draft))?;
        let mut request = self.request(stage, prompt);
        if mode == OutputMode::Structured {
            request = request.with_schema(record_schema());
        }

        let generation = self.call(stage, request).await?;
        let truncated = generation.is_truncated();

        let record = validation_record(goal, needs, draft, mode, generation.output)
            .map_err(|e| if truncated { e.truncated_at(stage.max_tokens()) } else { e })?;
        info!(stage = %stage, status = %record.validation_status, "Validation complete");
        Ok(record)
    }

    fn render(&self, stage: Stage, context: &PromptContext) -> Result<String, PipelineError> {
        self.prompts
            .render(stage.template_name(), context)
            .map_err(|e| PipelineError::Configuration(format!("{:#}", e)))
    }

    fn request(&self, stage: Stage, prompt: String) -> CompletionRequest {
        CompletionRequest::prompt(prompt, stage.max_tokens()).with_temperature(stage.temperature())
    }

    async fn call(&self, stage: Stage, request: CompletionRequest) -> Result<Generation, PipelineError> {
        debug!(stage = %stage, "SpecPipeline::call: called");
        let generation = self.llm.generate(request).await.map_err(|source| {
            warn!(stage = %stage, error = %source, "Model call failed");
            PipelineError::Provider { stage, source }
        })?;

        info!(
            stage = %stage,
            input_tokens = generation.usage.input_tokens,
            output_tokens = generation.usage.output_tokens,
            total_tokens = generation.usage.total(),
            stop_reason = ?generation.stop_reason,
            "Model call finished"
        );
        Ok(generation)
    }
}

fn validation_record(
    goal: &str,
    needs: &[String],
    draft: &str,
    mode: OutputMode,
    output: RawModelOutput,
) -> Result<SpecificationRecord, PipelineError> {
    let (payload, raw) = match output {
        RawModelOutput::Structured(value) => {
            debug!("validation_record: structured output");
            let raw = value.to_string();
            (value, raw)
        }
        RawModelOutput::Text(text) => {
            if mode == OutputMode::Structured {
                warn!("Structured output requested but model answered with text; extracting");
            }
            let value = extract_json(&text, JsonKind::Object).map_err(|e| PipelineError::ValidationParse {
                reason: e.to_string(),
                raw: text.clone(),
                truncated: false,
                source: Some(e),
            })?;
            (value, text)
        }
    };

    build_record(goal, needs, draft, payload, raw)
}

/// Recover the list of user needs from decompose-stage text
pub fn parse_user_needs(text: &str) -> Result<Vec<String>, PipelineError> {
    debug!(text_len = text.len(), "parse_user_needs: called");
    let value = extract_json(text, JsonKind::Array).map_err(|e| PipelineError::DecompositionParse {
        reason: e.to_string(),
        raw: text.to_string(),
        truncated: false,
        source: Some(e),
    })?;
    user_needs_from_value(value, text.to_string())
}

fn user_needs_from_value(value: Value, raw: String) -> Result<Vec<String>, PipelineError> {
    let fail = |reason: String, raw: String| PipelineError::DecompositionParse {
        reason,
        raw,
        truncated: false,
        source: None,
    };

    let Value::Array(items) = value else {
        return Err(fail("expected a JSON array of strings".to_string(), raw));
    };

    let mut needs = Vec::with_capacity(items.len());
    for (idx, item) in items.iter().enumerate() {
        let Some(need) = item.as_str() else {
            return Err(fail(format!("element {} is not a string: {}", idx, item), raw));
        };
        let need = need.trim();
        if !need.is_empty() {
            needs.push(need.to_string());
        }
    }

    if needs.len() < MIN_USER_NEEDS {
        return Err(fail(
            format!("expected at least {} user needs, got {}", MIN_USER_NEEDS, needs.len()),
            raw,
        ));
    }
    if needs.len() > MAX_USER_NEEDS {
        warn!(need_count = needs.len(), "Decomposition produced more user needs than requested");
    }

    Ok(needs)
}

/// Assemble the final record from the validate-stage payload
///
/// The goal and user needs always come from the run itself; any echo of them
/// in the payload is ignored.
fn build_record(
    goal: &str,
    needs: &[String],
    draft: &str,
    payload: Value,
    raw: String,
) -> Result<SpecificationRecord, PipelineError> {
    debug!("build_record: called");
    let payload: ValidationPayload = serde_json::from_value(payload).map_err(|e| PipelineError::ValidationParse {
        reason: format!("invalid record: {}", e),
        raw,
        truncated: false,
        source: None,
    })?;

    let detailed_spec_markdown = if payload.detailed_spec_markdown.trim().is_empty() {
        warn!("Validator returned empty markdown; keeping the draft");
        draft.to_string()
    } else {
        payload.detailed_spec_markdown
    };

    Ok(SpecificationRecord {
        feature_goal: goal.to_string(),
        high_level_stories: needs.to_vec(),
        detailed_spec_markdown,
        validation_status: ValidationStatus::normalize(&payload.validation_status),
        validation_critique: payload.validation_critique,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProviderErrorKind;
    use crate::llm::{CompletionResponse, StopReason};
    use crate::llm::client::mock::MockLlmClient;

    const GOAL: &str = "Build a login page";

    const DECOMPOSE_REPLY: &str = "Here are the user needs:\n```json\n[\n  \"As a user, I want to sign in with my email and password\",\n  \"As a user, I want to see a clear error when my credentials are wrong\",\n  \"As a user, I want to reset my password if I forget it\",\n]\n```\n";

    const DRAFT_REPLY: &str = "# Login Page Specification\n\n## 3.1 Functional Requirements\n- FR-001 Email and password sign-in\n- FR-002 Error on invalid credentials\n- FR-003 Password reset link\n\n## 3.2 Non-Functional Requirements\n- NFR-001 Sign-in responds within 500 ms\n\n## 4. Feature Flow Diagram\n```mermaid\nflowchart TD\n  A[Login form] --> B{Valid?}\n```\n";

    fn validate_reply(status: &str) -> String {
        let record = serde_json::json!({
            "detailed_spec_markdown": DRAFT_REPLY,
            "validation_status": status,
            "validation_critique": "Checked testability, consistency, completeness and format.",
        });
        format!("Audit finished.\n```json\n{}\n```", serde_json::to_string_pretty(&record).unwrap())
    }

    fn build_pipeline(client: MockLlmClient) -> (Arc<MockLlmClient>, SpecPipeline) {
        let client = Arc::new(client);
        let pipeline = SpecPipeline::new(client.clone(), PromptLoader::embedded_only());
        (client, pipeline)
    }

    fn prompt_text(request: &CompletionRequest) -> &str {
        &request.messages[0].content
    }

    #[tokio::test]
    async fn test_login_page_end_to_end() {
        let validate = validate_reply("Validated");
        let (client, pipeline) = build_pipeline(MockLlmClient::with_texts(&[DECOMPOSE_REPLY, DRAFT_REPLY, &validate]));

        let run = pipeline.run(GOAL, &FeatureContext::default()).await.unwrap();
        let record = &run.record;

        assert_eq!(record.feature_goal, GOAL);
        assert_eq!(record.high_level_stories.len(), 3);
        assert!(record.high_level_stories[0].starts_with("As a user, I want"));
        assert!(record.detailed_spec_markdown.contains("FR-001"));
        assert_eq!(record.validation_status, ValidationStatus::Validated);
        assert!(!record.validation_critique.is_empty());
        assert_eq!(run.draft_markdown, DRAFT_REPLY);
        assert_eq!(run.model, "mock-model");
        assert_eq!(run.output_mode, OutputMode::Extracted);

        assert_eq!(client.call_count(), 3);
        let requests = client.requests();
        assert!(prompt_text(&requests[0]).contains(GOAL));
        assert!(prompt_text(&requests[0]).contains("Include security requirements"));
        assert!(prompt_text(&requests[1]).contains("reset my password if I forget it"));
        assert!(prompt_text(&requests[2]).contains("flowchart TD"));
        let temps: Vec<Option<f32>> = requests.iter().map(|r| r.temperature).collect();
        assert_eq!(temps, vec![Some(0.3), Some(0.2), Some(0.1)]);
        assert!(requests.iter().all(|r| r.output_schema.is_none()));
    }

    #[tokio::test]
    async fn test_needs_revision_is_a_valid_outcome() {
        let validate = validate_reply("Needs Revision");
        let (_, pipeline) = build_pipeline(MockLlmClient::with_texts(&[DECOMPOSE_REPLY, DRAFT_REPLY, &validate]));

        let run = pipeline.run(GOAL, &FeatureContext::bare()).await.unwrap();

        assert_eq!(run.record.validation_status, ValidationStatus::NeedsRevision);
        let json = serde_json::to_value(&run.record).unwrap();
        assert_eq!(json["validation_status"], "Needs Revision");
    }

    #[tokio::test]
    async fn test_no_array_stops_after_first_call() {
        let (client, pipeline) = build_pipeline(MockLlmClient::with_texts(&[
            "I would be happy to help, but I need more details.",
            DRAFT_REPLY,
        ]));

        let err = pipeline.run(GOAL, &FeatureContext::default()).await.unwrap_err();

        assert!(matches!(err, PipelineError::DecompositionParse { .. }));
        assert_eq!(err.raw_output(), Some("I would be happy to help, but I need more details."));
        assert!(err.extraction().unwrap().is_missing_delimiter());
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_too_few_needs_is_parse_error() {
        let (client, pipeline) = build_pipeline(MockLlmClient::with_texts(&[r#"["As a user, I want one thing", "   ", ""]"#]));

        let err = pipeline.run(GOAL, &FeatureContext::default()).await.unwrap_err();

        match err {
            PipelineError::DecompositionParse { reason, .. } => assert!(reason.contains("at least 3")),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(client.call_count(), 1);
    }

    #[test]
    fn test_parse_user_needs_rejects_non_strings() {
        let err = parse_user_needs(r#"["As a user, I want a", 2, "As a user, I want c"]"#).unwrap_err();
        match err {
            PipelineError::DecompositionParse { reason, source, .. } => {
                assert!(reason.contains("element 1"));
                assert!(source.is_none());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_parse_user_needs_trims_entries() {
        let needs = parse_user_needs(r#"[" As a user, I want a ", "As a user, I want b", "As a user, I want c"]"#).unwrap();
        assert_eq!(needs[0], "As a user, I want a");
    }

    #[tokio::test]
    async fn test_structured_mode_sends_schema() {
        let value = serde_json::json!({
            "detailed_spec_markdown": "# Corrected\n- FR-001 Sign in",
            "validation_status": "Validated",
            "validation_critique": "Added missing acceptance criteria.",
        });
        let client = MockLlmClient::new(vec![
            CompletionResponse::text(DECOMPOSE_REPLY),
            CompletionResponse::text(DRAFT_REPLY),
            CompletionResponse::structured(value),
        ])
        .structured();
        let (client, pipeline) = build_pipeline(client);

        let run = pipeline.run(GOAL, &FeatureContext::default()).await.unwrap();

        assert_eq!(run.output_mode, OutputMode::Structured);
        assert_eq!(run.record.detailed_spec_markdown, "# Corrected\n- FR-001 Sign in");
        let requests = client.requests();
        assert!(requests[0].output_schema.is_none());
        assert!(requests[1].output_schema.is_none());
        assert_eq!(requests[2].output_schema.as_ref().unwrap().name, RECORD_SCHEMA_NAME);
    }

    #[tokio::test]
    async fn test_structured_mode_falls_back_to_extraction() {
        let validate = validate_reply("Validated");
        let client = MockLlmClient::with_texts(&[DECOMPOSE_REPLY, DRAFT_REPLY, &validate]).structured();
        let (_, pipeline) = build_pipeline(client);

        let run = pipeline.run(GOAL, &FeatureContext::default()).await.unwrap();
        assert_eq!(run.record.validation_status, ValidationStatus::Validated);
    }

    #[tokio::test]
    async fn test_extracted_mode_overrides_capability() {
        let validate = validate_reply("Validated");
        let client = MockLlmClient::with_texts(&[DECOMPOSE_REPLY, DRAFT_REPLY, &validate]).structured();
        let (client, pipeline) = build_pipeline(client);
        let pipeline = pipeline.with_output_mode(OutputMode::Extracted);

        let run = pipeline.run(GOAL, &FeatureContext::default()).await.unwrap();

        assert_eq!(run.output_mode, OutputMode::Extracted);
        assert!(client.requests()[2].output_schema.is_none());
    }

    #[tokio::test]
    async fn test_missing_required_field_is_validation_parse_error() {
        let (_, pipeline) = build_pipeline(MockLlmClient::with_texts(&[
            DECOMPOSE_REPLY,
            DRAFT_REPLY,
            r#"{"validation_status": "Validated", "validation_critique": "ok"}"#,
        ]));

        let err = pipeline.run(GOAL, &FeatureContext::default()).await.unwrap_err();

        match &err {
            PipelineError::ValidationParse { reason, raw, .. } => {
                assert!(reason.contains("detailed_spec_markdown"));
                assert!(raw.contains("validation_critique"));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(err.stage(), Some(Stage::Validate));
    }

    #[tokio::test]
    async fn test_validate_without_object_is_parse_error() {
        let (_, pipeline) = build_pipeline(MockLlmClient::with_texts(&[
            DECOMPOSE_REPLY,
            DRAFT_REPLY,
            "The specification looks complete.",
        ]));

        let err = pipeline.run(GOAL, &FeatureContext::default()).await.unwrap_err();

        assert!(matches!(err, PipelineError::ValidationParse { .. }));
        assert!(err.extraction().unwrap().is_missing_delimiter());
    }

    #[tokio::test]
    async fn test_empty_markdown_falls_back_to_draft() {
        let reply = r#"{"detailed_spec_markdown": "  ", "validation_status": "validated.", "validation_critique": "fine"}"#;
        let (_, pipeline) = build_pipeline(MockLlmClient::with_texts(&[DECOMPOSE_REPLY, DRAFT_REPLY, reply]));

        let run = pipeline.run(GOAL, &FeatureContext::default()).await.unwrap();

        assert_eq!(run.record.detailed_spec_markdown, DRAFT_REPLY);
        assert_eq!(run.record.validation_status, ValidationStatus::Validated);
    }

    #[tokio::test]
    async fn test_validator_echo_is_ignored() {
        let reply = serde_json::json!({
            "feature_goal": "Something else entirely",
            "high_level_stories": ["As a user, I want nothing"],
            "detailed_spec_markdown": "# Spec",
            "validation_status": "Validated",
            "validation_critique": "ok",
        })
        .to_string();
        let (_, pipeline) = build_pipeline(MockLlmClient::with_texts(&[DECOMPOSE_REPLY, DRAFT_REPLY, &reply]));

        let run = pipeline.run(GOAL, &FeatureContext::default()).await.unwrap();

        assert_eq!(run.record.feature_goal, GOAL);
        assert_eq!(run.record.high_level_stories.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_goal_makes_no_calls() {
        let (client, pipeline) = build_pipeline(MockLlmClient::with_texts(&[DECOMPOSE_REPLY]));

        let err = pipeline.run("   \n", &FeatureContext::default()).await.unwrap_err();

        assert!(matches!(err, PipelineError::InvalidInput(_)));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_provider_error_carries_stage_and_kind() {
        let (client, pipeline) = build_pipeline(MockLlmClient::with_results(vec![
            Ok(CompletionResponse::text(DECOMPOSE_REPLY)),
            Err("Quota exceeded for this project".to_string()),
        ]));

        let err = pipeline.run(GOAL, &FeatureContext::default()).await.unwrap_err();

        assert_eq!(err.stage(), Some(Stage::Draft));
        assert_eq!(err.provider_kind(), Some(ProviderErrorKind::RateLimited));
        assert_eq!(client.call_count(), 2);
    }

    fn truncated(text: &str) -> CompletionResponse {
        CompletionResponse {
            stop_reason: StopReason::MaxTokens,
            ..CompletionResponse::text(text)
        }
    }

    #[tokio::test]
    async fn test_truncated_decompose_marks_parse_error() {
        let (client, pipeline) = build_pipeline(MockLlmClient::new(vec![truncated(
            "[\"As a user, I want to sign in\", \"As a user, I want to",
        )]));

        let err = pipeline.run(GOAL, &FeatureContext::default()).await.unwrap_err();

        assert!(matches!(err, PipelineError::DecompositionParse { truncated: true, .. }));
        assert!(err.to_string().contains("response truncated at max tokens (2048)"));
        assert_eq!(client.call_count(), 1);
    }

    #[tokio::test]
    async fn test_truncated_validate_marks_parse_error() {
        let (_, pipeline) = build_pipeline(MockLlmClient::new(vec![
            CompletionResponse::text(DECOMPOSE_REPLY),
            CompletionResponse::text(DRAFT_REPLY),
            truncated("{\"detailed_spec_markdown\": \"# Spec\\n- FR-001 sign in, cut off"),
        ]));

        let err = pipeline.run(GOAL, &FeatureContext::default()).await.unwrap_err();

        assert!(matches!(err, PipelineError::ValidationParse { truncated: true, .. }));
        assert!(err.raw_output().unwrap().contains("cut off"));
    }

    #[tokio::test]
    async fn test_truncated_draft_is_flagged_on_run() {
        let validate = validate_reply("Validated");
        let (_, pipeline) = build_pipeline(MockLlmClient::new(vec![
            CompletionResponse::text(DECOMPOSE_REPLY),
            truncated("# Login Page Specification\n- FR-001 Sig"),
            CompletionResponse::text(validate),
        ]));

        let run = pipeline.run(GOAL, &FeatureContext::default()).await.unwrap();

        assert!(run.draft_truncated);
        assert_eq!(run.record.validation_status, ValidationStatus::Validated);
    }

    #[tokio::test]
    async fn test_untruncated_parse_error_is_not_flagged() {
        let (_, pipeline) = build_pipeline(MockLlmClient::with_texts(&["no list here"]));

        let err = pipeline.run(GOAL, &FeatureContext::default()).await.unwrap_err();
        assert!(!err.is_truncated());
    }

    #[test]
    fn test_record_schema_requires_payload_fields() {
        let schema = record_schema();
        let required = schema.schema["required"].as_array().unwrap();
        assert_eq!(required.len(), 3);
        assert_eq!(
            schema.schema["properties"]["validation_status"]["enum"][1],
            "Needs Revision"
        );
    }
}
