//! SpecGen - feature goals to validated software specifications
//!
//! A single feature goal runs through three sequential model calls:
//!
//! 1. **Decompose**: the goal becomes a list of atomic user needs
//! 2. **Draft**: the needs become a markdown specification with FR/NFR
//!    sections and a Mermaid diagram
//! 3. **Validate**: the draft is audited, corrected, and returned as a
//!    [`SpecificationRecord`]
//!
//! # Modules
//!
//! - [`llm`] - LLM client trait with Anthropic and OpenAI-compatible providers
//! - [`pipeline`] - The three-stage runner
//! - [`extract`] - Recovering JSON from free-form model text
//! - [`prompts`] - Stage prompt templates
//! - [`domain`] - Inputs, the final record, and derived metrics
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod extract;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod render;

// Re-export commonly used types
pub use config::{Config, LlmConfig, Provider, ResolvedLlmConfig};
pub use domain::{FeatureContext, Industry, SpecMetrics, SpecificationRecord, TeamSize, ValidationStatus};
pub use error::{PipelineError, ProviderErrorKind};
pub use extract::{ExtractionError, JsonKind, extract_json};
pub use llm::{
    AnthropicClient, CompletionRequest, CompletionResponse, Generation, LlmClient, LlmError, OpenAIClient,
    OutputSchema, RawModelOutput, StopReason, TokenUsage, create_client,
};
pub use pipeline::{GenerationRun, OutputMode, SpecPipeline, Stage};
pub use prompts::{PromptContext, PromptLoader};
