//! Pipeline error taxonomy

use std::fmt;

use thiserror::Error;

use crate::extract::ExtractionError;
use crate::llm::LlmError;
use crate::pipeline::Stage;

/// User-facing category of a provider failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    RateLimited,
    ModelUnavailable,
    Unauthorized,
    Unknown,
}

impl ProviderErrorKind {
    /// Classify an LLM error by status code first, then by message
    pub fn classify(error: &LlmError) -> Self {
        match error.status() {
            Some(429) => return ProviderErrorKind::RateLimited,
            Some(404) => return ProviderErrorKind::ModelUnavailable,
            Some(401) | Some(403) => return ProviderErrorKind::Unauthorized,
            _ => {}
        }

        let message = match error {
            LlmError::ApiError { message, .. } => message.to_lowercase(),
            LlmError::Network(e) => e.to_string().to_lowercase(),
            _ => return ProviderErrorKind::Unknown,
        };

        if message.contains("quota") || message.contains("rate limit") {
            ProviderErrorKind::RateLimited
        } else if message.contains("not found") {
            ProviderErrorKind::ModelUnavailable
        } else if message.contains("unauthorized") || message.contains("invalid") {
            ProviderErrorKind::Unauthorized
        } else {
            ProviderErrorKind::Unknown
        }
    }

    /// Short headline for display
    pub fn headline(&self) -> &'static str {
        match self {
            ProviderErrorKind::RateLimited => "API rate limit reached",
            ProviderErrorKind::ModelUnavailable => "Model not available",
            ProviderErrorKind::Unauthorized => "Invalid API key",
            ProviderErrorKind::Unknown => "Generation failed",
        }
    }

    /// What the user can do about it
    pub fn advice(&self) -> &'static str {
        match self {
            ProviderErrorKind::RateLimited => "The provider is throttling requests. Wait a minute and try again.",
            ProviderErrorKind::ModelUnavailable => {
                "The configured model is unavailable. Check the model name or try again shortly."
            }
            ProviderErrorKind::Unauthorized => {
                "The API key was rejected. Generate a new key and update the configured environment variable."
            }
            ProviderErrorKind::Unknown => "An unexpected error occurred. Please try again.",
        }
    }
}

impl fmt::Display for ProviderErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.headline())
    }
}

/// Errors that abort a pipeline run
///
/// Any stage error stops the run; later stages never execute.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The caller supplied unusable input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Missing or invalid credential/provider settings
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The model provider failed the request
    #[error("{stage} stage failed: {source}")]
    Provider {
        stage: Stage,
        #[source]
        source: LlmError,
    },

    /// The decompose stage produced no usable list of user needs
    #[error("Decompose stage output could not be parsed: {reason}")]
    DecompositionParse {
        reason: String,
        raw: String,
        truncated: bool,
        #[source]
        source: Option<ExtractionError>,
    },

    /// The validate stage produced no usable record
    #[error("Validate stage output could not be parsed: {reason}")]
    ValidationParse {
        reason: String,
        raw: String,
        truncated: bool,
        #[source]
        source: Option<ExtractionError>,
    },
}

impl PipelineError {
    /// Stage the error came from, if any
    pub fn stage(&self) -> Option<Stage> {
        match self {
            PipelineError::Provider { stage, .. } => Some(*stage),
            PipelineError::DecompositionParse { .. } => Some(Stage::Decompose),
            PipelineError::ValidationParse { .. } => Some(Stage::Validate),
            PipelineError::InvalidInput(_) | PipelineError::Configuration(_) => None,
        }
    }

    /// Raw model text kept for diagnostics
    pub fn raw_output(&self) -> Option<&str> {
        match self {
            PipelineError::DecompositionParse { raw, .. } | PipelineError::ValidationParse { raw, .. } => Some(raw),
            _ => None,
        }
    }

    /// Provider failure category, for provider errors
    pub fn provider_kind(&self) -> Option<ProviderErrorKind> {
        match self {
            PipelineError::Provider { source, .. } => Some(ProviderErrorKind::classify(source)),
            _ => None,
        }
    }

    /// Underlying extraction failure, for parse errors
    pub fn extraction(&self) -> Option<&ExtractionError> {
        match self {
            PipelineError::DecompositionParse { source, .. } | PipelineError::ValidationParse { source, .. } => {
                source.as_ref()
            }
            _ => None,
        }
    }

    /// Whether a parse error followed a reply cut off at the token limit
    pub fn is_truncated(&self) -> bool {
        matches!(
            self,
            PipelineError::DecompositionParse { truncated: true, .. }
                | PipelineError::ValidationParse { truncated: true, .. }
        )
    }

    /// Mark a parse error as caused by a reply that hit `max_tokens`
    pub fn truncated_at(self, max_tokens: u32) -> Self {
        match self {
            PipelineError::DecompositionParse { reason, raw, source, .. } => PipelineError::DecompositionParse {
                reason: format!("response truncated at max tokens ({}): {}", max_tokens, reason),
                raw,
                truncated: true,
                source,
            },
            PipelineError::ValidationParse { reason, raw, source, .. } => PipelineError::ValidationParse {
                reason: format!("response truncated at max tokens ({}): {}", max_tokens, reason),
                raw,
                truncated: true,
                source,
            },
            other => other,
        }
    }

    pub fn is_parse_error(&self) -> bool {
        matches!(
            self,
            PipelineError::DecompositionParse { .. } | PipelineError::ValidationParse { .. }
        )
    }
}
