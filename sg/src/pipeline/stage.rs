//! Stage identities and validate-stage output modes

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// One of the three sequential model invocations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Decompose,
    Draft,
    Validate,
}

impl Stage {
    /// All stages in execution order
    pub const ALL: [Stage; 3] = [Stage::Decompose, Stage::Draft, Stage::Validate];

    pub fn name(&self) -> &'static str {
        match self {
            Stage::Decompose => "Decompose",
            Stage::Draft => "Draft",
            Stage::Validate => "Validate",
        }
    }

    /// Prompt template rendered for this stage
    pub fn template_name(&self) -> &'static str {
        match self {
            Stage::Decompose => "decompose",
            Stage::Draft => "draft",
            Stage::Validate => "validate",
        }
    }

    /// Lower for stages whose output must be more deterministic
    pub fn temperature(&self) -> f32 {
        match self {
            Stage::Decompose => 0.3,
            Stage::Draft => 0.2,
            Stage::Validate => 0.1,
        }
    }

    /// Response budget requested for the stage
    pub fn max_tokens(&self) -> u32 {
        match self {
            Stage::Decompose => 2048,
            Stage::Draft => 8192,
            Stage::Validate => 16384,
        }
    }

    /// 1-based position, for progress display
    pub fn number(&self) -> usize {
        match self {
            Stage::Decompose => 1,
            Stage::Draft => 2,
            Stage::Validate => 3,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// How the validate stage obtains its record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Structured when the client supports it, otherwise extracted
    #[default]
    Auto,
    /// Ask the provider for schema-constrained output
    Structured,
    /// Free text followed by JSON extraction
    Extracted,
}

impl OutputMode {
    /// Pick the concrete mode for a client
    ///
    /// Never returns `Auto`. An explicit `Structured` request against a client
    /// without the capability degrades to `Extracted`.
    pub fn resolve(self, supports_structured: bool) -> OutputMode {
        let resolved = match self {
            OutputMode::Auto | OutputMode::Structured if supports_structured => OutputMode::Structured,
            _ => OutputMode::Extracted,
        };
        debug!(requested = ?self, %supports_structured, ?resolved, "OutputMode::resolve: called");
        resolved
    }
}

impl fmt::Display for OutputMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            OutputMode::Auto => "auto",
            OutputMode::Structured => "structured",
            OutputMode::Extracted => "extracted",
        };
        write!(f, "{}", name)
    }
}
