//! The final specification record

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Final audit status of a specification
///
/// Exactly two canonical forms. Anything the model writes other than
/// "Validated" (ignoring case, surrounding whitespace and trailing
/// punctuation) is treated as [`ValidationStatus::NeedsRevision`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValidationStatus {
    Validated,
    NeedsRevision,
}

impl ValidationStatus {
    pub const VALIDATED: &'static str = "Validated";
    pub const NEEDS_REVISION: &'static str = "Needs Revision";

    /// Normalize free model text to a canonical status
    pub fn normalize(raw: &str) -> Self {
        let cleaned = raw
            .trim()
            .trim_end_matches(|c: char| c.is_ascii_punctuation() || c.is_whitespace());
        if cleaned.eq_ignore_ascii_case(Self::VALIDATED) {
            ValidationStatus::Validated
        } else {
            debug!(%raw, "ValidationStatus::normalize: treating as NeedsRevision");
            ValidationStatus::NeedsRevision
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ValidationStatus::Validated => Self::VALIDATED,
            ValidationStatus::NeedsRevision => Self::NEEDS_REVISION,
        }
    }

    pub fn is_validated(&self) -> bool {
        matches!(self, ValidationStatus::Validated)
    }
}

impl From<String> for ValidationStatus {
    fn from(raw: String) -> Self {
        Self::normalize(&raw)
    }
}

impl From<ValidationStatus> for String {
    fn from(status: ValidationStatus) -> Self {
        status.as_str().to_string()
    }
}

impl fmt::Display for ValidationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The structured artifact a run produces
///
/// Built once at the end of the validate stage and never mutated afterward.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecificationRecord {
    /// The original feature goal
    pub feature_goal: String,

    /// Atomic user needs from the decompose stage
    pub high_level_stories: Vec<String>,

    /// The validated (and possibly corrected) markdown specification
    pub detailed_spec_markdown: String,

    /// Final audit status
    pub validation_status: ValidationStatus,

    /// The auditor's reasoning
    pub validation_critique: String,
}

impl SpecificationRecord {
    /// Pretty JSON for files and storage
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
