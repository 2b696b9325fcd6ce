//! Display-only statistics derived from a specification
//!
//! Nothing here feeds back into the pipeline. The counts are literal
//! substring counts, so every `NFR-` also contributes one `FR-`.

use serde::Serialize;

use super::SpecificationRecord;

/// Implementation complexity bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Complexity {
    Low,
    Medium,
    High,
}

impl Complexity {
    fn from_requirements(count: usize) -> Self {
        if count < 15 {
            Complexity::Low
        } else if count < 30 {
            Complexity::Medium
        } else {
            Complexity::High
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Complexity::Low => "Low",
            Complexity::Medium => "Medium",
            Complexity::High => "High",
        }
    }
}

/// Rough effort and cost range
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProjectEstimate {
    pub weeks: f64,
    pub min_weeks: u64,
    pub max_weeks: u64,
    pub min_cost_usd: u64,
    pub max_cost_usd: u64,
}

impl ProjectEstimate {
    const HOURS_PER_WEEK: f64 = 40.0;
    const MIN_RATE_USD: f64 = 80.0;
    const MAX_RATE_USD: f64 = 150.0;
    const OVERRUN: f64 = 1.5;

    fn from_counts(fr_count: usize, nfr_count: usize) -> Self {
        let weeks = (fr_count as f64 * 0.5 + nfr_count as f64 * 0.3).max(2.0);
        Self {
            weeks,
            min_weeks: weeks as u64,
            max_weeks: (weeks * Self::OVERRUN) as u64,
            min_cost_usd: (weeks * Self::HOURS_PER_WEEK * Self::MIN_RATE_USD) as u64,
            max_cost_usd: (weeks * Self::OVERRUN * Self::HOURS_PER_WEEK * Self::MAX_RATE_USD) as u64,
        }
    }
}

/// Derived statistics for one specification
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpecMetrics {
    pub fr_count: usize,
    pub nfr_count: usize,
    pub word_count: usize,
    pub story_count: usize,
}

impl SpecMetrics {
    pub fn from_markdown(markdown: &str, story_count: usize) -> Self {
        Self {
            fr_count: markdown.matches("FR-").count(),
            nfr_count: markdown.matches("NFR-").count(),
            word_count: markdown.split_whitespace().count(),
            story_count,
        }
    }

    pub fn from_record(record: &SpecificationRecord) -> Self {
        Self::from_markdown(&record.detailed_spec_markdown, record.high_level_stories.len())
    }

    pub fn requirement_count(&self) -> usize {
        self.fr_count + self.nfr_count
    }

    /// 0-100, saturating
    pub fn completeness_score(&self) -> u32 {
        let raw = self.fr_count * 5 + self.nfr_count * 5 + self.story_count * 10;
        raw.min(100) as u32
    }

    pub fn complexity(&self) -> Complexity {
        Complexity::from_requirements(self.requirement_count())
    }

    pub fn estimate(&self) -> ProjectEstimate {
        ProjectEstimate::from_counts(self.fr_count, self.nfr_count)
    }
}
