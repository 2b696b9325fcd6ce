//! Terminal rendering for runs, errors and history

use colored::Colorize;
use tracing::debug;

use crate::domain::{FeatureContext, SpecMetrics};
use crate::error::{PipelineError, ProviderErrorKind};
use crate::pipeline::{GenerationRun, Stage};

/// How much raw model text a parse error shows
pub const RAW_SNIPPET_CHARS: usize = 500;

/// First `max_chars` characters of `text`, marked when cut
pub fn raw_snippet(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

/// Report printed after a successful run
pub fn run_report(run: &GenerationRun, context: &FeatureContext) -> String {
    debug!("run_report: called");
    let record = &run.record;
    let metrics = SpecMetrics::from_record(record);
    let mut out = String::new();

    let badge = if record.validation_status.is_validated() {
        format!("\u{2713} {}", record.validation_status).green().bold()
    } else {
        format!("\u{26A0} {}", record.validation_status).yellow().bold()
    };
    out.push_str(&format!("{} {}\n", "Specification".bright_cyan().bold(), badge));
    out.push_str(&format!(
        "  model {} | mode {} | {:.1}s\n",
        run.model,
        run.output_mode,
        run.elapsed.as_secs_f64()
    ));
    if run.draft_truncated {
        out.push_str(&format!(
            "  {} Draft hit the {}-token limit; the specification may be incomplete\n",
            "\u{26A0}".yellow(),
            Stage::Draft.max_tokens()
        ));
    }
    out.push('\n');

    out.push_str(&format!("{}\n", "Metrics".bold()));
    out.push_str(&format!("  Requirements      {}\n", metrics.requirement_count()));
    out.push_str(&format!("  Functional        {}\n", metrics.fr_count));
    out.push_str(&format!("  Non-functional    {}\n", metrics.nfr_count));
    out.push_str(&format!("  User stories      {}\n", metrics.story_count));
    out.push_str(&format!("  Words             {}\n", metrics.word_count));
    out.push_str(&format!("  Completeness      {}%\n", metrics.completeness_score()));
    out.push_str(&format!("  Complexity        {}\n", metrics.complexity().label()));
    out.push('\n');

    out.push_str(&format!("{}\n", "User Stories".bold()));
    for (idx, story) in record.high_level_stories.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", idx + 1, story));
    }
    out.push('\n');

    out.push_str(&format!("{}\n", "Validation Report".bold()));
    for line in record.validation_critique.lines() {
        out.push_str(&format!("  {}\n", line));
    }

    if context.include_cost {
        let estimate = metrics.estimate();
        out.push('\n');
        out.push_str(&format!("{}\n", "Estimates".bold()));
        out.push_str(&format!("  Timeline          {}-{} weeks\n", estimate.min_weeks, estimate.max_weeks));
        out.push_str(&format!(
            "  Cost              ${}-${}\n",
            with_thousands(estimate.min_cost_usd),
            with_thousands(estimate.max_cost_usd)
        ));
    }

    out
}

/// Classified feedback for a failed run
pub fn error_report(err: &PipelineError) -> String {
    debug!(%err, "error_report: called");
    let mut out = String::new();

    match err {
        PipelineError::Provider { stage, source } => {
            let kind = ProviderErrorKind::classify(source);
            out.push_str(&format!("{} {}\n", "\u{2717}".red(), kind.headline().red().bold()));
            out.push_str(&format!("  {}\n", kind.advice()));
            out.push_str(&format!("  {} stage: {}\n", stage, source));
            if let Some(retry_after) = source.retry_after() {
                out.push_str(&format!("  Retry after {}s\n", retry_after.as_secs()));
            }
        }
        PipelineError::DecompositionParse { reason, raw, .. } | PipelineError::ValidationParse { reason, raw, .. } => {
            let stage = err.stage().map(|s| s.to_string()).unwrap_or_default();
            let headline = if err.is_truncated() {
                "Model response was cut off at the token limit"
            } else if err.extraction().is_some_and(|e| e.is_missing_delimiter()) {
                "No JSON found in the model output"
            } else {
                "Model output could not be parsed"
            };
            out.push_str(&format!("{} {}\n", "\u{2717}".red(), headline.red().bold()));
            out.push_str(&format!("  {} stage: {}\n", stage, reason));
            if err.is_truncated() {
                out.push_str("  Try a shorter feature goal or fewer context options.\n");
            }
            out.push_str("  Raw output:\n");
            for line in raw_snippet(raw, RAW_SNIPPET_CHARS).lines() {
                out.push_str(&format!("    {}\n", line.dimmed()));
            }
        }
        PipelineError::Configuration(message) => {
            out.push_str(&format!("{} {}\n", "\u{2717}".red(), "Configuration error".red().bold()));
            out.push_str(&format!("  {}\n", message));
        }
        PipelineError::InvalidInput(message) => {
            out.push_str(&format!("{} {}\n", "\u{2717}".red(), message.red().bold()));
        }
    }

    out
}

fn with_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
