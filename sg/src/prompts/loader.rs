//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::{debug, info};

use super::embedded;
use crate::domain::FeatureContext;

/// Values a stage template can reference
///
/// Fields a stage does not use are left empty.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PromptContext {
    /// The feature goal (decompose)
    pub goal: String,
    /// Instruction clauses from the feature context (decompose, draft)
    pub context_clauses: Vec<String>,
    /// User needs as a JSON array (draft)
    pub user_needs_json: String,
    /// Draft markdown under audit (validate)
    pub draft_markdown: String,
}

impl PromptContext {
    pub fn decompose(goal: &str, context: &FeatureContext) -> Self {
        debug!(goal_len = goal.len(), "PromptContext::decompose: called");
        Self {
            goal: goal.to_string(),
            context_clauses: context.clauses(),
            ..Default::default()
        }
    }

    pub fn draft(user_needs: &[String], context: &FeatureContext) -> Self {
        debug!(need_count = user_needs.len(), "PromptContext::draft: called");
        // Serializing a slice of strings cannot fail
        let user_needs_json = serde_json::to_string_pretty(user_needs).unwrap_or_else(|_| "[]".to_string());
        Self {
            context_clauses: context.clauses(),
            user_needs_json,
            ..Default::default()
        }
    }

    pub fn validate(draft_markdown: &str) -> Self {
        debug!(draft_len = draft_markdown.len(), "PromptContext::validate: called");
        Self {
            draft_markdown: draft_markdown.to_string(),
            ..Default::default()
        }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `.specgen/prompts/`)
    user_dir: Option<PathBuf>,
    /// Repo default directory (e.g., `prompts/`)
    repo_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that looks for overrides under `root`
    ///
    /// # Arguments
    /// * `root` - Directory containing `.specgen/prompts/` and/or `prompts/`
    pub fn new(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        debug!(?root, "PromptLoader::new: called");
        let user_dir = root.join(".specgen/prompts");
        let repo_dir = root.join("prompts");

        let user_dir_exists = user_dir.is_dir();
        let repo_dir_exists = repo_dir.is_dir();
        debug!(
            ?user_dir,
            %user_dir_exists,
            ?repo_dir,
            %repo_dir_exists,
            "PromptLoader::new: checking directories"
        );

        Self {
            hbs: Self::engine(),
            user_dir: user_dir_exists.then_some(user_dir),
            repo_dir: repo_dir_exists.then_some(repo_dir),
        }
    }

    /// Create a loader that only uses embedded prompts (for testing)
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            user_dir: None,
            repo_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Prompts are plain text; model output and goals must pass through untouched
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. User override: `.specgen/prompts/{name}.pmt`
    /// 2. Repo default: `prompts/{name}.pmt`
    /// 3. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        for dir in [&self.user_dir, &self.repo_dir].into_iter().flatten() {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
            debug!(?path, "PromptLoader::load_template: not found");
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!(%name, "PromptLoader::load_template: found in embedded");
            return Ok(content.to_string());
        }

        debug!(%name, "PromptLoader::load_template: not found anywhere");
        Err(eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render(&self, template_name: &str, context: &PromptContext) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        info!("Rendering template '{}'", template_name);

        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }
}
