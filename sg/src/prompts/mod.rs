//! Prompt Template System
//!
//! Loads and renders the `.pmt` templates behind the three pipeline stages.
//!
//! Template loading chain:
//! 1. `.specgen/prompts/{name}.pmt` (user override)
//! 2. `prompts/{name}.pmt` (repo default)
//! 3. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::{PromptContext, PromptLoader};
