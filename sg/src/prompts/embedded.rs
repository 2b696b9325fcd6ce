//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Decompose stage: feature goal to user needs
pub const DECOMPOSE: &str = include_str!("../../prompts/decompose.pmt");

/// Draft stage: user needs to markdown specification
pub const DRAFT: &str = include_str!("../../prompts/draft.pmt");

/// Validate stage: audit the draft and emit the record
pub const VALIDATE: &str = include_str!("../../prompts/validate.pmt");

/// Names of every embedded template
pub const NAMES: [&str; 3] = ["decompose", "draft", "validate"];

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "decompose" => Some(DECOMPOSE),
        "draft" => Some(DRAFT),
        "validate" => Some(VALIDATE),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
