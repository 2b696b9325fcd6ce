//! Domain types: inputs, the final record, and derived statistics

mod context;
mod metrics;
mod record;

pub use context::{FeatureContext, Industry, TeamSize};
pub use metrics::{Complexity, ProjectEstimate, SpecMetrics};
pub use record::{SpecificationRecord, ValidationStatus};
