//! The three-stage specification pipeline
//!
//! Decompose turns a feature goal into user needs, Draft turns those needs
//! into a markdown specification, and Validate audits the draft and emits the
//! final [`SpecificationRecord`](crate::domain::SpecificationRecord).

mod runner;
mod stage;

pub use runner::{
    GenerationRun, MAX_USER_NEEDS, MIN_USER_NEEDS, RECORD_SCHEMA_NAME, SpecPipeline, parse_user_needs, record_schema,
};
pub use stage::{OutputMode, Stage};
