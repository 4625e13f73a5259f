//! Pipeline definition and execution.
//!
//! This module provides:
//! - Stage definitions and job specifications
//! - A validating pipeline builder
//! - The validated stage graph with dependency waves
//! - The runner that executes a job and reports on its event channel

pub mod blueprint;
mod builder;
mod context;
mod dag;
mod runner;
mod spec;

pub use builder::PipelineBuilder;
pub use context::{build_history_context, stage_input, StageOutputs};
pub use dag::Pipeline;
pub use runner::PipelineRunner;
pub use spec::{HistorySource, Job, StageDefinition, IDEA_PLACEHOLDER};
