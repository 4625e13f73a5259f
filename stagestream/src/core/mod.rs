//! Core domain model types for stagestream.
//!
//! This module contains the fundamental types used throughout the crate:
//! - Job events carried on the event channel
//! - Stage status and the job state machine
//! - Stage results, job outcomes and persisted artifacts

mod artifact;
mod event;
mod result;
mod status;

pub use artifact::{ArtifactId, PersistedArtifact};
pub use event::JobEvent;
pub use result::{JobOutcome, StageResult};
pub use status::{JobState, StageStatus};
