//! # Stagestream
//!
//! Streaming orchestration for long-running, multi-stage jobs.
//!
//! A job runs a validated pipeline of stages against an external
//! [`StageExecutor`](stages::StageExecutor). While it runs, the caller gets a
//! lazy stream of events:
//!
//! - **Stage lifecycle**: `Started`/`Ended` per stage, in dependency order
//! - **Keep-alives**: `Heartbeat` on a fixed interval while stages are slow
//! - **One terminal result**: `FinalResult` or `Error`, followed by `Done`
//!
//! Finished reports are persisted through an
//! [`ArtifactStore`](store::ArtifactStore) and summarized back into later jobs
//! as history.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stagestream::prelude::*;
//!
//! let pipeline = Arc::new(blueprint::venture_analysis()?);
//! let store = Arc::new(InMemoryArtifactStore::new());
//! let runner = PipelineRunner::new(executor, store.clone(), store);
//! let coordinator = JobCoordinator::new(Arc::new(runner));
//!
//! let job = Job::new(owner_id, "solar kiosks", pipeline).with_history(true);
//! let mut frames = Box::pin(coordinator.serve_encoded(job));
//! while let Some(frame) = frames.next().await {
//!     response.write_all(frame.as_bytes()).await?;
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod config;
pub mod coordinator;
pub mod core;
pub mod encoding;
pub mod errors;
pub mod events;
pub mod followup;
pub mod heartbeat;
pub mod observability;
pub mod pipeline;
pub mod stages;
pub mod store;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::StopSignal;
    pub use crate::config::{DisconnectPolicy, OrchestratorConfig};
    pub use crate::coordinator::JobCoordinator;
    pub use crate::core::{
        ArtifactId, JobEvent, JobOutcome, JobState, PersistedArtifact, StageResult, StageStatus,
    };
    pub use crate::encoding::{encode_stream, StreamEncoder, HEARTBEAT_FRAME, RESPONSE_HEADERS};
    pub use crate::errors::{
        ContractErrorInfo, CycleDetectedError, PipelineValidationError, StageFailure,
        StagestreamError, StoreError,
    };
    pub use crate::events::{
        event_channel, EventReceiver, EventSender, EventSink, LoggingEventSink, NoOpEventSink,
    };
    pub use crate::followup::{FollowUpQuery, FollowUpResponder};
    pub use crate::heartbeat::HeartbeatTicker;
    pub use crate::observability::{init_logging, LogFormat};
    pub use crate::pipeline::{
        blueprint, HistorySource, Job, Pipeline, PipelineBuilder, PipelineRunner,
        StageDefinition,
    };
    pub use crate::stages::{BlockingExecutor, FnExecutor, StageExecutor, StageInput};
    pub use crate::store::{ArtifactStore, HistoryEntry, HistoryStore, InMemoryArtifactStore};
}
