//! Test fixtures for job tests.

use std::sync::Arc;
use uuid::Uuid;

use crate::config::OrchestratorConfig;
use crate::errors::StagestreamError;
use crate::pipeline::{blueprint, Job, Pipeline, PipelineRunner};
use crate::stages::StageExecutor;
use crate::store::{ArtifactStore, HistoryStore, InMemoryArtifactStore};

/// A runner wired to an in-memory store, plus the store for inspection.
pub struct TestHarness {
    /// The runner under test.
    pub runner: Arc<PipelineRunner>,
    /// The store backing both history and artifacts.
    pub store: Arc<InMemoryArtifactStore>,
    /// The owner used for jobs created by the harness.
    pub owner_id: Uuid,
    pipeline: Arc<Pipeline>,
}

impl TestHarness {
    /// Creates a harness around `executor` with the default configuration.
    pub fn new(executor: impl StageExecutor + 'static) -> Result<Self, StagestreamError> {
        Self::with_config(executor, OrchestratorConfig::default())
    }

    /// Creates a harness with an explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn with_config(
        executor: impl StageExecutor + 'static,
        config: OrchestratorConfig,
    ) -> Result<Self, StagestreamError> {
        let store = Arc::new(InMemoryArtifactStore::new());
        let artifacts: Arc<dyn ArtifactStore> = store.clone();
        let history: Arc<dyn HistoryStore> = store.clone();
        let runner = PipelineRunner::new(Arc::new(executor), artifacts, history).with_config(config)?;
        Ok(Self {
            runner: Arc::new(runner),
            store,
            owner_id: Uuid::new_v4(),
            pipeline: Arc::new(blueprint::venture_analysis()?),
        })
    }

    /// Creates a venture analysis job for the harness owner.
    #[must_use]
    pub fn venture_job(&self, prompt: &str) -> Job {
        Job::new(self.owner_id, prompt, Arc::clone(&self.pipeline))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::ScriptedExecutor;
    use std::time::Duration;

    #[test]
    fn test_harness_shares_one_pipeline() {
        let harness = TestHarness::new(ScriptedExecutor::new()).unwrap();
        let first = harness.venture_job("a");
        let second = harness.venture_job("b");

        assert!(Arc::ptr_eq(&first.pipeline, &second.pipeline));
        assert_eq!(first.owner_id, harness.owner_id);
    }

    #[test]
    fn test_harness_rejects_invalid_config() {
        let config = OrchestratorConfig::default().with_heartbeat_interval(Duration::ZERO);
        assert!(matches!(
            TestHarness::with_config(ScriptedExecutor::new(), config),
            Err(StagestreamError::Config(_))
        ));
    }
}
