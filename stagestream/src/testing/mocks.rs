//! Mock executors and stores for testing.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::core::ArtifactId;
use crate::errors::{StageFailure, StoreError};
use crate::stages::{StageExecutor, StageInput};
use crate::store::{ArtifactStore, HistoryEntry, HistoryStore};

/// Shared record of the inputs an executor was called with.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    inputs: Arc<Mutex<Vec<StageInput>>>,
}

impl CallLog {
    fn record(&self, input: &StageInput) {
        self.inputs.lock().push(input.clone());
    }

    /// Returns every recorded input in call order.
    #[must_use]
    pub fn inputs(&self) -> Vec<StageInput> {
        self.inputs.lock().clone()
    }

    /// Returns the stage names in call order.
    #[must_use]
    pub fn stages(&self) -> Vec<String> {
        self.inputs.lock().iter().map(|i| i.stage.clone()).collect()
    }

    /// Returns the input the named stage was called with.
    #[must_use]
    pub fn input_for(&self, stage: &str) -> Option<StageInput> {
        self.inputs.lock().iter().find(|i| i.stage == stage).cloned()
    }

    /// Returns the number of calls.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inputs.lock().len()
    }

    /// Returns true if nothing was called.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inputs.lock().is_empty()
    }
}

/// An executor whose per-stage behaviour is scripted up front.
///
/// Unscripted stages answer `"<stage> output"` immediately. Delays use
/// `tokio::time::sleep`, so they cooperate with a paused test clock.
#[derive(Debug, Default)]
pub struct ScriptedExecutor {
    outputs: HashMap<String, String>,
    failures: HashMap<String, StageFailure>,
    delays: HashMap<String, Duration>,
    panics: HashSet<String>,
    calls: CallLog,
    finished: CallLog,
}

impl ScriptedExecutor {
    /// Creates an executor where every stage succeeds immediately.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the output for a stage.
    #[must_use]
    pub fn output(mut self, stage: impl Into<String>, text: impl Into<String>) -> Self {
        self.outputs.insert(stage.into(), text.into());
        self
    }

    /// Makes a stage fail.
    #[must_use]
    pub fn fail(mut self, stage: impl Into<String>, failure: StageFailure) -> Self {
        self.failures.insert(stage.into(), failure);
        self
    }

    /// Makes a stage take `delay` before answering.
    #[must_use]
    pub fn delay(mut self, stage: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(stage.into(), delay);
        self
    }

    /// Makes a stage panic.
    #[must_use]
    pub fn panic_on(mut self, stage: impl Into<String>) -> Self {
        self.panics.insert(stage.into());
        self
    }

    /// Returns a handle to the call log.
    #[must_use]
    pub fn calls(&self) -> CallLog {
        self.calls.clone()
    }

    /// Returns a handle to the log of calls that ran past their delay,
    /// whether or not anyone awaited the result.
    #[must_use]
    pub fn finished(&self) -> CallLog {
        self.finished.clone()
    }
}

#[async_trait]
impl StageExecutor for ScriptedExecutor {
    async fn execute(&self, input: &StageInput) -> Result<String, StageFailure> {
        self.calls.record(input);

        if let Some(delay) = self.delays.get(&input.stage) {
            tokio::time::sleep(*delay).await;
        }
        self.finished.record(input);
        if self.panics.contains(&input.stage) {
            panic!("scripted panic in stage '{}'", input.stage);
        }
        if let Some(failure) = self.failures.get(&input.stage) {
            return Err(failure.clone());
        }
        Ok(self
            .outputs
            .get(&input.stage)
            .cloned()
            .unwrap_or_else(|| format!("{} output", input.stage)))
    }
}

/// A store that fails every call.
#[derive(Debug)]
pub struct FailingStore {
    reason: String,
    attempts: AtomicUsize,
}

impl FailingStore {
    /// Creates a failing store.
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            attempts: AtomicUsize::new(0),
        }
    }

    /// Returns how many calls were made.
    #[must_use]
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl HistoryStore for FailingStore {
    async fn list_recent(&self, _owner_id: Uuid, _limit: usize) -> Result<Vec<HistoryEntry>, StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::unavailable(self.reason.clone()))
    }
}

#[async_trait]
impl ArtifactStore for FailingStore {
    async fn save(&self, _owner_id: Uuid, _prompt: &str, _text: &str) -> Result<ArtifactId, StoreError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::unavailable(self.reason.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(stage: &str) -> StageInput {
        StageInput {
            stage: stage.to_string(),
            role: String::new(),
            description: String::new(),
            expected_output: String::new(),
            context: String::new(),
            step: 1,
            total: 1,
        }
    }

    #[tokio::test]
    async fn test_scripted_defaults_and_overrides() {
        let executor = ScriptedExecutor::new()
            .output("a", "custom")
            .fail("b", StageFailure::failed("boom"));

        assert_eq!(executor.execute(&input("a")).await.unwrap(), "custom");
        assert_eq!(executor.execute(&input("c")).await.unwrap(), "c output");
        assert!(executor.execute(&input("b")).await.is_err());
        assert_eq!(executor.calls().stages(), vec!["a", "c", "b"]);
        assert_eq!(executor.finished().stages(), vec!["a", "c", "b"]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_finished_log_waits_for_delay() {
        let executor = Arc::new(ScriptedExecutor::new().delay("slow", Duration::from_secs(5)));
        let finished = executor.finished();

        let task = tokio::spawn({
            let executor = Arc::clone(&executor);
            async move { executor.execute(&input("slow")).await }
        });
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(finished.is_empty());

        task.await.unwrap().unwrap();
        assert_eq!(finished.stages(), vec!["slow"]);
    }

    #[tokio::test]
    async fn test_failing_store_counts_attempts() {
        let store = FailingStore::new("offline");
        assert!(store.save(Uuid::new_v4(), "p", "t").await.is_err());
        assert!(store.list_recent(Uuid::new_v4(), 2).await.is_err());
        assert_eq!(store.attempts(), 2);
    }
}
