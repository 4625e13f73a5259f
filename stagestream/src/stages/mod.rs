//! Stage executor trait and adapters.
//!
//! A [`StageExecutor`] is the external collaborator that turns a stage's
//! accumulated context into text. The orchestrator treats it as opaque and
//! possibly slow. One executor value is constructed at process start and
//! shared by handle across jobs.

use crate::errors::StageFailure;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Debug};
use std::sync::Arc;

/// Everything an executor gets for one stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageInput {
    /// The stage name.
    pub stage: String,
    /// The role label of the agent performing the stage.
    pub role: String,
    /// The task description with the job prompt substituted in.
    pub description: String,
    /// Hint describing the expected output.
    pub expected_output: String,
    /// Outputs of the declared dependencies (plus history on the first stage).
    pub context: String,
    /// One-based position of the stage in execution order.
    pub step: usize,
    /// Total number of stages in the job.
    pub total: usize,
}

impl StageInput {
    /// Renders the full prompt text handed to a text-in/text-out executor.
    #[must_use]
    pub fn render(&self) -> String {
        let mut prompt = String::new();
        if !self.role.is_empty() {
            prompt.push_str(&format!("Role: {}\n\n", self.role));
        }
        prompt.push_str(&self.description);
        if !self.expected_output.is_empty() {
            prompt.push_str(&format!("\n\nExpected output: {}", self.expected_output));
        }
        if !self.context.is_empty() {
            prompt.push_str("\n\n");
            prompt.push_str(&self.context);
        }
        prompt
    }
}

/// Trait for the collaborator that computes stage output.
#[async_trait]
pub trait StageExecutor: Send + Sync + Debug {
    /// Produces the stage's text output or a failure.
    async fn execute(&self, input: &StageInput) -> Result<String, StageFailure>;
}

#[async_trait]
impl<T: StageExecutor + ?Sized> StageExecutor for Arc<T> {
    async fn execute(&self, input: &StageInput) -> Result<String, StageFailure> {
        (**self).execute(input).await
    }
}

/// A simple function-based executor that runs inline on the calling task.
///
/// A closure that blocks stalls the worker it runs on, and on a
/// current-thread runtime the heartbeat with it. Wrap blocking client calls
/// in [`BlockingExecutor`] instead.
pub struct FnExecutor<F>
where
    F: Fn(&StageInput) -> Result<String, StageFailure> + Send + Sync,
{
    name: String,
    func: F,
}

impl<F> FnExecutor<F>
where
    F: Fn(&StageInput) -> Result<String, StageFailure> + Send + Sync,
{
    /// Creates a new function-based executor.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Debug for FnExecutor<F>
where
    F: Fn(&StageInput) -> Result<String, StageFailure> + Send + Sync,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnExecutor").field("name", &self.name).finish()
    }
}

#[async_trait]
impl<F> StageExecutor for FnExecutor<F>
where
    F: Fn(&StageInput) -> Result<String, StageFailure> + Send + Sync,
{
    async fn execute(&self, input: &StageInput) -> Result<String, StageFailure> {
        (self.func)(input)
    }
}

/// Wraps a blocking client call so it runs on tokio's blocking pool.
///
/// Use this for synchronous SDK clients; the calling task only awaits the
/// blocking pool, so event delivery and heartbeats keep flowing.
pub struct BlockingExecutor<F>
where
    F: Fn(&StageInput) -> Result<String, StageFailure> + Send + Sync + 'static,
{
    name: String,
    func: Arc<F>,
}

impl<F> BlockingExecutor<F>
where
    F: Fn(&StageInput) -> Result<String, StageFailure> + Send + Sync + 'static,
{
    /// Creates a new blocking executor.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func: Arc::new(func),
        }
    }
}

impl<F> Debug for BlockingExecutor<F>
where
    F: Fn(&StageInput) -> Result<String, StageFailure> + Send + Sync + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BlockingExecutor")
            .field("name", &self.name)
            .finish()
    }
}

#[async_trait]
impl<F> StageExecutor for BlockingExecutor<F>
where
    F: Fn(&StageInput) -> Result<String, StageFailure> + Send + Sync + 'static,
{
    async fn execute(&self, input: &StageInput) -> Result<String, StageFailure> {
        let func = Arc::clone(&self.func);
        let input = input.clone();
        tokio::task::spawn_blocking(move || func(&input))
            .await
            .map_err(|e| StageFailure::Panicked(e.to_string()))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn input(context: &str) -> StageInput {
        StageInput {
            stage: "visionary".to_string(),
            role: "Creative Product Visionary".to_string(),
            description: "Create a compelling vision for: 'drone delivery'.".to_string(),
            expected_output: "An inspiring paragraph.".to_string(),
            context: context.to_string(),
            step: 1,
            total: 4,
        }
    }

    #[test]
    fn test_render_includes_all_parts() {
        let prompt = input("prior output").render();
        assert!(prompt.starts_with("Role: Creative Product Visionary"));
        assert!(prompt.contains("drone delivery"));
        assert!(prompt.contains("Expected output: An inspiring paragraph."));
        assert!(prompt.ends_with("prior output"));
    }

    #[test]
    fn test_render_skips_empty_context() {
        let prompt = input("").render();
        assert!(prompt.ends_with("Expected output: An inspiring paragraph."));
    }

    #[tokio::test]
    async fn test_fn_executor() {
        let executor = FnExecutor::new("upper", |input: &StageInput| Ok(input.stage.to_uppercase()));
        assert_eq!(executor.execute(&input("")).await.unwrap(), "VISIONARY");
    }

    #[tokio::test]
    async fn test_blocking_executor_runs_off_task() {
        let executor = BlockingExecutor::new("sleepy", |input: &StageInput| {
            std::thread::sleep(std::time::Duration::from_millis(5));
            Ok(format!("done {}", input.step))
        });
        assert_eq!(executor.execute(&input("")).await.unwrap(), "done 1");
    }

    #[tokio::test]
    async fn test_blocking_executor_keeps_other_tasks_running() {
        let ticks = Arc::new(AtomicUsize::new(0));
        let ticker = tokio::spawn({
            let ticks = Arc::clone(&ticks);
            async move {
                loop {
                    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                    ticks.fetch_add(1, Ordering::SeqCst);
                }
            }
        });

        let executor = BlockingExecutor::new("slow_client", |_input: &StageInput| {
            std::thread::sleep(std::time::Duration::from_millis(100));
            Ok("answer".to_string())
        });
        assert_eq!(executor.execute(&input("")).await.unwrap(), "answer");
        ticker.abort();

        assert!(ticks.load(Ordering::SeqCst) > 0);
    }

    #[tokio::test]
    async fn test_blocking_executor_converts_panic() {
        let executor = BlockingExecutor::new("panicky", |_input: &StageInput| -> Result<String, StageFailure> {
            panic!("client crashed")
        });
        let err = executor.execute(&input("")).await.unwrap_err();
        assert!(matches!(err, StageFailure::Panicked(_)));
    }

    #[tokio::test]
    async fn test_arc_executor_delegates() {
        let executor: Arc<dyn StageExecutor> =
            Arc::new(FnExecutor::new("fail", |_: &StageInput| Err(StageFailure::Timeout)));
        assert_eq!(executor.execute(&input("")).await, Err(StageFailure::Timeout));
    }
}
