//! Follow-up questions about a finished report.
//!
//! A follow-up is a single, non-streamed executor call. Its context is the
//! report the user is looking at, optionally extended with the full text of
//! their most recent analyses.

use crate::config::OrchestratorConfig;
use crate::errors::StagestreamError;
use crate::stages::{StageExecutor, StageInput};
use crate::store::HistoryStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

const FOLLOW_UP_STAGE: &str = "follow_up";
const FOLLOW_UP_ROLE: &str = "Creative Strategist & Follow-up Specialist";
const FOLLOW_UP_EXPECTED: &str = "An insightful and helpful answer.";
const HISTORY_HEADER: &str = "\n\n--- PREVIOUS ANALYSIS CONTEXT ---\n";

/// A question about a previously generated report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpQuery {
    /// The report text the question refers to.
    pub report_context: String,
    /// The user's question.
    pub question: String,
    /// Whether to append the user's recent analyses.
    #[serde(default)]
    pub use_history: bool,
}

impl FollowUpQuery {
    /// Creates a query without history.
    #[must_use]
    pub fn new(report_context: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            report_context: report_context.into(),
            question: question.into(),
            use_history: false,
        }
    }

    /// Enables or disables the history context.
    #[must_use]
    pub fn with_history(mut self, enabled: bool) -> Self {
        self.use_history = enabled;
        self
    }
}

/// Answers follow-up questions with the shared stage executor.
#[derive(Clone)]
pub struct FollowUpResponder {
    executor: Arc<dyn StageExecutor>,
    history: Arc<dyn HistoryStore>,
    config: OrchestratorConfig,
}

impl FollowUpResponder {
    /// Creates a responder.
    #[must_use]
    pub fn new(executor: Arc<dyn StageExecutor>, history: Arc<dyn HistoryStore>) -> Self {
        Self {
            executor,
            history,
            config: OrchestratorConfig::default(),
        }
    }

    /// Sets the configuration; `history_limit` bounds the appended analyses.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `config` fails
    /// [`OrchestratorConfig::validate`].
    pub fn with_config(mut self, config: OrchestratorConfig) -> Result<Self, StagestreamError> {
        config.validate()?;
        self.config = config;
        Ok(self)
    }

    /// Answers `query` on behalf of `owner_id`.
    ///
    /// A failed history lookup is logged and the question is answered from
    /// the report alone.
    ///
    /// # Errors
    ///
    /// Returns [`StagestreamError::Stage`] if the executor fails or times out.
    pub async fn answer(
        &self,
        owner_id: Uuid,
        query: &FollowUpQuery,
    ) -> Result<String, StagestreamError> {
        let mut context = query.report_context.clone();
        if query.use_history {
            if let Some(history) = self.history_context(owner_id).await {
                context.push_str(&history);
            }
        }

        let input = StageInput {
            stage: FOLLOW_UP_STAGE.to_string(),
            role: FOLLOW_UP_ROLE.to_string(),
            description: format!(
                "Based on the context below, answer the user's question: {}",
                query.question
            ),
            expected_output: FOLLOW_UP_EXPECTED.to_string(),
            context: format!("Initial report context: {context}"),
            step: 1,
            total: 1,
        };

        let call = self.executor.execute(&input);
        let answer = match self.config.stage_timeout() {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| crate::errors::StageFailure::Timeout)??,
            None => call.await?,
        };

        info!(
            owner_id = %owner_id,
            use_history = query.use_history,
            answer_chars = answer.chars().count(),
            "follow-up answered"
        );
        Ok(answer)
    }

    async fn history_context(&self, owner_id: Uuid) -> Option<String> {
        let entries = match self.history.list_recent(owner_id, self.config.history_limit).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!(owner_id = %owner_id, error = %err, "history lookup failed for follow-up");
                return None;
            }
        };
        if entries.is_empty() {
            return None;
        }

        let mut summary = HISTORY_HEADER.to_string();
        for entry in &entries {
            summary.push_str(&format!("\n**Regarding '{}':**\n{}\n", entry.prompt, entry.result));
        }
        Some(summary)
    }
}

impl std::fmt::Debug for FollowUpResponder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FollowUpResponder")
            .field("executor", &self.executor)
            .field("history_limit", &self.config.history_limit)
            .finish_non_exhaustive()
    }
}
