//! The persisted final report of a job.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Identifier assigned to an artifact by the artifact store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ArtifactId(pub Uuid);

impl ArtifactId {
    /// Generates a fresh artifact id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ArtifactId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A report written to durable storage once the last stage succeeds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersistedArtifact {
    /// The artifact id.
    pub id: ArtifactId,
    /// The owner of the job that produced the report.
    pub owner_id: Uuid,
    /// The original idea/prompt text.
    pub prompt: String,
    /// The final report text.
    pub report: String,
    /// When the artifact was written.
    pub created_at: DateTime<Utc>,
}

impl PersistedArtifact {
    /// Creates a new artifact stamped with the current time.
    #[must_use]
    pub fn new(owner_id: Uuid, prompt: impl Into<String>, report: impl Into<String>) -> Self {
        Self {
            id: ArtifactId::new(),
            owner_id,
            prompt: prompt.into(),
            report: report.into(),
            created_at: Utc::now(),
        }
    }

    /// Converts the artifact to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("id".to_string(), serde_json::json!(self.id.to_string()));
        map.insert("owner_id".to_string(), serde_json::json!(self.owner_id.to_string()));
        map.insert("idea_prompt".to_string(), serde_json::json!(self.prompt));
        map.insert("report_markdown".to_string(), serde_json::json!(self.report));
        map.insert("created_at".to_string(), serde_json::json!(self.created_at.to_rfc3339()));
        map
    }
}
