//! Storage seams used by the pipeline runner.
//!
//! Storage is the only thing shared across concurrent jobs. Each job writes
//! its own artifact, so no cross-job locking is required.

mod memory;

pub use memory::InMemoryArtifactStore;

use crate::core::ArtifactId;
use crate::errors::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A previously persisted artifact as seen by history consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// The prompt the artifact was produced for.
    pub prompt: String,
    /// The full report text. Consumers truncate as they need.
    pub result: String,
    /// When the artifact was written.
    pub created_at: DateTime<Utc>,
}

/// Read-only access to an owner's prior artifacts.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Returns at most `limit` artifacts for `owner_id`, most recent first.
    async fn list_recent(&self, owner_id: Uuid, limit: usize)
        -> Result<Vec<HistoryEntry>, StoreError>;
}

/// Write access for final reports.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Persists one report and returns its id.
    async fn save(&self, owner_id: Uuid, prompt: &str, text: &str) -> Result<ArtifactId, StoreError>;
}
