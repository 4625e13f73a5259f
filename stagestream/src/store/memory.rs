//! In-process artifact store.

use super::{ArtifactStore, HistoryEntry, HistoryStore};
use crate::core::{ArtifactId, PersistedArtifact};
use crate::errors::StoreError;
use async_trait::async_trait;
use parking_lot::RwLock;
use tracing::debug;
use uuid::Uuid;

/// Artifact store backed by a vector behind a lock.
///
/// Implements both [`ArtifactStore`] and [`HistoryStore`], so one instance
/// can serve as the whole storage layer for tests and embedded use.
#[derive(Debug, Default)]
pub struct InMemoryArtifactStore {
    artifacts: RwLock<Vec<PersistedArtifact>>,
}

impl InMemoryArtifactStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an existing artifact, e.g. when seeding history.
    pub fn insert(&self, artifact: PersistedArtifact) {
        self.artifacts.write().push(artifact);
    }

    /// Returns the artifact with `id`, if present.
    #[must_use]
    pub fn get(&self, id: ArtifactId) -> Option<PersistedArtifact> {
        self.artifacts.read().iter().find(|a| a.id == id).cloned()
    }

    /// Returns all artifacts for an owner, most recent first.
    #[must_use]
    pub fn list_for_owner(&self, owner_id: Uuid) -> Vec<PersistedArtifact> {
        let mut owned: Vec<PersistedArtifact> = self
            .artifacts
            .read()
            .iter()
            .filter(|a| a.owner_id == owner_id)
            .cloned()
            .collect();
        // Stable sort keeps insertion order reversed for equal timestamps.
        owned.reverse();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        owned
    }

    /// Deletes an artifact belonging to `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::NotFound`] if no such artifact exists or it
    /// belongs to another owner.
    pub fn delete(&self, id: ArtifactId, owner_id: Uuid) -> Result<PersistedArtifact, StoreError> {
        let mut artifacts = self.artifacts.write();
        let position = artifacts
            .iter()
            .position(|a| a.id == id && a.owner_id == owner_id)
            .ok_or_else(|| StoreError::not_found(id))?;
        Ok(artifacts.remove(position))
    }

    /// Returns the number of stored artifacts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.artifacts.read().len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.artifacts.read().is_empty()
    }
}

#[async_trait]
impl ArtifactStore for InMemoryArtifactStore {
    async fn save(&self, owner_id: Uuid, prompt: &str, text: &str) -> Result<ArtifactId, StoreError> {
        let artifact = PersistedArtifact::new(owner_id, prompt, text);
        let id = artifact.id;
        self.artifacts.write().push(artifact);
        debug!(artifact_id = %id, owner_id = %owner_id, "artifact saved");
        Ok(id)
    }
}

#[async_trait]
impl HistoryStore for InMemoryArtifactStore {
    async fn list_recent(
        &self,
        owner_id: Uuid,
        limit: usize,
    ) -> Result<Vec<HistoryEntry>, StoreError> {
        Ok(self
            .list_for_owner(owner_id)
            .into_iter()
            .take(limit)
            .map(|a| HistoryEntry {
                prompt: a.prompt,
                result: a.report,
                created_at: a.created_at,
            })
            .collect())
    }
}
