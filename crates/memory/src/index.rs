//! In-memory vector index — useful for testing and single-process deployments.

use async_trait::async_trait;
use plume_core::error::MemoryError;
use plume_core::memory::{MemoryRecord, VectorIndex};
use tokio::sync::RwLock;

use crate::vector::cosine_similarity;

/// An index that keeps all records in a Vec behind an RwLock.
///
/// Queries are scoped by owner, so concurrent per-owner access needs no
/// further coordination.
pub struct InMemoryIndex {
    records: RwLock<Vec<MemoryRecord>>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
        }
    }
}

impl Default for InMemoryIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl VectorIndex for InMemoryIndex {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn add(&self, record: MemoryRecord) -> Result<(), MemoryError> {
        self.records.write().await.push(record);
        Ok(())
    }

    async fn nearest(
        &self,
        owner_id: &str,
        query_embedding: &[f32],
        k: usize,
    ) -> Result<Vec<MemoryRecord>, MemoryError> {
        let records = self.records.read().await;

        let mut scored: Vec<(f32, MemoryRecord)> = records
            .iter()
            .filter(|r| r.owner_id == owner_id)
            .map(|r| (cosine_similarity(&r.embedding, query_embedding), r.clone()))
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(k);

        Ok(scored.into_iter().map(|(_, r)| r).collect())
    }

    async fn count(&self, owner_id: &str) -> Result<usize, MemoryError> {
        let records = self.records.read().await;
        Ok(records.iter().filter(|r| r.owner_id == owner_id).count())
    }
}
