//! The long-term memory store.
//!
//! `save` embeds a takeaway and inserts it into the vector index.
//! `retrieve` embeds the query and returns the top-k takeaways for the
//! owner, joined as one context string.
//!
//! Neither operation ever raises into the caller: memory is an enhancement.
//! Failures (embedding service down, index error) are logged and degrade to
//! a no-op (`save`) or `None` (`retrieve`).

use std::sync::Arc;

use plume_core::memory::{MemoryRecord, VectorIndex};
use plume_core::provider::EmbeddingProvider;
use tracing::{debug, warn};

/// Default number of takeaways retrieved per query.
pub const DEFAULT_TOP_K: usize = 3;

pub struct MemoryStore {
    embedder: Arc<dyn EmbeddingProvider>,
    index: Arc<dyn VectorIndex>,
    top_k: usize,
}

impl MemoryStore {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: Arc<dyn VectorIndex>) -> Self {
        Self {
            embedder,
            index,
            top_k: DEFAULT_TOP_K,
        }
    }

    /// Set how many takeaways `retrieve` returns.
    pub fn with_top_k(mut self, k: usize) -> Self {
        self.top_k = k.max(1);
        self
    }

    /// Embed and persist a takeaway for an owner.
    ///
    /// Returns whether the record was stored. Failures are swallowed.
    pub async fn save(&self, owner_id: &str, takeaway: &str) -> bool {
        let embedding = match self.embedder.embed(takeaway).await {
            Ok(e) => e,
            Err(e) => {
                warn!(owner_id, error = %e, "Takeaway embedding failed, memory not saved");
                return false;
            }
        };

        let record = MemoryRecord::new(owner_id, takeaway, embedding);
        match self.index.add(record).await {
            Ok(()) => {
                debug!(owner_id, "Saved takeaway to memory");
                true
            }
            Err(e) => {
                warn!(owner_id, error = %e, "Memory index insert failed");
                false
            }
        }
    }

    /// Retrieve the owner's most similar takeaways for a query, joined with
    /// newlines, or `None` on any failure or when nothing is stored.
    pub async fn retrieve(&self, owner_id: &str, query: &str) -> Option<String> {
        let embedding = match self.embedder.embed(query).await {
            Ok(e) => e,
            Err(e) => {
                warn!(owner_id, error = %e, "Query embedding failed, proceeding without memory");
                return None;
            }
        };

        let records = match self.index.nearest(owner_id, &embedding, self.top_k).await {
            Ok(r) => r,
            Err(e) => {
                warn!(owner_id, error = %e, "Memory lookup failed, proceeding without memory");
                return None;
            }
        };

        if records.is_empty() {
            return None;
        }

        debug!(owner_id, count = records.len(), "Recalled takeaways for context");
        Some(
            records
                .iter()
                .map(|r| r.takeaway.as_str())
                .collect::<Vec<_>>()
                .join("\n"),
        )
    }
}
