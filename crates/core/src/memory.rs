//! Memory types — long-term takeaways and the nearest-neighbor index trait.
//!
//! A takeaway is a short durable fact or preference extracted from a
//! conversation. Records are owner-scoped, embedded once at save time, and
//! never mutated; retrieval is cosine nearest-neighbor over the owner's
//! records.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MemoryError;

/// A single long-term memory record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Which owner (account) this record belongs to
    pub owner_id: String,

    /// The takeaway text
    pub takeaway: String,

    /// Embedding of the takeaway
    #[serde(skip)]
    pub embedding: Vec<f32>,

    /// When this record was created
    pub created_at: DateTime<Utc>,
}

impl MemoryRecord {
    pub fn new(owner_id: impl Into<String>, takeaway: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            owner_id: owner_id.into(),
            takeaway: takeaway.into(),
            embedding,
            created_at: Utc::now(),
        }
    }
}

/// An owner-scoped nearest-neighbor index over memory records.
///
/// Kept separate from record persistence so the implementation (in-memory,
/// external vector database) can vary independently.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// The index name (e.g., "in_memory").
    fn name(&self) -> &str;

    /// Insert a record.
    async fn add(&self, record: MemoryRecord) -> std::result::Result<(), MemoryError>;

    /// Return up to `k` records for `owner_id`, most similar to
    /// `query_embedding` first (cosine similarity).
    async fn nearest(
        &self,
        owner_id: &str,
        query_embedding: &[f32],
        k: usize,
    ) -> std::result::Result<Vec<MemoryRecord>, MemoryError>;

    /// Count records for an owner.
    async fn count(&self, owner_id: &str) -> std::result::Result<usize, MemoryError>;
}
