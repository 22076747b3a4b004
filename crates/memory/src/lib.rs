//! Long-term memory for the Plume agent.
//!
//! The store embeds short natural-language takeaways, persists them in an
//! owner-scoped vector index, and retrieves the most semantically similar
//! takeaways for a new query. Memory is an enhancement, never a correctness
//! requirement: every failure degrades to "no memory context".

pub mod index;
pub mod store;
pub mod vector;

pub use index::InMemoryIndex;
pub use store::MemoryStore;
pub use vector::cosine_similarity;
