//! # Plume Core
//!
//! Domain types, traits, and error definitions for the Plume conversational
//! agent core. This crate defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every external collaborator (model provider, embedding provider, image
//! backend, profile store, vector index) is defined as a trait here.
//! Implementations live in their respective crates. This enables:
//! - swapping implementations through configuration
//! - test doubles without feature flags
//! - a dependency graph that only points inward

pub mod error;
pub mod event;
pub mod memory;
pub mod provider;
pub mod tool;
pub mod turn;

// Re-export key types at crate root for ergonomics
pub use error::{Error, MemoryError, ProviderError, Result, ToolError};
pub use event::StreamEvent;
pub use memory::{MemoryRecord, VectorIndex};
pub use provider::{
    ChatRequest, EmbeddingProvider, ImageBackend, ImageRequest, MediaRef, ModelProvider,
    ModelReply, ProfileStore, ReplyToolCall, ToolDefinition,
};
pub use tool::{Tool, ToolCall, ToolRegistry, ToolResult};
pub use turn::{Role, Turn};
