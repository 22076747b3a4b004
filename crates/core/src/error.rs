//! The error taxonomy, one `thiserror` enum per bounded context.
//!
//! Provider and memory failures stay in their own enums so callers can apply
//! the right policy: provider errors terminate the turn with a single error
//! event, memory errors are logged and swallowed, tool errors are mostly
//! folded back into the conversation as output text.

use thiserror::Error;

/// Umbrella error for a whole orchestration run.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Memory error: {0}")]
    Memory(#[from] MemoryError),

    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Failures talking to the hosted model, embedding, image, or profile
/// services.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Profile lookup failed: {0}")]
    ProfileLookup(String),
}

/// Failures in the long-term memory subsystem. Never user-visible.
#[derive(Debug, Error)]
pub enum MemoryError {
    #[error("Index error: {0}")]
    Index(String),

    #[error("Embedding generation failed: {0}")]
    EmbeddingFailed(String),
}

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    NotFound(String),

    #[error("Tool execution failed: {tool_name} — {reason}")]
    ExecutionFailed { tool_name: String, reason: String },

    #[error("Invalid tool arguments: {0}")]
    InvalidArguments(String),
}
