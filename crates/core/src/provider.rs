//! Provider traits — the abstractions over external collaborators.
//!
//! Each external service the core talks to is its own trait, injected into
//! the orchestrator and memory store as an interface-typed dependency:
//!
//! - [`ModelProvider`] — the hosted LLM that does all the reasoning
//! - [`EmbeddingProvider`] — text → vector for memory retrieval
//! - [`ImageBackend`] — the image generation service
//! - [`ProfileStore`] — owner-specific system prompt lookup

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::turn::{Turn, TurnToolCall};

/// An opaque reference to a piece of media: a URL or an inline-encoded blob.
/// The core never inspects the contents; it only passes references around.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    /// The reference itself (URL or data URI)
    pub reference: String,
}

impl MediaRef {
    pub fn url(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
        }
    }
}

impl std::fmt::Display for MediaRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.reference)
    }
}

/// Declaration of a callable tool, advertised with every chat request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// The tool name
    pub name: String,

    /// What the tool does, one line
    pub description: String,

    /// JSON Schema for the arguments object
    pub parameters: serde_json::Value,
}

/// One reasoning request to the model provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// The model to use (e.g., "gpt-4o", "claude-sonnet-4")
    pub model: String,

    /// The system prompt (persona + retrieved memory context)
    pub system_prompt: String,

    /// The windowed conversation turns
    pub turns: Vec<Turn>,

    /// Sampling temperature
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Output token cap, if the caller sets one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Tools the model may request
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

fn default_temperature() -> f32 {
    0.7
}

/// The model's answer for one round: text, tool call requests, or both.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelReply {
    /// Generated text (may be empty when only tools are requested)
    #[serde(default)]
    pub text: String,

    /// Tool invocations the model wants dispatched before it continues
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ReplyToolCall>,
}

impl ModelReply {
    /// Whether this reply ends the reasoning loop (no pending tool calls).
    pub fn is_final(&self) -> bool {
        self.tool_calls.is_empty()
    }
}

/// A tool invocation requested by the model.
pub type ReplyToolCall = TurnToolCall;

/// The hosted LLM. The single source of reasoning; the core never does its
/// own NLU beyond the narrow intent shortcut.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// A human-readable name for this provider (e.g., "openai", "openrouter").
    fn name(&self) -> &str;

    /// Send a request and get the model's reply.
    async fn generate(&self, request: ChatRequest) -> std::result::Result<ModelReply, ProviderError>;
}

/// Text embedding service. May fail (network, quota); callers that treat
/// memory as an enhancement must swallow those failures.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, ProviderError>;
}

/// A request to the image generation backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageRequest {
    /// The generation prompt (already includes any style/aspect modifiers)
    pub prompt: String,

    /// Optional reference media to condition the generation on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<MediaRef>,
}

/// The image generation service.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Generate one or more images for the prompt.
    ///
    /// An empty result is an error condition for the caller; implementations
    /// should return whatever the backend produced and let the tool decide.
    async fn synthesize(
        &self,
        request: ImageRequest,
    ) -> std::result::Result<Vec<MediaRef>, ProviderError>;
}

/// Owner-specific system prompt lookup. A lookup failure must never abort a
/// turn — callers fall back to the baseline persona.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn system_prompt(&self, owner_id: &str) -> std::result::Result<String, ProviderError>;
}
