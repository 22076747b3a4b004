//! The capability interface tools implement, and the registry that holds them.
//!
//! A tool is a side-effecting capability the model can invoke mid-turn:
//! clock lookup, web fetch, image synthesis, memory save. Expected failure
//! modes (bad input, unreachable resource) are encoded in the tool's output
//! text so the orchestrator can feed them back into the model's context.
//! `ToolError` is reserved for programmer error and for the one case with no
//! textual fallback, image synthesis returning no media.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ToolError;
use crate::provider::{MediaRef, ToolDefinition};

/// One requested tool invocation, as the model phrased it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Call id, echoed back in the matching tool turn
    pub id: String,

    /// Which tool to run
    pub name: String,

    /// Arguments as parsed JSON
    pub arguments: serde_json::Value,
}

/// What a tool produced.
///
/// `success: false` still carries human-readable output; the orchestrator
/// forwards it to the model like any other result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,

    /// Text output, including failure descriptions
    pub output: String,

    /// Media references, populated by image synthesis
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<MediaRef>,
}

impl ToolResult {
    pub fn ok(output: impl Into<String>) -> Self {
        Self {
            success: true,
            output: output.into(),
            media: Vec::new(),
        }
    }

    /// An expected failure, reported as data rather than raised.
    pub fn failure(output: impl Into<String>) -> Self {
        Self {
            success: false,
            output: output.into(),
            media: Vec::new(),
        }
    }

    pub fn with_media(output: impl Into<String>, media: Vec<MediaRef>) -> Self {
        Self {
            success: true,
            output: output.into(),
            media,
        }
    }
}

/// The capability interface.
///
/// Implementations are registered once at startup and shared read-only
/// across concurrent orchestrations, so they hold no per-call state.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Stable name the model calls this tool by (e.g. "web_fetch").
    fn name(&self) -> &str;

    /// One-line description advertised to the model.
    fn description(&self) -> &str;

    /// JSON Schema for the arguments object.
    fn parameters_schema(&self) -> serde_json::Value;

    /// Run the tool.
    async fn execute(
        &self,
        arguments: serde_json::Value,
    ) -> std::result::Result<ToolResult, ToolError>;

    /// The wire-format declaration sent along with chat requests.
    fn to_definition(&self) -> ToolDefinition {
        ToolDefinition {
            name: self.name().to_string(),
            description: self.description().to_string(),
            parameters: self.parameters_schema(),
        }
    }
}

/// Name-keyed collection of tools, built once at startup.
pub struct ToolRegistry {
    tools: HashMap<String, Box<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: HashMap::new(),
        }
    }

    /// Add a tool, replacing any prior registration under the same name.
    pub fn register(&mut self, tool: Box<dyn Tool>) {
        self.tools.insert(tool.name().to_string(), tool);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Tool> {
        self.tools.get(name).map(|t| t.as_ref())
    }

    /// Declarations for every registered tool, for the chat request.
    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.values().map(|t| t.to_definition()).collect()
    }

    /// Resolve `call.name` and run the tool with the call's arguments.
    pub async fn execute(&self, call: &ToolCall) -> std::result::Result<ToolResult, ToolError> {
        match self.tools.get(&call.name) {
            Some(tool) => tool.execute(call.arguments.clone()).await,
            None => Err(ToolError::NotFound(call.name.clone())),
        }
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(|s| s.as_str()).collect()
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}
