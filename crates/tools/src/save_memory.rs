//! Memory save tool.
//!
//! Lets the model persist a short takeaway about the user on request. The
//! owner id is injected from session context by the orchestrator, never
//! supplied by the model. Store failures are reported in the output text.

use std::sync::Arc;

use async_trait::async_trait;
use plume_core::error::ToolError;
use plume_core::tool::{Tool, ToolResult};
use plume_memory::MemoryStore;
use serde::Deserialize;
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
struct SaveMemoryArgs {
    takeaway: String,
    #[serde(default)]
    owner_id: Option<String>,
}

pub struct SaveMemoryTool {
    store: Arc<MemoryStore>,
}

impl SaveMemoryTool {
    pub fn new(store: Arc<MemoryStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl Tool for SaveMemoryTool {
    fn name(&self) -> &str {
        "save_memory"
    }

    fn description(&self) -> &str {
        "Save a short durable fact or preference about the user for future \
         conversations, e.g. \"prefers a formal tone\". Use only when the \
         user states something worth remembering long-term."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "takeaway": {
                    "type": "string",
                    "description": "The fact or preference to remember, one sentence"
                }
            },
            "required": ["takeaway"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let args: SaveMemoryArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let Some(owner_id) = args.owner_id else {
            return Ok(ToolResult::failure(
                "No account is associated with this session, so nothing was saved.",
            ));
        };

        if args.takeaway.trim().is_empty() {
            return Ok(ToolResult::failure("Nothing to save: the takeaway was empty."));
        }

        if self.store.save(&owner_id, &args.takeaway).await {
            Ok(ToolResult::ok("Noted. I'll remember that."))
        } else {
            Ok(ToolResult::failure(
                "I couldn't save that to long-term memory right now.",
            ))
        }
    }
}
