//! Image synthesis tool.
//!
//! Thin adapter between the tool protocol and the injected image backend.
//! Unlike the other tools this one raises a hard error when the backend
//! yields nothing: there is no textual output a model could work with.

use std::sync::Arc;

use async_trait::async_trait;
use plume_core::error::ToolError;
use plume_core::provider::{ImageBackend, ImageRequest, MediaRef};
use plume_core::tool::{Tool, ToolResult};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

#[derive(Debug, Deserialize)]
struct GenerateImageArgs {
    prompt: String,
    #[serde(default)]
    style: Option<String>,
    #[serde(default)]
    aspect_ratio: Option<String>,
    #[serde(default)]
    references: Vec<String>,
}

pub struct GenerateImageTool {
    backend: Arc<dyn ImageBackend>,
}

impl GenerateImageTool {
    pub fn new(backend: Arc<dyn ImageBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl Tool for GenerateImageTool {
    fn name(&self) -> &str {
        "generate_image"
    }

    fn description(&self) -> &str {
        "Generate an image from a text prompt. Optional style and \
         aspect_ratio hints are appended to the prompt; reference image \
         URLs condition the generation."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "prompt": {
                    "type": "string",
                    "description": "What to generate"
                },
                "style": {
                    "type": "string",
                    "description": "Optional style hint, e.g. \"watercolor\""
                },
                "aspect_ratio": {
                    "type": "string",
                    "description": "Optional aspect ratio, e.g. \"16:9\""
                },
                "references": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Optional reference image URLs"
                }
            },
            "required": ["prompt"]
        })
    }

    async fn execute(&self, arguments: Value) -> Result<ToolResult, ToolError> {
        let args: GenerateImageArgs = serde_json::from_value(arguments)
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))?;

        let mut prompt = args.prompt;
        if let Some(style) = args.style {
            prompt.push_str(&format!(", style: {style}"));
        }
        if let Some(aspect_ratio) = args.aspect_ratio {
            prompt.push_str(&format!(", aspect ratio: {aspect_ratio}"));
        }

        let request = ImageRequest {
            prompt,
            references: args.references.into_iter().map(MediaRef::url).collect(),
        };
        debug!(prompt = %request.prompt, refs = request.references.len(), "Dispatching image request");

        let media = self
            .backend
            .synthesize(request)
            .await
            .map_err(|e| ToolError::ExecutionFailed {
                tool_name: "generate_image".into(),
                reason: e.to_string(),
            })?;

        if media.is_empty() {
            return Err(ToolError::ExecutionFailed {
                tool_name: "generate_image".into(),
                reason: "backend returned no media".into(),
            });
        }

        let listed = media
            .iter()
            .map(|m| m.reference.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        Ok(ToolResult::with_media(
            format!("Generated {} image(s): {listed}", media.len()),
            media,
        ))
    }
}
