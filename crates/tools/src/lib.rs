//! Built-in tools for the Plume agent.
//!
//! Four capabilities ship out of the box: clock lookup, web fetch, image
//! synthesis, and explicit memory save. Expected failures (unknown city,
//! unreachable page, full memory outage) are encoded in the tool output so
//! the model can react to them; the one exception is image synthesis
//! yielding no media, which has no textual fallback and fails the turn.

pub mod clock;
pub mod image_gen;
pub mod save_memory;
pub mod web_fetch;

use std::sync::Arc;

use plume_core::provider::ImageBackend;
use plume_core::tool::ToolRegistry;
use plume_memory::MemoryStore;

pub use clock::CurrentTimeTool;
pub use image_gen::GenerateImageTool;
pub use save_memory::SaveMemoryTool;
pub use web_fetch::WebFetchTool;

/// Build the standard registry.
///
/// `save_memory` is only registered when a memory store is supplied; a
/// deployment with memory disabled must not let the model write takeaways
/// nothing will ever read back.
pub fn default_registry(
    image_backend: Arc<dyn ImageBackend>,
    memory: Option<Arc<MemoryStore>>,
    fetch: WebFetchTool,
) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(Box::new(CurrentTimeTool::new()));
    registry.register(Box::new(fetch));
    registry.register(Box::new(GenerateImageTool::new(image_backend)));
    if let Some(memory) = memory {
        registry.register(Box::new(SaveMemoryTool::new(memory)));
    }
    registry
}
