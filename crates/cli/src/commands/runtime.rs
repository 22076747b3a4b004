//! Wires the configured providers, memory, tools, and orchestrator into a
//! ready-to-serve gateway state.

use std::sync::Arc;
use std::time::Duration;

use plume_agent::{Orchestrator, ShortcutDetector};
use plume_config::AppConfig;
use plume_gateway::{GatewayState, SharedState};
use plume_memory::{InMemoryIndex, MemoryStore};
use plume_providers::{OpenAiCompatProvider, OpenAiImageBackend, StaticProfileStore};
use plume_tools::{default_registry, WebFetchTool};

pub fn build_state(config: &AppConfig) -> anyhow::Result<SharedState> {
    let api_key = config
        .api_key
        .clone()
        .ok_or_else(|| anyhow::anyhow!("No API key configured. Run `plume onboard` and set api_key, or export PLUME_API_KEY."))?;

    let provider = Arc::new(
        OpenAiCompatProvider::new(
            config.provider.name.clone(),
            config.provider.api_url.clone(),
            api_key.clone(),
        )
        .with_embedding_model(config.provider.embedding_model.clone())
        .with_chat_timeout(Duration::from_secs(config.provider.chat_timeout_secs))
        .with_embed_timeout(Duration::from_secs(config.provider.embed_timeout_secs)),
    );

    let image_backend = Arc::new(
        OpenAiImageBackend::new(config.provider.api_url.clone(), api_key)
            .with_model(config.tools.image_model.clone())
            .with_timeout(Duration::from_secs(config.tools.image_timeout_secs)),
    );

    // Memory off means no store at all: no save_memory tool, no retrieval.
    let memory = config.memory.enabled.then(|| {
        Arc::new(
            MemoryStore::new(provider.clone(), Arc::new(InMemoryIndex::new()))
                .with_top_k(config.memory.top_k),
        )
    });

    let fetch = WebFetchTool::new()
        .with_timeout(Duration::from_secs(config.tools.web_fetch_timeout_secs))
        .with_char_budget(config.tools.web_fetch_char_budget);

    let tools = Arc::new(default_registry(image_backend, memory.clone(), fetch));

    let shortcut = if config.agent.shortcut_phrases.is_empty() {
        ShortcutDetector::default()
    } else {
        ShortcutDetector::new(config.agent.shortcut_phrases.clone())
    };

    let mut builder = Orchestrator::builder(
        provider,
        tools.clone(),
        config.provider.chat_model.clone(),
        config.agent.baseline_prompt.clone(),
    )
    .temperature(config.provider.temperature)
    .max_tokens(config.provider.max_tokens)
    .window_turns(config.agent.window_turns)
    .max_tool_rounds(config.agent.max_tool_rounds)
    .shortcut(shortcut)
    .profiles(Arc::new(StaticProfileStore::new(config.profiles.clone())));

    if let Some(memory) = memory {
        builder = builder.memory(memory);
    }

    Ok(Arc::new(GatewayState {
        orchestrator: Arc::new(builder.build()),
        tools,
    }))
}
