//! The per-turn orchestration state machine.
//!
//! A run moves through: history repair → windowing → image shortcut →
//! prompt assembly (persona, profile override, recalled memory) → the
//! model/tool loop → terminal event. Events are pushed into an `mpsc`
//! channel as they happen; dropping the receiver aborts the run at the
//! next emission.

use std::sync::Arc;

use plume_core::error::{Error, ProviderError, ToolError};
use plume_core::event::StreamEvent;
use plume_core::provider::{ChatRequest, ModelProvider, ProfileStore, ReplyToolCall};
use plume_core::tool::{ToolCall, ToolRegistry};
use plume_core::turn::{Role, Turn};
use plume_memory::MemoryStore;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};
use uuid::Uuid;

use crate::history;
use crate::shortcut::{ImageShortcut, ShortcutDetector};

/// Upper bound on model/tool rounds within one turn.
pub const DEFAULT_MAX_TOOL_ROUNDS: u32 = 8;

/// Reply for a history that contains no usable turns.
pub const EMPTY_HISTORY_REPLY: &str = "I'm sorry, but I can't respond to an empty message. \
     Please say something and I'll do my best to help.";

/// Reply when the model keeps requesting tools past the round ceiling.
pub const MAX_ROUNDS_REPLY: &str = "I wasn't able to complete this after several attempts. \
     Could you rephrase or simplify the request?";

/// Name of the tool the image shortcut dispatches to.
const IMAGE_TOOL: &str = "generate_image";

/// One conversational turn to process.
#[derive(Debug, Clone, Deserialize)]
pub struct ConverseRequest {
    /// The full session history, latest turn last.
    pub history: Vec<Turn>,

    /// Account the session belongs to. Enables the profile override and
    /// long-term memory; anonymous sessions get the baseline persona only.
    #[serde(default)]
    pub owner_id: Option<String>,
}

/// Why a run stopped before reaching its terminal event.
enum RunError {
    /// The event receiver was dropped; the caller went away.
    Cancelled,
    /// The turn failed; an `Error` event must close the stream.
    Failed(Error),
}

impl From<Error> for RunError {
    fn from(e: Error) -> Self {
        Self::Failed(e)
    }
}

impl From<ProviderError> for RunError {
    fn from(e: ProviderError) -> Self {
        Self::Failed(e.into())
    }
}

impl From<ToolError> for RunError {
    fn from(e: ToolError) -> Self {
        Self::Failed(e.into())
    }
}

/// The orchestrator. Stateless between runs; share one instance behind an
/// `Arc` across all concurrent sessions.
pub struct Orchestrator {
    provider: Arc<dyn ModelProvider>,
    tools: Arc<ToolRegistry>,
    model: String,
    baseline_prompt: String,
    temperature: f32,
    max_tokens: Option<u32>,
    profiles: Option<Arc<dyn ProfileStore>>,
    memory: Option<Arc<MemoryStore>>,
    shortcut: ShortcutDetector,
    window_turns: usize,
    max_tool_rounds: u32,
}

impl Orchestrator {
    pub fn builder(
        provider: Arc<dyn ModelProvider>,
        tools: Arc<ToolRegistry>,
        model: impl Into<String>,
        baseline_prompt: impl Into<String>,
    ) -> OrchestratorBuilder {
        OrchestratorBuilder {
            provider,
            tools,
            model: model.into(),
            baseline_prompt: baseline_prompt.into(),
            temperature: 0.7,
            max_tokens: None,
            profiles: None,
            memory: None,
            shortcut: ShortcutDetector::default(),
            window_turns: history::DEFAULT_WINDOW_TURNS,
            max_tool_rounds: DEFAULT_MAX_TOOL_ROUNDS,
        }
    }

    /// Process one conversational turn, pushing events into `tx`.
    ///
    /// Always closes the stream with exactly one terminal event (`Done` or
    /// `Error`) unless the receiver has been dropped, in which case the run
    /// stops at the first failed send.
    pub async fn run(&self, request: ConverseRequest, tx: mpsc::Sender<StreamEvent>) {
        match self.drive(request, &tx).await {
            Ok(()) => {
                let _ = tx.send(StreamEvent::Done {}).await;
            }
            Err(RunError::Cancelled) => {
                debug!("Run cancelled, receiver dropped");
            }
            Err(RunError::Failed(e)) => {
                error!(error = %e, "Turn failed");
                let _ = tx
                    .send(StreamEvent::Error {
                        message: e.to_string(),
                    })
                    .await;
            }
        }
    }

    async fn drive(
        &self,
        request: ConverseRequest,
        tx: &mpsc::Sender<StreamEvent>,
    ) -> Result<(), RunError> {
        let turns = history::window(history::normalize(&request.history), self.window_turns);

        if turns.is_empty() {
            emit(
                tx,
                StreamEvent::Text {
                    text: EMPTY_HISTORY_REPLY.to_string(),
                },
            )
            .await?;
            return Ok(());
        }

        // The shortcut only looks at the latest turn, which after repair is
        // the user's current message whenever one exists.
        if let Some(last) = turns.last() {
            if let Some(shortcut) = self.shortcut.detect(last) {
                return self.run_image_shortcut(shortcut, tx).await;
            }
        }

        let system_prompt = self.assemble_system_prompt(&request.owner_id, &turns).await;
        self.run_model_loop(turns, system_prompt, &request.owner_id, tx)
            .await
    }

    /// Dispatch a detected image request straight to the image tool.
    ///
    /// Image synthesis has no textual fallback, so a tool error here fails
    /// the whole turn.
    async fn run_image_shortcut(
        &self,
        shortcut: ImageShortcut,
        tx: &mpsc::Sender<StreamEvent>,
    ) -> Result<(), RunError> {
        let input = json!({
            "prompt": shortcut.prompt,
            "references": shortcut
                .references
                .iter()
                .map(|r| r.reference.clone())
                .collect::<Vec<_>>(),
        });
        debug!("Image shortcut triggered, skipping the model");

        emit(
            tx,
            StreamEvent::ToolInvoked {
                name: IMAGE_TOOL.to_string(),
                input: input.clone(),
            },
        )
        .await?;

        let call = ToolCall {
            id: Uuid::new_v4().to_string(),
            name: IMAGE_TOOL.to_string(),
            arguments: input,
        };
        let result = self.tools.execute(&call).await?;

        emit(
            tx,
            StreamEvent::ToolResult {
                name: IMAGE_TOOL.to_string(),
                output: result.output,
                media: result.media,
            },
        )
        .await?;
        Ok(())
    }

    /// Baseline persona, plus the owner's profile override when one
    /// resolves, plus recalled memory context. Profile and memory failures
    /// degrade to the baseline; they never abort the turn.
    async fn assemble_system_prompt(&self, owner_id: &Option<String>, turns: &[Turn]) -> String {
        let mut prompt = self.baseline_prompt.clone();

        if let (Some(owner), Some(profiles)) = (owner_id, &self.profiles) {
            match profiles.system_prompt(owner).await {
                Ok(extra) if !extra.trim().is_empty() => {
                    prompt.push_str("\n\n");
                    prompt.push_str(&extra);
                }
                Ok(_) => {}
                Err(e) => {
                    warn!(owner_id = %owner, error = %e, "Profile lookup failed, using baseline persona");
                }
            }
        }

        if let (Some(owner), Some(memory)) = (owner_id, &self.memory) {
            let query = turns
                .iter()
                .rev()
                .find(|t| t.role == Role::User)
                .map(|t| t.content.as_str());
            if let Some(query) = query {
                if let Some(recalled) = memory.retrieve(owner, query).await {
                    prompt.push_str("\n\n## Things you remember about this user\n");
                    prompt.push_str(&recalled);
                }
            }
        }

        prompt
    }

    /// Alternate between the model and tool dispatch until the model
    /// answers without tool calls or the round ceiling is hit.
    async fn run_model_loop(
        &self,
        mut working: Vec<Turn>,
        system_prompt: String,
        owner_id: &Option<String>,
        tx: &mpsc::Sender<StreamEvent>,
    ) -> Result<(), RunError> {
        let definitions = self.tools.definitions();

        for round in 1..=self.max_tool_rounds {
            let request = ChatRequest {
                model: self.model.clone(),
                system_prompt: system_prompt.clone(),
                turns: working.clone(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: definitions.clone(),
            };
            let reply = self.provider.generate(request).await?;

            if reply.is_final() {
                emit(tx, StreamEvent::Text { text: reply.text }).await?;
                return Ok(());
            }

            debug!(round, calls = reply.tool_calls.len(), "Model requested tools");

            if !reply.text.is_empty() {
                emit(
                    tx,
                    StreamEvent::Text {
                        text: reply.text.clone(),
                    },
                )
                .await?;
            }

            let mut assistant = Turn::assistant(reply.text);
            assistant.tool_calls = reply.tool_calls.clone();
            working.push(assistant);

            for call in reply.tool_calls {
                self.dispatch(call, owner_id, &mut working, tx).await?;
            }
        }

        warn!(
            max_rounds = self.max_tool_rounds,
            "Tool round ceiling reached, giving up on this turn"
        );
        emit(
            tx,
            StreamEvent::Text {
                text: MAX_ROUNDS_REPLY.to_string(),
            },
        )
        .await?;
        Ok(())
    }

    /// Execute one model-requested tool call and feed its result back into
    /// the working history. Expected failures become tool-result data; only
    /// the image tool, which has no textual fallback, fails the turn.
    ///
    /// The session's owner id is injected into the arguments so tools that
    /// act on the account (memory save) never rely on the model for it.
    async fn dispatch(
        &self,
        call: ReplyToolCall,
        owner_id: &Option<String>,
        working: &mut Vec<Turn>,
        tx: &mpsc::Sender<StreamEvent>,
    ) -> Result<(), RunError> {
        let mut arguments: serde_json::Value =
            serde_json::from_str(&call.arguments).unwrap_or_else(|_| json!({}));
        if let (Some(owner), serde_json::Value::Object(map)) = (owner_id, &mut arguments) {
            map.entry("owner_id").or_insert_with(|| json!(owner));
        }

        emit(
            tx,
            StreamEvent::ToolInvoked {
                name: call.name.clone(),
                input: arguments.clone(),
            },
        )
        .await?;

        let tool_call = ToolCall {
            id: call.id.clone(),
            name: call.name.clone(),
            arguments,
        };

        match self.tools.execute(&tool_call).await {
            Ok(result) => {
                emit(
                    tx,
                    StreamEvent::ToolResult {
                        name: call.name,
                        output: result.output.clone(),
                        media: result.media,
                    },
                )
                .await?;
                working.push(Turn::tool_result(call.id, result.output));
            }
            Err(e @ ToolError::ExecutionFailed { .. }) if call.name == IMAGE_TOOL => {
                return Err(RunError::Failed(e.into()));
            }
            Err(e) => {
                warn!(tool = %call.name, error = %e, "Tool dispatch failed");
                let text = format!("Error: {e}");
                emit(
                    tx,
                    StreamEvent::ToolResult {
                        name: call.name,
                        output: text.clone(),
                        media: Vec::new(),
                    },
                )
                .await?;
                working.push(Turn::tool_result(call.id, text));
            }
        }
        Ok(())
    }
}

async fn emit(tx: &mpsc::Sender<StreamEvent>, event: StreamEvent) -> Result<(), RunError> {
    tx.send(event).await.map_err(|_| RunError::Cancelled)
}

/// Builder for [`Orchestrator`]. The provider, tool registry, model and
/// baseline persona are mandatory; everything else has a default.
pub struct OrchestratorBuilder {
    provider: Arc<dyn ModelProvider>,
    tools: Arc<ToolRegistry>,
    model: String,
    baseline_prompt: String,
    temperature: f32,
    max_tokens: Option<u32>,
    profiles: Option<Arc<dyn ProfileStore>>,
    memory: Option<Arc<MemoryStore>>,
    shortcut: ShortcutDetector,
    window_turns: usize,
    max_tool_rounds: u32,
}

impl OrchestratorBuilder {
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn profiles(mut self, profiles: Arc<dyn ProfileStore>) -> Self {
        self.profiles = Some(profiles);
        self
    }

    pub fn memory(mut self, memory: Arc<MemoryStore>) -> Self {
        self.memory = Some(memory);
        self
    }

    pub fn shortcut(mut self, shortcut: ShortcutDetector) -> Self {
        self.shortcut = shortcut;
        self
    }

    /// Context window size in turns. Values below 2 are clamped to 2 so the
    /// first-turn anchor and at least one recent turn survive.
    pub fn window_turns(mut self, n: usize) -> Self {
        self.window_turns = n.max(2);
        self
    }

    pub fn max_tool_rounds(mut self, rounds: u32) -> Self {
        self.max_tool_rounds = rounds.max(1);
        self
    }

    pub fn build(self) -> Orchestrator {
        Orchestrator {
            provider: self.provider,
            tools: self.tools,
            model: self.model,
            baseline_prompt: self.baseline_prompt,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            profiles: self.profiles,
            memory: self.memory,
            shortcut: self.shortcut,
            window_turns: self.window_turns,
            max_tool_rounds: self.max_tool_rounds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use plume_core::provider::{EmbeddingProvider, MediaRef, ModelReply};
    use plume_core::tool::{Tool, ToolResult};
    use plume_memory::InMemoryIndex;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    /// Plays back a fixed script of replies and records every request.
    struct ScriptedProvider {
        replies: Mutex<VecDeque<Result<ModelReply, ProviderError>>>,
        seen: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedProvider {
        fn new(replies: Vec<Result<ModelReply, ProviderError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies.into()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn text(s: &str) -> Result<ModelReply, ProviderError> {
            Ok(ModelReply {
                text: s.to_string(),
                tool_calls: Vec::new(),
            })
        }

        fn tool(text: &str, name: &str, args: &str) -> Result<ModelReply, ProviderError> {
            Ok(ModelReply {
                text: text.to_string(),
                tool_calls: vec![ReplyToolCall {
                    id: format!("call_{name}"),
                    name: name.to_string(),
                    arguments: args.to_string(),
                }],
            })
        }

        fn calls(&self) -> usize {
            self.seen.lock().unwrap().len()
        }

        fn request(&self, i: usize) -> ChatRequest {
            self.seen.lock().unwrap()[i].clone()
        }
    }

    #[async_trait]
    impl ModelProvider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, request: ChatRequest) -> Result<ModelReply, ProviderError> {
            self.seen.lock().unwrap().push(request);
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ProviderError::Network("script exhausted".into())))
        }
    }

    struct EchoTool;

    #[async_trait]
    impl Tool for EchoTool {
        fn name(&self) -> &str {
            "echo"
        }
        fn description(&self) -> &str {
            "Echoes back the input"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {"text": {"type": "string"}}})
        }
        async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
            Ok(ToolResult::ok(
                arguments["text"].as_str().unwrap_or("").to_string(),
            ))
        }
    }

    struct FakeImageTool {
        fail: bool,
    }

    #[async_trait]
    impl Tool for FakeImageTool {
        fn name(&self) -> &str {
            "generate_image"
        }
        fn description(&self) -> &str {
            "Generates an image"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            json!({"type": "object", "properties": {"prompt": {"type": "string"}}})
        }
        async fn execute(&self, _arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
            if self.fail {
                Err(ToolError::ExecutionFailed {
                    tool_name: "generate_image".into(),
                    reason: "backend returned no media".into(),
                })
            } else {
                Ok(ToolResult::with_media(
                    "Generated 1 image",
                    vec![MediaRef::url("https://cdn.example.com/out.png")],
                ))
            }
        }
    }

    struct StubEmbedder;

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
            Ok(vec![1.0, 0.0])
        }
    }

    struct DownEmbedder;

    #[async_trait]
    impl EmbeddingProvider for DownEmbedder {
        async fn embed(&self, _text: &str) -> Result<Vec<f32>, ProviderError> {
            Err(ProviderError::Network("connection refused".into()))
        }
    }

    /// A profile store that always fails lookups.
    struct BrokenProfiles;

    #[async_trait]
    impl ProfileStore for BrokenProfiles {
        async fn system_prompt(&self, owner_id: &str) -> Result<String, ProviderError> {
            Err(ProviderError::ProfileLookup(owner_id.to_string()))
        }
    }

    struct FixedProfiles(&'static str);

    #[async_trait]
    impl ProfileStore for FixedProfiles {
        async fn system_prompt(&self, _owner_id: &str) -> Result<String, ProviderError> {
            Ok(self.0.to_string())
        }
    }

    fn registry_with(tools: Vec<Box<dyn Tool>>) -> Arc<ToolRegistry> {
        let mut registry = ToolRegistry::new();
        for tool in tools {
            registry.register(tool);
        }
        Arc::new(registry)
    }

    fn build(provider: Arc<ScriptedProvider>, tools: Arc<ToolRegistry>) -> OrchestratorBuilder {
        Orchestrator::builder(provider, tools, "test-model", "You are Plume.")
    }

    async fn collect(orch: &Orchestrator, request: ConverseRequest) -> Vec<StreamEvent> {
        let (tx, mut rx) = mpsc::channel(64);
        orch.run(request, tx).await;
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    fn types(events: &[StreamEvent]) -> Vec<&'static str> {
        events.iter().map(|e| e.event_type()).collect()
    }

    fn request(history: Vec<Turn>) -> ConverseRequest {
        ConverseRequest {
            history,
            owner_id: None,
        }
    }

    fn owned(history: Vec<Turn>, owner: &str) -> ConverseRequest {
        ConverseRequest {
            history,
            owner_id: Some(owner.to_string()),
        }
    }

    #[tokio::test]
    async fn empty_history_gets_canned_reply() {
        let provider = ScriptedProvider::new(vec![]);
        let orch = build(provider.clone(), registry_with(vec![])).build();

        let events = collect(&orch, request(vec![])).await;
        assert_eq!(types(&events), vec!["text", "done"]);
        match &events[0] {
            StreamEvent::Text { text } => assert_eq!(text, EMPTY_HISTORY_REPLY),
            _ => panic!("Expected text event"),
        }
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn plain_reply_streams_text_then_done() {
        let provider = ScriptedProvider::new(vec![ScriptedProvider::text("Here's a tagline.")]);
        let orch = build(provider.clone(), registry_with(vec![])).build();

        let events = collect(&orch, request(vec![Turn::user("write a tagline")])).await;
        assert_eq!(types(&events), vec!["text", "done"]);
        assert_eq!(provider.calls(), 1);
    }

    #[tokio::test]
    async fn tool_round_feeds_result_back_to_model() {
        let provider = ScriptedProvider::new(vec![
            ScriptedProvider::tool("Let me check.", "echo", r#"{"text": "pong"}"#),
            ScriptedProvider::text("The echo said pong."),
        ]);
        let orch = build(provider.clone(), registry_with(vec![Box::new(EchoTool)])).build();

        let events = collect(&orch, request(vec![Turn::user("ping the echo")])).await;
        assert_eq!(
            types(&events),
            vec!["text", "tool_invoked", "tool_result", "text", "done"]
        );

        assert_eq!(provider.calls(), 2);
        let second = provider.request(1);
        let tool_turn = second
            .turns
            .iter()
            .find(|t| t.role == Role::Tool)
            .expect("tool result fed back");
        assert_eq!(tool_turn.content, "pong");
        assert_eq!(tool_turn.tool_call_id.as_deref(), Some("call_echo"));
    }

    #[tokio::test]
    async fn shortcut_bypasses_model() {
        let provider = ScriptedProvider::new(vec![]);
        let orch = build(
            provider.clone(),
            registry_with(vec![Box::new(FakeImageTool { fail: false })]),
        )
        .build();

        let events = collect(
            &orch,
            request(vec![Turn::user("generate an image of a red fox")]),
        )
        .await;
        assert_eq!(types(&events), vec!["tool_invoked", "tool_result", "done"]);
        match &events[1] {
            StreamEvent::ToolResult { media, .. } => assert_eq!(media.len(), 1),
            _ => panic!("Expected tool_result"),
        }
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn shortcut_image_failure_is_terminal_error() {
        let provider = ScriptedProvider::new(vec![]);
        let orch = build(
            provider.clone(),
            registry_with(vec![Box::new(FakeImageTool { fail: true })]),
        )
        .build();

        let events = collect(
            &orch,
            request(vec![Turn::user("draw a picture of a void")]),
        )
        .await;
        assert_eq!(types(&events), vec!["tool_invoked", "error"]);
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    }

    #[tokio::test]
    async fn loop_ceiling_emits_fallback_text() {
        // The model asks for the same tool forever.
        let provider = ScriptedProvider::new(vec![
            ScriptedProvider::tool("", "echo", r#"{"text": "a"}"#),
            ScriptedProvider::tool("", "echo", r#"{"text": "b"}"#),
            ScriptedProvider::tool("", "echo", r#"{"text": "c"}"#),
        ]);
        let orch = build(provider.clone(), registry_with(vec![Box::new(EchoTool)]))
            .max_tool_rounds(2)
            .build();

        let events = collect(&orch, request(vec![Turn::user("loop forever")])).await;
        assert_eq!(provider.calls(), 2);

        let last_text = events
            .iter()
            .rev()
            .find_map(|e| match e {
                StreamEvent::Text { text } => Some(text.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(last_text, MAX_ROUNDS_REPLY);
        assert!(matches!(events.last(), Some(StreamEvent::Done {})));
    }

    #[tokio::test]
    async fn provider_failure_emits_single_error() {
        let provider = ScriptedProvider::new(vec![Err(ProviderError::ApiError {
            status_code: 500,
            message: "upstream exploded".into(),
        })]);
        let orch = build(provider, registry_with(vec![])).build();

        let events = collect(&orch, request(vec![Turn::user("hello")])).await;
        assert_eq!(types(&events), vec!["error"]);
        assert_eq!(events.iter().filter(|e| e.is_terminal()).count(), 1);
    }

    #[tokio::test]
    async fn unknown_tool_failure_forwarded_as_data() {
        let provider = ScriptedProvider::new(vec![
            ScriptedProvider::tool("", "missing_tool", "{}"),
            ScriptedProvider::text("I couldn't use that tool."),
        ]);
        let orch = build(provider.clone(), registry_with(vec![])).build();

        let events = collect(&orch, request(vec![Turn::user("use the tool")])).await;
        assert_eq!(
            types(&events),
            vec!["tool_invoked", "tool_result", "text", "done"]
        );
        match &events[1] {
            StreamEvent::ToolResult { output, .. } => {
                assert!(output.starts_with("Error:"), "got {output}")
            }
            _ => panic!("Expected tool_result"),
        }

        // The failure text reaches the model as a tool turn.
        let second = provider.request(1);
        let tool_turn = second.turns.iter().find(|t| t.role == Role::Tool).unwrap();
        assert!(tool_turn.content.starts_with("Error:"));
    }

    struct RecordingTool {
        seen: Arc<Mutex<Vec<serde_json::Value>>>,
    }

    #[async_trait]
    impl Tool for RecordingTool {
        fn name(&self) -> &str {
            "recorder"
        }
        fn description(&self) -> &str {
            "Records its arguments"
        }
        fn parameters_schema(&self) -> serde_json::Value {
            json!({"type": "object"})
        }
        async fn execute(&self, arguments: serde_json::Value) -> Result<ToolResult, ToolError> {
            self.seen.lock().unwrap().push(arguments);
            Ok(ToolResult::ok("recorded"))
        }
    }

    #[tokio::test]
    async fn owner_id_injected_into_tool_arguments() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let provider = ScriptedProvider::new(vec![
            ScriptedProvider::tool("", "recorder", r#"{"takeaway": "likes haiku"}"#),
            ScriptedProvider::text("saved"),
        ]);
        let orch = build(
            provider,
            registry_with(vec![Box::new(RecordingTool { seen: seen.clone() })]),
        )
        .build();

        collect(&orch, owned(vec![Turn::user("remember this")], "owner_1")).await;

        let args = seen.lock().unwrap()[0].clone();
        assert_eq!(args["takeaway"], "likes haiku");
        assert_eq!(args["owner_id"], "owner_1");
    }

    #[tokio::test]
    async fn long_history_is_windowed() {
        let provider = ScriptedProvider::new(vec![ScriptedProvider::text("ok")]);
        let orch = build(provider.clone(), registry_with(vec![])).build();

        let mut history = Vec::new();
        for i in 1..=15 {
            if i % 2 == 1 {
                history.push(Turn::user(format!("turn {i}")));
            } else {
                history.push(Turn::assistant(format!("turn {i}")));
            }
        }

        collect(&orch, request(history)).await;
        let seen = provider.request(0);
        assert_eq!(seen.turns.len(), 11);
        assert_eq!(seen.turns[0].content, "turn 1");
        assert_eq!(seen.turns[1].content, "turn 6");
        assert_eq!(seen.turns[10].content, "turn 15");
    }

    #[tokio::test]
    async fn profile_override_merged_into_system_prompt() {
        let provider = ScriptedProvider::new(vec![ScriptedProvider::text("ok")]);
        let orch = build(provider.clone(), registry_with(vec![]))
            .profiles(Arc::new(FixedProfiles("Always answer in French.")))
            .build();

        collect(&orch, owned(vec![Turn::user("bonjour")], "owner_1")).await;
        let seen = provider.request(0);
        assert!(seen.system_prompt.starts_with("You are Plume."));
        assert!(seen.system_prompt.contains("Always answer in French."));
    }

    #[tokio::test]
    async fn profile_lookup_failure_falls_back_to_baseline() {
        let provider = ScriptedProvider::new(vec![ScriptedProvider::text("ok")]);
        let orch = build(provider.clone(), registry_with(vec![]))
            .profiles(Arc::new(BrokenProfiles))
            .build();

        let events = collect(&orch, owned(vec![Turn::user("hello")], "owner_1")).await;
        assert_eq!(types(&events), vec!["text", "done"]);
        assert_eq!(provider.request(0).system_prompt, "You are Plume.");
    }

    #[tokio::test]
    async fn recalled_memory_lands_in_system_prompt() {
        let memory = Arc::new(MemoryStore::new(
            Arc::new(StubEmbedder),
            Arc::new(InMemoryIndex::new()),
        ));
        memory.save("owner_1", "prefers a playful tone").await;

        let provider = ScriptedProvider::new(vec![ScriptedProvider::text("ok")]);
        let orch = build(provider.clone(), registry_with(vec![]))
            .memory(memory)
            .build();

        collect(&orch, owned(vec![Turn::user("write a post")], "owner_1")).await;
        assert!(provider.request(0).system_prompt.contains("playful tone"));
    }

    #[tokio::test]
    async fn memory_outage_degrades_gracefully() {
        let memory = Arc::new(MemoryStore::new(
            Arc::new(DownEmbedder),
            Arc::new(InMemoryIndex::new()),
        ));

        let provider = ScriptedProvider::new(vec![ScriptedProvider::text("ok")]);
        let orch = build(provider.clone(), registry_with(vec![]))
            .memory(memory)
            .build();

        let events = collect(&orch, owned(vec![Turn::user("hello")], "owner_1")).await;
        assert_eq!(types(&events), vec!["text", "done"]);
        assert_eq!(provider.request(0).system_prompt, "You are Plume.");
    }

    #[tokio::test]
    async fn anonymous_sessions_skip_profile_and_memory() {
        let memory = Arc::new(MemoryStore::new(
            Arc::new(StubEmbedder),
            Arc::new(InMemoryIndex::new()),
        ));
        memory.save("owner_1", "a stored fact").await;

        let provider = ScriptedProvider::new(vec![ScriptedProvider::text("ok")]);
        let orch = build(provider.clone(), registry_with(vec![]))
            .profiles(Arc::new(FixedProfiles("override")))
            .memory(memory)
            .build();

        collect(&orch, request(vec![Turn::user("hello")])).await;
        assert_eq!(provider.request(0).system_prompt, "You are Plume.");
    }

    #[tokio::test]
    async fn dropped_receiver_aborts_the_run() {
        let provider = ScriptedProvider::new(vec![
            ScriptedProvider::tool("", "echo", r#"{"text": "a"}"#),
            ScriptedProvider::tool("", "echo", r#"{"text": "b"}"#),
        ]);
        let orch = build(provider.clone(), registry_with(vec![Box::new(EchoTool)]))
            .max_tool_rounds(8)
            .build();

        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        orch.run(request(vec![Turn::user("hello")]), tx).await;

        // The run stops at the first failed send instead of looping on.
        assert_eq!(provider.calls(), 1);
    }
}
