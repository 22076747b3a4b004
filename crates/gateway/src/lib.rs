//! HTTP gateway for the Plume agent.
//!
//! Endpoints:
//!
//! - `POST /v1/converse` — process one conversational turn, streamed back as
//!   newline-delimited JSON events
//! - `GET  /v1/tools`    — list the registered tools
//! - `GET  /health`      — liveness probe

use std::sync::Arc;

use axum::body::Body;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use plume_agent::orchestrator::ConverseRequest;
use plume_agent::Orchestrator;
use plume_core::event::StreamEvent;
use plume_core::tool::ToolRegistry;

// ── State ─────────────────────────────────────────────────────────────────

/// Shared state for the gateway.
pub struct GatewayState {
    pub orchestrator: Arc<Orchestrator>,
    pub tools: Arc<ToolRegistry>,
}

pub type SharedState = Arc<GatewayState>;

// ── Router ────────────────────────────────────────────────────────────────

/// Build the gateway router.
pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/v1/converse", post(converse_handler))
        .route("/v1/tools", get(list_tools_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind and serve until the process is stopped.
pub async fn serve(state: SharedState, host: &str, port: u16) -> std::io::Result<()> {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(%addr, "Gateway listening");
    axum::serve(listener, router(state)).await
}

// ── Handlers ──────────────────────────────────────────────────────────────

/// `POST /v1/converse` — run one turn, stream events as NDJSON.
///
/// The orchestration runs in its own task; if the client disconnects, the
/// stream (and with it the event receiver) is dropped and the run aborts at
/// its next emission.
async fn converse_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ConverseRequest>,
) -> impl IntoResponse {
    info!(
        turns = payload.history.len(),
        owner = payload.owner_id.as_deref().unwrap_or("anonymous"),
        "v1/converse request"
    );

    let (tx, rx) = mpsc::channel(64);
    let orchestrator = state.orchestrator.clone();
    tokio::spawn(async move {
        orchestrator.run(payload, tx).await;
    });

    // A frame that fails to serialize becomes a stream error, which tears
    // down the body. Nothing may follow a failed frame on the wire.
    let stream = ReceiverStream::new(rx).map(|event| ndjson_frame(&event));

    (
        [(header::CONTENT_TYPE, "application/x-ndjson")],
        Body::from_stream(stream),
    )
}

fn ndjson_frame(event: &StreamEvent) -> Result<String, serde_json::Error> {
    let mut line = serde_json::to_string(event)?;
    line.push('\n');
    Ok(line)
}

#[derive(Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
struct ToolListResponse {
    tools: Vec<ToolDto>,
    count: usize,
}

#[derive(Serialize)]
#[cfg_attr(test, derive(serde::Deserialize))]
struct ToolDto {
    name: String,
    description: String,
    parameters: serde_json::Value,
}

/// `GET /v1/tools` — list the registered tools.
async fn list_tools_handler(State(state): State<SharedState>) -> Json<ToolListResponse> {
    let tools: Vec<ToolDto> = state
        .tools
        .definitions()
        .into_iter()
        .map(|d| ToolDto {
            name: d.name,
            description: d.description,
            parameters: d.parameters,
        })
        .collect();
    let count = tools.len();
    Json(ToolListResponse { tools, count })
}

/// `GET /health` — liveness probe.
async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
