use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use policy_chat_core::{
    ChatOrchestrator, ChatTurn, GeminiClient, Metrics, MetricsSnapshot, OpenAiClient,
    PineconeStore,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

type Orchestrator = ChatOrchestrator<PineconeStore, GeminiClient, OpenAiClient>;

/// Shared per-process state; the orchestrator is constructed once at
/// startup and reused for every request.
#[derive(Clone)]
struct AppState {
    orchestrator: Arc<Orchestrator>,
    metrics: Arc<Metrics>,
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    message: String,
    #[serde(default)]
    history: Vec<ChatTurn>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    reply: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    service: &'static str,
}

pub async fn run(
    bind: &str,
    orchestrator: Orchestrator,
    metrics: Arc<Metrics>,
) -> anyhow::Result<()> {
    let state = AppState {
        orchestrator: Arc::new(orchestrator),
        metrics,
    };

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = Router::new()
        .route("/chat", post(handle_chat))
        .route("/health", get(handle_health))
        .route("/metrics", get(handle_metrics))
        .layer(cors)
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(bind).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Provider failures are already converted to the apology reply inside the
/// orchestrator, so this handler is infallible; a 5xx can only come from a
/// genuine defect.
async fn handle_chat(
    State(state): State<AppState>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let reply = state
        .orchestrator
        .answer(&request.message, &request.history)
        .await;
    Json(ChatResponse { reply })
}

async fn handle_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "policy-chat",
    })
}

async fn handle_metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    Json(state.metrics.snapshot())
}
