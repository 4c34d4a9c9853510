use std::sync::Arc;

use {
    axum::{
        Json, Router,
        extract::{Path, Query, State},
        http::StatusCode,
        response::{IntoResponse, Response},
        routing::{get, post},
    },
    serde::Deserialize,
    serde_json::{Value, json},
    tracing::info,
};

use corral_sandbox::SandboxError;

use crate::{state::GatewayState, webhook};

/// Everything under `/api/v1`.
pub(crate) fn api_routes() -> Router<Arc<GatewayState>> {
    Router::new()
        .route("/sandboxes", get(search_sandboxes).post(start_sandbox))
        .route("/sandboxes/lookup", get(lookup_by_session_key))
        .route("/sandboxes/{id}", get(get_sandbox).delete(delete_sandbox))
        .route("/sandboxes/{id}/pause", post(pause_sandbox))
        .route("/sandboxes/{id}/resume", post(resume_sandbox))
        .route("/webhooks/events", post(webhook_event))
}

fn not_found(sandbox_id: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": format!("sandbox not found: {sandbox_id}") })),
    )
        .into_response()
}

// ── Sandboxes ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct SearchParams {
    page_id: Option<String>,
    #[serde(default = "default_limit")]
    limit: usize,
}

fn default_limit() -> usize {
    100
}

async fn search_sandboxes(
    State(state): State<Arc<GatewayState>>,
    Query(params): Query<SearchParams>,
) -> impl IntoResponse {
    let page = state
        .sandboxes
        .search_sandboxes(params.page_id.as_deref(), params.limit)
        .await;
    Json(page)
}

async fn get_sandbox(
    State(state): State<Arc<GatewayState>>,
    Path(sandbox_id): Path<String>,
) -> Response {
    match state.sandboxes.get_sandbox(&sandbox_id).await {
        Some(info) => Json(info).into_response(),
        None => not_found(&sandbox_id),
    }
}

#[derive(Debug, Deserialize)]
struct LookupParams {
    session_api_key: String,
}

async fn lookup_by_session_key(
    State(state): State<Arc<GatewayState>>,
    Query(params): Query<LookupParams>,
) -> Response {
    match state
        .sandboxes
        .get_sandbox_by_session_api_key(&params.session_api_key)
        .await
    {
        Some(info) => Json(info).into_response(),
        // Never echo the credential back.
        None => not_found("by session key"),
    }
}

#[derive(Debug, Default, Deserialize)]
struct StartSandboxRequest {
    sandbox_spec_id: Option<String>,
    sandbox_id: Option<String>,
}

async fn start_sandbox(
    State(state): State<Arc<GatewayState>>,
    body: Option<Json<StartSandboxRequest>>,
) -> Response {
    let Json(request) = body.unwrap_or_default();
    match state
        .sandboxes
        .start_sandbox(request.sandbox_spec_id.as_deref(), request.sandbox_id.as_deref())
        .await
    {
        Ok(info) => (StatusCode::CREATED, Json(info)).into_response(),
        Err(e @ SandboxError::SpecNotFound(_)) => {
            (StatusCode::NOT_FOUND, Json(json!({ "error": e.to_string() }))).into_response()
        },
        Err(e) => (
            StatusCode::BAD_GATEWAY,
            Json(json!({ "error": e.to_string() })),
        )
            .into_response(),
    }
}

async fn pause_sandbox(
    State(state): State<Arc<GatewayState>>,
    Path(sandbox_id): Path<String>,
) -> Response {
    if state.sandboxes.pause_sandbox(&sandbox_id).await {
        Json(json!({ "ok": true })).into_response()
    } else {
        not_found(&sandbox_id)
    }
}

async fn resume_sandbox(
    State(state): State<Arc<GatewayState>>,
    Path(sandbox_id): Path<String>,
) -> Response {
    if state.sandboxes.resume_sandbox(&sandbox_id).await {
        Json(json!({ "ok": true })).into_response()
    } else {
        not_found(&sandbox_id)
    }
}

async fn delete_sandbox(
    State(state): State<Arc<GatewayState>>,
    Path(sandbox_id): Path<String>,
) -> Response {
    if state.sandboxes.delete_sandbox(&sandbox_id).await {
        Json(json!({ "ok": true })).into_response()
    } else {
        not_found(&sandbox_id)
    }
}

// ── Webhooks ─────────────────────────────────────────────────────────────────

/// Inbound callback sink for agents and external trackers. Always 200:
/// a flaky sender retrying against this endpoint gains nothing from
/// seeing errors, and malformed events are simply dropped after logging.
async fn webhook_event(
    State(state): State<Arc<GatewayState>>,
    Json(payload): Json<Value>,
) -> impl IntoResponse {
    let request = webhook::extract_event(&payload);
    info!(source = %request.source, title = %request.title, "webhook event received");
    state.conversations.start_conversation(request).await;
    Json(json!({ "received": true }))
}
