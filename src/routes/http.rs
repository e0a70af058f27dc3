// GET/POST handlers: version, fleet reads, diagnostics, deployment guide

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use super::AppState;
use crate::guide;
use crate::models::{AnalysisStatus, ServerRecord};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");

/// Single record plus its operator console link.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ServerDetail<'a> {
    #[serde(flatten)]
    server: &'a ServerRecord,
    operator_url: String,
}

/// GET /version: service name and version (from Cargo.toml at build time).
pub(super) async fn version_handler() -> impl IntoResponse {
    Json(serde_json::json!({
        "name": NAME,
        "version": VERSION,
    }))
}

/// GET /api/servers: latest published fleet snapshot.
pub(super) async fn servers_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.publisher.latest().as_ref().clone())
}

/// GET /api/servers/{id}
pub(super) async fn server_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Response {
    let snapshot = state.publisher.latest();
    match snapshot.find(&id) {
        Some(server) => Json(ServerDetail {
            server,
            operator_url: server.operator_url(),
        })
        .into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "error": format!("unknown server id: {id}") })),
        )
            .into_response(),
    }
}

/// GET /api/summary: status counts for the header badge.
pub(super) async fn summary_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.publisher.latest().summary())
}

/// GET /api/diagnostics: current analysis outcome.
pub(super) async fn diagnostics_status_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.diagnostics.current())
}

/// POST /api/diagnostics: 202 when a run starts, 409 while one is in flight,
/// 200 with the error outcome when the precheck fails.
pub(super) async fn diagnostics_start_handler(State(state): State<AppState>) -> Response {
    let snapshot = state.publisher.latest();
    match state.diagnostics.start(&snapshot.servers) {
        Ok(result) if result.status == AnalysisStatus::Analyzing => {
            tracing::info!(tick = snapshot.tick, "diagnostics started");
            (StatusCode::ACCEPTED, Json(result)).into_response()
        }
        Ok(result) => (StatusCode::OK, Json(result)).into_response(),
        Err(e) => {
            tracing::debug!(error = %e, "diagnostics trigger rejected");
            (StatusCode::CONFLICT, Json(state.diagnostics.current())).into_response()
        }
    }
}

/// GET /api/guide: deployment instructions for the monitoring hub.
pub(super) async fn guide_handler(State(state): State<AppState>) -> impl IntoResponse {
    Json(guide::deployment_guide(&state.publisher.latest().servers))
}
