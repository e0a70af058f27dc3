// HTTP + WebSocket routes

mod http;
mod ws;

use axum::{
    Router,
    routing::get,
};
use std::sync::Arc;
use std::sync::atomic::AtomicUsize;
use tower_http::cors::{Any, CorsLayer};

use crate::diagnostics::DiagnosticsRequester;
use crate::scheduler::FleetPublisher;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) publisher: FleetPublisher,
    pub(crate) diagnostics: Arc<DiagnosticsRequester>,
    pub(crate) ws_fleet_connections: Arc<AtomicUsize>,
}

pub fn app(
    publisher: FleetPublisher,
    diagnostics: Arc<DiagnosticsRequester>,
    ws_fleet_connections: Arc<AtomicUsize>,
) -> Router {
    let state = AppState {
        publisher,
        diagnostics,
        ws_fleet_connections,
    };
    Router::new()
        .route("/", get(|| async { "Sentinel: fleet monitor (simulation mode)" })) // GET /
        .route("/version", get(http::version_handler)) // GET /version
        .route("/api/servers", get(http::servers_handler)) // GET /api/servers
        .route("/api/servers/{id}", get(http::server_handler)) // GET /api/servers/{id}
        .route("/api/summary", get(http::summary_handler)) // GET /api/summary
        .route(
            "/api/diagnostics",
            get(http::diagnostics_status_handler).post(http::diagnostics_start_handler),
        ) // GET, POST /api/diagnostics
        .route("/api/guide", get(http::guide_handler)) // GET /api/guide
        .route("/ws/fleet", get(ws::ws_fleet)) // WS /ws/fleet
        .layer(CorsLayer::new().allow_origin(Any))
        .with_state(state)
}
