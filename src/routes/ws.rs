// WebSocket fleet stream

use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
};
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::broadcast;
use tokio::time::{Duration, timeout};

use super::AppState;
use crate::models::FleetSnapshot;

pub(super) const WS_PING_INTERVAL: Duration = Duration::from_secs(30);
pub(super) const WS_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Decrements the ws_fleet connection count on drop (connect = +1, drop = -1).
struct WsFleetGuard(Arc<AtomicUsize>);

impl Drop for WsFleetGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

pub(super) async fn ws_fleet(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let publisher = state.publisher.clone();
    let conn_count = state.ws_fleet_connections.clone();
    ws.on_upgrade(move |socket| async move {
        // Subscribe before reading latest so no tick falls between the two.
        let mut rx = publisher.subscribe();
        let latest = publisher.latest();
        if let Err(e) = stream_fleet(socket, latest, &mut rx, conn_count).await {
            tracing::info!("Fleet stream error: {}", e);
        }
    })
}

/// Sends `true` when the frame went out within the send timeout.
async fn send_within_timeout(socket: &mut WebSocket, message: Message) -> bool {
    matches!(timeout(WS_SEND_TIMEOUT, socket.send(message)).await, Ok(Ok(())))
}

async fn stream_fleet(
    mut socket: WebSocket,
    latest: Arc<FleetSnapshot>,
    rx: &mut broadcast::Receiver<Arc<FleetSnapshot>>,
    conn_count: Arc<AtomicUsize>,
) -> anyhow::Result<()> {
    conn_count.fetch_add(1, Ordering::Relaxed);
    let _guard = WsFleetGuard(conn_count);
    tracing::info!("Client connected to fleet stream");

    let mut last_tick = latest.tick;
    let json = serde_json::to_string(latest.as_ref())?;
    if !send_within_timeout(&mut socket, Message::Text(json.into())).await {
        return Ok(());
    }

    let mut ping_interval = tokio::time::interval(WS_PING_INTERVAL);
    ping_interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    loop {
        tokio::select! {
            result = rx.recv() => {
                match result {
                    Ok(snapshot) => {
                        if snapshot.tick <= last_tick {
                            continue;
                        }
                        last_tick = snapshot.tick;
                        let json = serde_json::to_string(snapshot.as_ref())?;
                        if !send_within_timeout(&mut socket, Message::Text(json.into())).await {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        tracing::warn!("WebSocket /ws/fleet client lagged, skipped {} snapshots", n);
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
            _ = ping_interval.tick() => {
                if !send_within_timeout(&mut socket, Message::Ping(Bytes::new())).await {
                    break;
                }
            }
        }
    }
    Ok(())
}
