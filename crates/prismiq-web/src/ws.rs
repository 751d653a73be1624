//! WebSocket endpoints.
//!
//! `/ws/logs` relays pipeline stage messages and closes after the
//! completion message. `/ws/explorer` pushes the latest explorer listing
//! on a fixed interval until the client goes away.

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use prismiq_classifier::PipelineStage;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use crate::response::explorer_entries;
use crate::state::{AppEvent, SharedState};

const EXPLORER_PUSH_LIMIT: usize = 20;

pub async fn ws_logs(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_logs(socket, state))
}

pub async fn ws_explorer(ws: WebSocketUpgrade, State(state): State<SharedState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| stream_explorer(socket, state))
}

async fn stream_logs(mut socket: WebSocket, state: SharedState) {
    let mut rx = state.subscribe();
    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Ok(AppEvent::PipelineStage { stage, message }) => {
                    if socket.send(Message::Text(message.into())).await.is_err() {
                        return;
                    }
                    if stage == PipelineStage::Complete {
                        break;
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "log socket lagged behind pipeline events");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = socket.recv() => match incoming {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => {
                    debug!("log socket closed by client");
                    return;
                }
                Some(Ok(_)) => {}
            },
        }
    }
    let _ = socket.send(Message::Close(None)).await;
}

async fn stream_explorer(socket: WebSocket, state: SharedState) {
    let (mut sender, mut receiver) = socket.split();
    let mut ticker = tokio::time::interval(state.config.explorer_poll);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let records = match state.store.list(0, EXPLORER_PUSH_LIMIT).await {
                    Ok(records) => records,
                    Err(e) => {
                        warn!(error = %e, "explorer push failed to read store");
                        continue;
                    }
                };
                let payload = match serde_json::to_string(&explorer_entries(&records)) {
                    Ok(payload) => payload,
                    Err(e) => {
                        warn!(error = %e, "explorer push failed to encode");
                        continue;
                    }
                };
                if sender.send(Message::Text(payload.into())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                None | Some(Err(_)) | Some(Ok(Message::Close(_))) => break,
                Some(Ok(_)) => {}
            },
        }
    }
    debug!("explorer socket closed");
}
