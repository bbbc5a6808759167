pub mod handlers;
mod host;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use futures::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;

use crate::protocol::{ClientMessage, ServerMessage, PROTOCOL_VERSION};
use crate::state::{normalize_code, AppState};
use crate::types::Role;

#[derive(Debug, Deserialize)]
pub struct WsQuery {
    pub room: String,
    /// Host token issued when the room was created
    pub token: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(params): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> Response {
    let room = normalize_code(&params.room);
    if state.snapshot(&room).await.is_err() {
        tracing::warn!("WebSocket request for unknown room {}", room);
        return (StatusCode::NOT_FOUND, "Room not found").into_response();
    }

    let role = match params.token.as_deref() {
        Some(token) if state.is_host(&room, token).await => Role::Host,
        _ => Role::Viewer,
    };

    tracing::info!("WebSocket connection request: room={}, role={:?}", room, role);

    ws.on_upgrade(move |socket| handle_socket(socket, room, role, state))
}

/// Handle individual WebSocket connection
async fn handle_socket(socket: WebSocket, room: String, role: Role, state: Arc<AppState>) {
    let (mut sender, mut receiver) = socket.split();

    // Subscribe before the welcome so no update slips between the two
    let mut broadcast_rx = match state.subscribe(&room).await {
        Ok(rx) => rx,
        Err(e) => {
            tracing::warn!("Room {} vanished before the socket opened: {}", room, e);
            return;
        }
    };

    let snapshot = match state.snapshot(&room).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            tracing::warn!("Room {} vanished before the socket opened: {}", room, e);
            return;
        }
    };

    let welcome = ServerMessage::Welcome {
        protocol: PROTOCOL_VERSION.to_string(),
        role: role.clone(),
        room: snapshot,
        server_now: chrono::Utc::now().to_rfc3339(),
    };

    if let Ok(msg) = serde_json::to_string(&welcome) {
        if sender.send(Message::Text(msg.into())).await.is_err() {
            tracing::error!("Failed to send welcome message");
            return;
        }
    }

    tracing::info!("WebSocket connected to room {} with role: {:?}", room, role);

    loop {
        tokio::select! {
            broadcast_msg = broadcast_rx.recv() => {
                match broadcast_msg {
                    Ok(msg) => {
                        if let Ok(json) = serde_json::to_string(&msg) {
                            if sender.send(Message::Text(json.into())).await.is_err() {
                                break;
                            }
                        }
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Client in room {} lagged, skipped {} messages", room, skipped);
                    }
                    // Room was reaped
                    Err(RecvError::Closed) => break,
                }
            }

            ws_msg = receiver.next() => {
                match ws_msg {
                    Some(Ok(Message::Text(text))) => {
                        tracing::debug!("Received message: {}", text);

                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(client_msg) => {
                                if let Some(response) =
                                    handlers::handle_message(client_msg, &role, &room, &state).await
                                {
                                    if let Ok(json) = serde_json::to_string(&response) {
                                        if sender.send(Message::Text(json.into())).await.is_err() {
                                            tracing::error!("Failed to send response");
                                            break;
                                        }
                                    }
                                }
                            }
                            Err(e) => {
                                tracing::error!("Failed to parse client message: {}", e);
                                let error = ServerMessage::Error {
                                    code: "PARSE_ERROR".to_string(),
                                    msg: format!("Invalid message format: {}", e),
                                };
                                if let Ok(json) = serde_json::to_string(&error) {
                                    let _ = sender.send(Message::Text(json.into())).await;
                                }
                            }
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        tracing::info!("WebSocket closed");
                        break;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(_)) => {}
                    Some(Err(e)) => {
                        tracing::error!("WebSocket error: {}", e);
                        break;
                    }
                    None => break,
                }
            }
        }
    }

    tracing::info!("WebSocket connection closed for room {} ({:?})", room, role);
}
