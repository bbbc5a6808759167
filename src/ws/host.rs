//! Host-only command handlers
//!
//! All handlers in this module require the Host role.
//! Authorization is checked in the main dispatch layer before calling these.

use crate::content::RawPrompt;
use crate::protocol::ServerMessage;
use crate::session::Turn;
use crate::state::{AppState, RoomError, RoomSnapshot};
use crate::types::*;
use std::sync::Arc;

/// Wire error for a failed room operation
pub fn error_message(e: RoomError) -> ServerMessage {
    ServerMessage::Error {
        code: e.code().to_string(),
        msg: e.to_string(),
    }
}

/// Broadcast a room snapshot, or hand the error back to the sender
async fn broadcast_snapshot(
    state: &Arc<AppState>,
    room: &str,
    result: Result<RoomSnapshot, RoomError>,
) -> Option<ServerMessage> {
    match result {
        Ok(snapshot) => {
            state
                .broadcast_to_room(room, ServerMessage::Room { room: snapshot })
                .await;
            None
        }
        Err(e) => Some(error_message(e)),
    }
}

/// Broadcast a drawn turn. A turn without a prompt becomes `no_content`.
async fn broadcast_turn(state: &Arc<AppState>, room: &str, turn: Turn) {
    let msg = if turn.prompt.is_some() {
        ServerMessage::Turn { turn }
    } else {
        ServerMessage::NoContent {
            msg: format!(
                "No prompts left for {} with the current settings",
                turn.player
            ),
            player: turn.player,
        }
    };
    state.broadcast_to_room(room, msg).await;
}

pub async fn handle_add_player(
    state: &Arc<AppState>,
    room: &str,
    name: String,
) -> Option<ServerMessage> {
    tracing::info!("Host adding player {:?} to room {}", name, room);
    let result = state.add_player(room, &name).await;
    broadcast_snapshot(state, room, result).await
}

pub async fn handle_remove_player(
    state: &Arc<AppState>,
    room: &str,
    name: String,
) -> Option<ServerMessage> {
    tracing::info!("Host removing player {:?} from room {}", name, room);
    let result = state.remove_player(room, &name).await;
    broadcast_snapshot(state, room, result).await
}

pub async fn handle_add_custom_prompt(
    state: &Arc<AppState>,
    room: &str,
    prompt: RawPrompt,
) -> Option<ServerMessage> {
    match state.add_custom_prompt(room, prompt).await {
        Ok(prompt) => {
            // Everyone sees the new count, only the author sees the text
            let snapshot = state.snapshot(room).await;
            broadcast_snapshot(state, room, snapshot).await;
            Some(ServerMessage::CustomPromptAdded { prompt })
        }
        Err(e) => Some(error_message(e)),
    }
}

pub async fn handle_update_settings(
    state: &Arc<AppState>,
    room: &str,
    settings: GameSettings,
) -> Option<ServerMessage> {
    tracing::info!("Host updating settings in room {}: {:?}", room, settings);
    let result = state.update_settings(room, settings).await;
    broadcast_snapshot(state, room, result).await
}

pub async fn handle_start_game(state: &Arc<AppState>, room: &str) -> Option<ServerMessage> {
    tracing::info!("Host starting game in room {}", room);
    match state.start_game(room).await {
        Ok((snapshot, used_fallback)) => {
            state
                .broadcast_to_room(
                    room,
                    ServerMessage::GameStarted {
                        room: snapshot,
                        used_fallback,
                    },
                )
                .await;
            None
        }
        Err(e) => Some(error_message(e)),
    }
}

pub async fn handle_next_player(state: &Arc<AppState>, room: &str) -> Option<ServerMessage> {
    match state.next_player(room).await {
        Ok(turn) => {
            state
                .broadcast_to_room(
                    room,
                    ServerMessage::PlayerUp {
                        round_no: turn.round_no,
                        player: turn.player,
                    },
                )
                .await;
            None
        }
        Err(e) => Some(error_message(e)),
    }
}

pub async fn handle_draw_prompt(
    state: &Arc<AppState>,
    room: &str,
    choice: Option<ContentType>,
) -> Option<ServerMessage> {
    match state.draw_prompt(room, choice).await {
        Ok(turn) => {
            broadcast_turn(state, room, turn).await;
            None
        }
        Err(e) => Some(error_message(e)),
    }
}

pub async fn handle_next_turn(
    state: &Arc<AppState>,
    room: &str,
    choice: Option<ContentType>,
) -> Option<ServerMessage> {
    match state.next_turn(room, choice).await {
        Ok(turn) => {
            broadcast_turn(state, room, turn).await;
            None
        }
        Err(e) => Some(error_message(e)),
    }
}

pub async fn handle_complete_turn(
    state: &Arc<AppState>,
    room: &str,
    outcome: TurnOutcome,
) -> Option<ServerMessage> {
    match state.complete_turn(room, outcome).await {
        Ok(stats) => {
            state
                .broadcast_to_room(room, ServerMessage::Stats { stats })
                .await;
            None
        }
        Err(e) => Some(error_message(e)),
    }
}

pub async fn handle_reset_game(state: &Arc<AppState>, room: &str) -> Option<ServerMessage> {
    tracing::info!("Host resetting game in room {}", room);
    let result = state.reset_game(room).await;
    broadcast_snapshot(state, room, result).await
}

pub async fn handle_end_game(state: &Arc<AppState>, room: &str) -> Option<ServerMessage> {
    tracing::info!("Host ending game in room {}", room);
    match state.end_game(room).await {
        Ok(stats) => {
            state
                .broadcast_to_room(room, ServerMessage::GameEnded { stats })
                .await;
            None
        }
        Err(e) => Some(error_message(e)),
    }
}
