//! WebSocket message dispatch
//!
//! Authorization is checked here, then commands go to the host handlers.
//! State changes reach clients through the room broadcast; the return value
//! is only for replies meant for the sender.

use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::Role;
use std::sync::Arc;

use super::host;

/// Macro to check host authorization and return early if unauthorized
macro_rules! check_host {
    ($role:expr, $action:expr) => {
        if *$role != Role::Host {
            return Some(ServerMessage::Error {
                code: "UNAUTHORIZED".to_string(),
                msg: format!("Only the host can {}", $action),
            });
        }
    };
}

/// Handle a client message for `room` and return an optional direct reply
pub async fn handle_message(
    msg: ClientMessage,
    role: &Role,
    room: &str,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    match msg {
        ClientMessage::RequestState => match state.snapshot(room).await {
            Ok(room) => Some(ServerMessage::Room { room }),
            Err(e) => Some(host::error_message(e)),
        },

        ClientMessage::AddPlayer { name } => {
            check_host!(role, "add players");
            host::handle_add_player(state, room, name).await
        }

        ClientMessage::RemovePlayer { name } => {
            check_host!(role, "remove players");
            host::handle_remove_player(state, room, name).await
        }

        ClientMessage::AddCustomPrompt { prompt } => {
            check_host!(role, "add custom prompts");
            host::handle_add_custom_prompt(state, room, prompt).await
        }

        ClientMessage::UpdateSettings { settings } => {
            check_host!(role, "change settings");
            host::handle_update_settings(state, room, settings).await
        }

        ClientMessage::StartGame => {
            check_host!(role, "start the game");
            host::handle_start_game(state, room).await
        }

        ClientMessage::NextPlayer => {
            check_host!(role, "call the next player");
            host::handle_next_player(state, room).await
        }

        ClientMessage::DrawPrompt { choice } => {
            check_host!(role, "draw prompts");
            host::handle_draw_prompt(state, room, choice).await
        }

        ClientMessage::NextTurn { choice } => {
            check_host!(role, "start turns");
            host::handle_next_turn(state, room, choice).await
        }

        ClientMessage::CompleteTurn { outcome } => {
            check_host!(role, "complete turns");
            host::handle_complete_turn(state, room, outcome).await
        }

        ClientMessage::ResetGame => {
            check_host!(role, "reset the game");
            host::handle_reset_game(state, room).await
        }

        ClientMessage::EndGame => {
            check_host!(role, "end the game");
            host::handle_end_game(state, room).await
        }
    }
}
