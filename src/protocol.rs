use crate::content::RawPrompt;
use crate::session::Turn;
use crate::state::RoomSnapshot;
use crate::types::*;
use serde::{Deserialize, Serialize};

pub const PROTOCOL_VERSION: &str = "1.0";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Ask for a fresh room snapshot
    RequestState,
    // Host-only messages
    AddPlayer {
        name: String,
    },
    RemovePlayer {
        name: String,
    },
    AddCustomPrompt {
        prompt: RawPrompt,
    },
    UpdateSettings {
        settings: GameSettings,
    },
    StartGame,
    /// Call up the next player without drawing (truth-or-dare flow)
    NextPlayer,
    /// Draw for the player who is up, optionally picking truth or dare
    DrawPrompt {
        #[serde(default)]
        choice: Option<ContentType>,
    },
    /// Next player and their prompt in one step
    NextTurn {
        #[serde(default)]
        choice: Option<ContentType>,
    },
    CompleteTurn {
        outcome: TurnOutcome,
    },
    ResetGame,
    EndGame,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case")]
pub enum ServerMessage {
    Welcome {
        protocol: String,
        role: Role,
        room: RoomSnapshot,
        server_now: String,
    },
    /// Lobby or game state changed
    Room {
        room: RoomSnapshot,
    },
    GameStarted {
        room: RoomSnapshot,
        /// The content store was unreachable and built-in prompts are in use
        used_fallback: bool,
    },
    PlayerUp {
        round_no: u32,
        player: PlayerName,
    },
    Turn {
        turn: Turn,
    },
    /// Nothing in the pool passes the current settings
    NoContent {
        player: PlayerName,
        msg: String,
    },
    CustomPromptAdded {
        prompt: Prompt,
    },
    Stats {
        stats: SessionStats,
    },
    GameEnded {
        stats: SessionStats,
    },
    Error {
        code: String,
        msg: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_message_wire_format() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"t":"next_turn","choice":"dare"}"#).unwrap();
        assert!(matches!(
            msg,
            ClientMessage::NextTurn {
                choice: Some(ContentType::Dare)
            }
        ));

        let msg: ClientMessage = serde_json::from_str(r#"{"t":"next_turn"}"#).unwrap();
        assert!(matches!(msg, ClientMessage::NextTurn { choice: None }));

        let msg: ClientMessage = serde_json::from_str(
            r#"{"t":"complete_turn","outcome":{"kind":"drink","sips":2}}"#,
        )
        .unwrap();
        assert!(matches!(
            msg,
            ClientMessage::CompleteTurn {
                outcome: TurnOutcome::Drink { sips: 2 }
            }
        ));

        let msg: ClientMessage = serde_json::from_str(
            r#"{"t":"update_settings","settings":{"mode":"truth_or_dare","max_level":2}}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::UpdateSettings { settings } => {
                assert_eq!(settings.mode, GameMode::TruthOrDare);
                assert_eq!(settings.max_level.get(), 2);
                assert!(!settings.adult_enabled);
            }
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn test_server_message_tagging() {
        let json = serde_json::to_value(ServerMessage::Error {
            code: "ROOM_NOT_FOUND".to_string(),
            msg: "nope".to_string(),
        })
        .unwrap();
        assert_eq!(json["t"], "error");
        assert_eq!(json["code"], "ROOM_NOT_FOUND");
    }
}
