mod game;
mod player;
mod room;

pub use room::{CreatedRoom, Room, RoomSnapshot};

use crate::config::{ContentConfig, ContentSource, GameTuning};
use crate::content::{
    ContentError, ContentResult, ContentStore, FileContentStore, HttpContentStore,
    MemoryContentStore,
};
use crate::protocol::ServerMessage;
use crate::session::SessionError;
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};

/// Most players a room accepts
pub const MAX_PLAYERS: usize = 20;

/// Most custom prompts a room accepts
pub const MAX_CUSTOM_PROMPTS: usize = 50;

#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    #[error("Room {0} not found")]
    NotFound(RoomCode),

    #[error("The game has not been started")]
    GameNotStarted,

    #[error("The game is already running")]
    GameAlreadyStarted,

    #[error("A room holds at most {max} players", max = MAX_PLAYERS)]
    RosterFull,

    #[error("A room holds at most {max} custom prompts", max = MAX_CUSTOM_PROMPTS)]
    TooManyCustomPrompts,

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Content(#[from] ContentError),
}

impl RoomError {
    /// Stable error code sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            RoomError::NotFound(_) => "ROOM_NOT_FOUND",
            RoomError::GameNotStarted => "GAME_NOT_STARTED",
            RoomError::GameAlreadyStarted => "GAME_ALREADY_STARTED",
            RoomError::RosterFull => "ROSTER_FULL",
            RoomError::TooManyCustomPrompts => "TOO_MANY_CUSTOM_PROMPTS",
            RoomError::Session(e) => match e {
                SessionError::InvalidRoster(_) => "INVALID_ROSTER",
                SessionError::InvalidName => "INVALID_NAME",
                SessionError::DuplicatePlayer(_) => "DUPLICATE_PLAYER",
                SessionError::UnknownPlayer(_) => "UNKNOWN_PLAYER",
                SessionError::TurnInProgress => "TURN_IN_PROGRESS",
                SessionError::NoTurnInProgress => "NO_TURN_IN_PROGRESS",
                SessionError::PromptAlreadyDrawn => "PROMPT_ALREADY_DRAWN",
                SessionError::ChoiceNotInMode { .. } => "CHOICE_NOT_IN_MODE",
            },
            RoomError::Content(_) => "INVALID_PROMPT",
        }
    }
}

pub type RoomResult<T> = Result<T, RoomError>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub rooms: Arc<RwLock<HashMap<RoomCode, Room>>>,
    /// Source of system prompts for new games
    pub content: Arc<dyn ContentStore>,
    /// Set when prompts are curated in memory through the admin API
    pub library: Option<Arc<MemoryContentStore>>,
    pub tuning: GameTuning,
}

impl AppState {
    /// State backed by the built-in prompt library and default tuning
    pub fn new() -> Self {
        let library = Arc::new(MemoryContentStore::with_fallback());
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            content: library.clone(),
            library: Some(library),
            tuning: GameTuning::default(),
        }
    }

    /// State backed by an arbitrary content store
    pub fn with_store(content: Arc<dyn ContentStore>, tuning: GameTuning) -> Self {
        Self {
            rooms: Arc::new(RwLock::new(HashMap::new())),
            content,
            library: None,
            tuning,
        }
    }

    pub fn from_config(config: &ContentConfig, tuning: GameTuning) -> ContentResult<Self> {
        let state = match &config.source {
            ContentSource::Http { base_url, timeout } => {
                tracing::info!("Using content store at {}", base_url);
                let store = HttpContentStore::new(base_url.clone(), *timeout)?;
                Self::with_store(Arc::new(store), tuning)
            }
            ContentSource::File(path) => {
                tracing::info!("Using content file {}", path.display());
                Self::with_store(Arc::new(FileContentStore::new(path.clone())), tuning)
            }
            ContentSource::Memory => {
                tracing::info!("Using in-memory content library");
                Self {
                    tuning,
                    ..Self::new()
                }
            }
        };
        Ok(state)
    }

    /// Run `f` against a room under the write lock, refreshing its activity time
    async fn with_room<T>(
        &self,
        code: &str,
        f: impl FnOnce(&mut Room) -> RoomResult<T>,
    ) -> RoomResult<T> {
        let code = normalize_code(code);
        let mut rooms = self.rooms.write().await;
        let room = rooms
            .get_mut(&code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        room.touch();
        f(room)
    }

    /// Subscribe to a room's broadcast channel
    pub async fn subscribe(&self, code: &str) -> RoomResult<broadcast::Receiver<ServerMessage>> {
        let code = normalize_code(code);
        self.rooms
            .read()
            .await
            .get(&code)
            .map(|room| room.broadcast.subscribe())
            .ok_or(RoomError::NotFound(code))
    }

    /// Send a message to every client connected to a room
    pub async fn broadcast_to_room(&self, code: &str, msg: ServerMessage) {
        let code = normalize_code(code);
        if let Some(room) = self.rooms.read().await.get(&code) {
            // No receivers connected is fine
            let _ = room.broadcast.send(msg);
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

/// Room codes are case-insensitive on input
pub fn normalize_code(code: &str) -> RoomCode {
    code.trim().to_uppercase()
}
