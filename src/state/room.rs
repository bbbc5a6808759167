use super::{normalize_code, AppState, RoomError, RoomResult, MAX_CUSTOM_PROMPTS};
use crate::content::{ContentQuery, RawPrompt};
use crate::protocol::ServerMessage;
use crate::session::{GameSession, Turn};
use crate::types::*;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tokio::sync::broadcast;

/// One party: lobby roster and settings, plus the running session once started
pub struct Room {
    pub code: RoomCode,
    pub name: String,
    /// Presented by the device that runs the game
    pub host_token: String,
    pub roster: Vec<PlayerName>,
    pub custom_prompts: Vec<Prompt>,
    pub settings: GameSettings,
    pub session: Option<GameSession>,
    /// Query the running session's pool was loaded with
    pub pool_query: Option<ContentQuery>,
    pub created_at: String,
    pub broadcast: broadcast::Sender<ServerMessage>,
    last_activity: Instant,
}

/// Serializable view of a room for clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoomSnapshot {
    pub code: RoomCode,
    pub name: String,
    pub roster: Vec<PlayerName>,
    pub settings: GameSettings,
    pub custom_prompt_count: usize,
    pub started: bool,
    pub pool_size: usize,
    /// Prompts passing the current settings
    pub eligible: usize,
    pub current_turn: Option<Turn>,
    pub stats: Option<SessionStats>,
    /// The settings ask for content outside the loaded pool; a restart
    /// is needed before it can be drawn
    pub settings_require_restart: bool,
    pub created_at: String,
}

impl Room {
    pub(super) fn new(code: RoomCode, name: String) -> Self {
        let (tx, _rx) = broadcast::channel(100);
        Self {
            code,
            name,
            host_token: ulid::Ulid::new().to_string(),
            roster: Vec::new(),
            custom_prompts: Vec::new(),
            settings: GameSettings::default(),
            session: None,
            pool_query: None,
            created_at: chrono::Utc::now().to_rfc3339(),
            broadcast: tx,
            last_activity: Instant::now(),
        }
    }

    pub(super) fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }

    fn settings_require_restart(&self) -> bool {
        match (&self.session, &self.pool_query) {
            (Some(_), Some(loaded)) => {
                !loaded.covers(&ContentQuery::from_settings(&self.settings))
            }
            _ => false,
        }
    }

    pub fn session_mut(&mut self) -> RoomResult<&mut GameSession> {
        self.session.as_mut().ok_or(RoomError::GameNotStarted)
    }

    pub fn snapshot(&self) -> RoomSnapshot {
        let (pool_size, eligible, current_turn, stats) = match &self.session {
            Some(session) => (
                session.pool().len(),
                session.eligible_count(),
                session.current_turn(),
                Some(session.stats()),
            ),
            None => (0, 0, None, None),
        };

        RoomSnapshot {
            code: self.code.clone(),
            name: self.name.clone(),
            roster: self.roster.clone(),
            settings: self.settings.clone(),
            custom_prompt_count: self.custom_prompts.len(),
            started: self.session.is_some(),
            pool_size,
            eligible,
            current_turn,
            stats,
            settings_require_restart: self.settings_require_restart(),
            created_at: self.created_at.clone(),
        }
    }
}

/// Returned to the creator of a room
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedRoom {
    pub code: RoomCode,
    pub name: String,
    pub host_token: String,
}

impl AppState {
    /// Create an empty room with a fresh join code
    pub async fn create_room(&self) -> RoomSnapshot {
        self.create_room_with_token().await.0
    }

    /// Create a room and also return its host token
    pub async fn create_room_with_token(&self) -> (RoomSnapshot, CreatedRoom) {
        let mut rooms = self.rooms.write().await;
        let code = loop {
            let code = super::player::generate_short_code();
            if !rooms.contains_key(&code) {
                break code;
            }
        };
        let name = petname::petname(2, "-").unwrap_or_else(|| code.to_lowercase());

        let room = Room::new(code.clone(), name);
        let snapshot = room.snapshot();
        let created = CreatedRoom {
            code: room.code.clone(),
            name: room.name.clone(),
            host_token: room.host_token.clone(),
        };
        rooms.insert(code.clone(), room);

        tracing::info!("Created room {} ({})", code, created.name);
        (snapshot, created)
    }

    pub async fn snapshot(&self, code: &str) -> RoomResult<RoomSnapshot> {
        let code = normalize_code(code);
        self.rooms
            .read()
            .await
            .get(&code)
            .map(Room::snapshot)
            .ok_or(RoomError::NotFound(code))
    }

    /// Whether `token` is the host token of the room
    pub async fn is_host(&self, code: &str, token: &str) -> bool {
        let code = normalize_code(code);
        self.rooms
            .read()
            .await
            .get(&code)
            .is_some_and(|room| room.host_token == token)
    }

    /// Add a player-written prompt to the room's custom pool
    pub async fn add_custom_prompt(&self, code: &str, raw: RawPrompt) -> RoomResult<Prompt> {
        let prompt = raw.validate(PromptSource::Custom)?;
        self.with_room(code, |room| {
            if room.custom_prompts.len() >= MAX_CUSTOM_PROMPTS {
                return Err(RoomError::TooManyCustomPrompts);
            }
            room.custom_prompts.push(prompt.clone());
            tracing::info!(
                "Room {}: custom {} prompt added ({} total)",
                room.code,
                prompt.content_type,
                room.custom_prompts.len()
            );
            Ok(prompt)
        })
        .await
    }

    /// Change game settings. Applies to the running session, if any.
    pub async fn update_settings(
        &self,
        code: &str,
        settings: GameSettings,
    ) -> RoomResult<RoomSnapshot> {
        self.with_room(code, |room| {
            room.settings = settings.clone();
            if let Some(session) = room.session.as_mut() {
                session.update_settings(settings);
            }
            Ok(room.snapshot())
        })
        .await
    }

    /// Remove rooms idle longer than `ttl` with no connected clients.
    /// Returns how many were removed.
    pub async fn reap_idle_rooms(&self, ttl: Duration) -> usize {
        let mut rooms = self.rooms.write().await;
        let before = rooms.len();
        rooms.retain(|code, room| {
            // A connected screen keeps the room alive
            let keep = room.idle_for() < ttl || room.broadcast.receiver_count() > 0;
            if !keep {
                tracing::info!("Removing idle room {}", code);
            }
            keep
        });
        before - rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_room_codes_unique() {
        let state = AppState::new();
        let mut codes = std::collections::HashSet::new();
        for _ in 0..50 {
            codes.insert(state.create_room().await.code);
        }
        assert_eq!(codes.len(), 50);
    }

    #[tokio::test]
    async fn test_host_token() {
        let state = AppState::new();
        let (_, created) = state.create_room_with_token().await;
        assert!(state.is_host(&created.code, &created.host_token).await);
        assert!(!state.is_host(&created.code, "guess").await);
        assert!(!state.is_host("NOPE1", &created.host_token).await);
    }

    #[tokio::test]
    async fn test_custom_prompts() {
        let state = AppState::new();
        let room = state.create_room().await;

        let raw: RawPrompt =
            serde_json::from_value(json!({"text": "Sing the chorus of your guilty pleasure", "type": "dare", "level": 2}))
                .unwrap();
        let prompt = state.add_custom_prompt(&room.code, raw).await.unwrap();
        assert_eq!(prompt.source, PromptSource::Custom);
        assert!(prompt.id.starts_with("custom-"));

        let bad: RawPrompt = serde_json::from_value(json!({"type": "dare"})).unwrap();
        let err = state.add_custom_prompt(&room.code, bad).await.unwrap_err();
        assert_eq!(err.code(), "INVALID_PROMPT");

        assert_eq!(
            state.snapshot(&room.code).await.unwrap().custom_prompt_count,
            1
        );
    }

    #[tokio::test]
    async fn test_custom_prompt_limit() {
        let state = AppState::new();
        let room = state.create_room().await;
        for i in 0..MAX_CUSTOM_PROMPTS {
            let raw: RawPrompt =
                serde_json::from_value(json!({"text": format!("Truth {}", i), "type": "truth"}))
                    .unwrap();
            state.add_custom_prompt(&room.code, raw).await.unwrap();
        }
        let raw: RawPrompt =
            serde_json::from_value(json!({"text": "One too many", "type": "truth"})).unwrap();
        assert!(matches!(
            state.add_custom_prompt(&room.code, raw).await,
            Err(RoomError::TooManyCustomPrompts)
        ));
    }

    #[tokio::test]
    async fn test_update_settings() {
        let state = AppState::new();
        let room = state.create_room().await;
        let settings = GameSettings {
            mode: GameMode::Chaos,
            max_level: Level::MIN,
            adult_enabled: true,
        };
        let snapshot = state
            .update_settings(&room.code, settings.clone())
            .await
            .unwrap();
        assert_eq!(snapshot.settings, settings);
    }

    #[tokio::test]
    async fn test_reap_idle_rooms() {
        let state = AppState::new();
        state.create_room().await;
        state.create_room().await;

        assert_eq!(state.reap_idle_rooms(Duration::from_secs(3600)).await, 0);
        assert_eq!(state.reap_idle_rooms(Duration::ZERO).await, 2);
        assert!(state.rooms.read().await.is_empty());
    }

    #[tokio::test]
    async fn test_connected_rooms_are_not_reaped() {
        let state = AppState::new();
        let watched = state.create_room().await;
        let abandoned = state.create_room().await;
        let screen = state.subscribe(&watched.code).await.unwrap();

        assert_eq!(state.reap_idle_rooms(Duration::ZERO).await, 1);
        assert!(state.snapshot(&watched.code).await.is_ok());
        assert!(state.snapshot(&abandoned.code).await.is_err());

        drop(screen);
        assert_eq!(state.reap_idle_rooms(Duration::ZERO).await, 1);
        assert!(state.snapshot(&watched.code).await.is_err());
    }
}
