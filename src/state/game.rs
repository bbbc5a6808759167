use super::{normalize_code, AppState, RoomError, RoomResult, RoomSnapshot};
use crate::content::{load_pool, ContentQuery};
use crate::rotation::RotationError;
use crate::session::{GameSession, SessionError, Turn};
use crate::types::*;

impl AppState {
    /// Load the prompt pool and start the round loop.
    ///
    /// Returns the room snapshot and whether the built-in prompts had to
    /// stand in for the content store.
    pub async fn start_game(&self, code: &str) -> RoomResult<(RoomSnapshot, bool)> {
        let code = normalize_code(code);

        // Pool loading does I/O, so gather what it needs and release the lock
        let (query, custom) = {
            let rooms = self.rooms.read().await;
            let room = rooms
                .get(&code)
                .ok_or_else(|| RoomError::NotFound(code.clone()))?;
            if room.session.is_some() {
                return Err(RoomError::GameAlreadyStarted);
            }
            if room.roster.is_empty() {
                return Err(SessionError::from(RotationError::InvalidRoster { count: 0 }).into());
            }
            (
                ContentQuery::from_settings(&room.settings),
                room.custom_prompts.clone(),
            )
        };

        let pool = load_pool(self.content.as_ref(), &query, &custom).await;
        let tuning = self.tuning;

        self.with_room(&code, move |room| {
            // Another host command may have won the race while the pool loaded
            if room.session.is_some() {
                return Err(RoomError::GameAlreadyStarted);
            }
            let session = GameSession::new(
                room.roster.clone(),
                pool.prompts,
                room.settings.clone(),
                tuning,
            )?;
            room.session = Some(session);
            room.pool_query = Some(query);

            tracing::info!(
                "Room {}: game started with {} players (fallback={}, rejected={})",
                room.code,
                room.roster.len(),
                pool.used_fallback,
                pool.rejected
            );
            Ok((room.snapshot(), pool.used_fallback))
        })
        .await
    }

    /// Call up the next player without drawing yet
    pub async fn next_player(&self, code: &str) -> RoomResult<Turn> {
        self.with_room(code, |room| {
            let session = room.session_mut()?;
            session.next_player()?;
            Ok(session
                .current_turn()
                .ok_or(SessionError::NoTurnInProgress)?)
        })
        .await
    }

    /// Draw for the player who is up
    pub async fn draw_prompt(&self, code: &str, choice: Option<ContentType>) -> RoomResult<Turn> {
        self.with_room(code, |room| {
            let session = room.session_mut()?;
            session.draw_prompt(choice)?;
            Ok(session
                .current_turn()
                .ok_or(SessionError::NoTurnInProgress)?)
        })
        .await
    }

    /// Next player and their prompt in one step
    pub async fn next_turn(&self, code: &str, choice: Option<ContentType>) -> RoomResult<Turn> {
        self.with_room(code, |room| Ok(room.session_mut()?.next_turn(choice)?))
            .await
    }

    pub async fn complete_turn(&self, code: &str, outcome: TurnOutcome) -> RoomResult<SessionStats> {
        self.with_room(code, |room| Ok(room.session_mut()?.complete_turn(outcome)?))
            .await
    }

    /// What a player would draw next, without marking anything seen
    pub async fn preview(
        &self,
        code: &str,
        player: &str,
        choice: Option<ContentType>,
    ) -> RoomResult<Option<Prompt>> {
        self.with_room(code, |room| Ok(room.session_mut()?.preview(player, choice)?))
            .await
    }

    /// Restart rotation, tallies and exposures with the same pool
    pub async fn reset_game(&self, code: &str) -> RoomResult<RoomSnapshot> {
        self.with_room(code, |room| {
            room.session_mut()?.reset()?;
            tracing::info!("Room {}: game reset", room.code);
            Ok(room.snapshot())
        })
        .await
    }

    /// Stop the game and return the final tallies. The lobby stays open.
    pub async fn end_game(&self, code: &str) -> RoomResult<SessionStats> {
        self.with_room(code, |room| {
            let session = room.session.take().ok_or(RoomError::GameNotStarted)?;
            room.pool_query = None;
            let stats = session.stats();
            tracing::info!(
                "Room {}: game ended after {} turns",
                room.code,
                stats.turns_played
            );
            Ok(stats)
        })
        .await
    }
}
