//! Game session: the per-room context that drives rounds.
//!
//! Owns the roster, the rotation queue, every player's exposure and drink
//! tally, the prompt pool and the random source. A turn has two steps so a
//! truth-or-dare player can pick after being called: [`GameSession::next_player`]
//! then [`GameSession::draw_prompt`]. [`GameSession::next_turn`] does both.

use crate::config::GameTuning;
use crate::rotation::{RotationError, RotationQueue};
use crate::selector::{ContentSelector, Exposure, SelectionFilters};
use crate::types::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

/// Longest accepted player name
pub const MAX_NAME_CHARS: usize = 24;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum SessionError {
    #[error(transparent)]
    InvalidRoster(#[from] RotationError),

    #[error("Player names must be 1-{max} characters", max = MAX_NAME_CHARS)]
    InvalidName,

    #[error("Player '{0}' is already in the game")]
    DuplicatePlayer(PlayerName),

    #[error("Player '{0}' is not in the game")]
    UnknownPlayer(PlayerName),

    #[error("Finish the current turn first")]
    TurnInProgress,

    #[error("No turn in progress")]
    NoTurnInProgress,

    #[error("A prompt was already drawn for this turn")]
    PromptAlreadyDrawn,

    #[error("'{choice}' is not part of the {mode:?} mode")]
    ChoiceNotInMode { choice: ContentType, mode: GameMode },
}

/// Trim a player name and check its length
pub fn normalize_name(name: &str) -> Result<PlayerName, SessionError> {
    let trimmed = name.trim();
    let len = trimmed.chars().count();
    if len == 0 || len > MAX_NAME_CHARS {
        return Err(SessionError::InvalidName);
    }
    Ok(trimmed.to_string())
}

/// Case-insensitive name comparison, Unicode aware
pub fn same_name(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

/// Reject a name that already exists in `roster`, ignoring case
pub fn ensure_unique(roster: &[PlayerName], name: &str) -> Result<(), SessionError> {
    if roster.iter().any(|existing| same_name(existing, name)) {
        return Err(SessionError::DuplicatePlayer(name.to_string()));
    }
    Ok(())
}

/// One player's turn as presented to the room
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Turn {
    pub round_no: u32,
    pub player: PlayerName,
    /// `None` when no prompt passes the current settings
    pub prompt: Option<Prompt>,
    /// The player had seen everything eligible and started over
    pub epoch_reset: bool,
}

#[derive(Debug, Clone)]
struct Seat {
    name: PlayerName,
    exposure: Exposure,
    drinks: u32,
}

impl Seat {
    fn new(name: PlayerName) -> Self {
        Self {
            name,
            exposure: Exposure::new(),
            drinks: 0,
        }
    }
}

#[derive(Debug, Clone)]
struct PendingTurn {
    player: PlayerIndex,
    drawn: Option<Prompt>,
    epoch_reset: bool,
}

pub struct GameSession {
    seats: Vec<Seat>,
    rotation: RotationQueue,
    selector: ContentSelector,
    pool: Vec<Prompt>,
    settings: GameSettings,
    tuning: GameTuning,
    rng: StdRng,
    round_no: u32,
    turns_played: u32,
    pending: Option<PendingTurn>,
}

impl GameSession {
    pub fn new(
        roster: Vec<PlayerName>,
        pool: Vec<Prompt>,
        settings: GameSettings,
        tuning: GameTuning,
    ) -> Result<Self, SessionError> {
        Self::with_rng(roster, pool, settings, tuning, StdRng::from_os_rng())
    }

    /// Build a session with a caller-provided random source
    pub fn with_rng(
        roster: Vec<PlayerName>,
        pool: Vec<Prompt>,
        settings: GameSettings,
        tuning: GameTuning,
        mut rng: StdRng,
    ) -> Result<Self, SessionError> {
        let mut names: Vec<PlayerName> = Vec::with_capacity(roster.len());
        for name in &roster {
            let name = normalize_name(name)?;
            ensure_unique(&names, &name)?;
            names.push(name);
        }

        let rotation = RotationQueue::new(names.len(), tuning.rotation, &mut rng)?;

        tracing::info!(
            "Session started with {} players and {} prompts ({:?}, max level {}, adult={})",
            names.len(),
            pool.len(),
            settings.mode,
            settings.max_level.get(),
            settings.adult_enabled
        );

        Ok(Self {
            seats: names.into_iter().map(Seat::new).collect(),
            rotation,
            selector: ContentSelector::new(tuning.selector),
            pool,
            settings,
            tuning,
            rng,
            round_no: 1,
            turns_played: 0,
            pending: None,
        })
    }

    pub fn roster(&self) -> Vec<PlayerName> {
        self.seats.iter().map(|s| s.name.clone()).collect()
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn pool(&self) -> &[Prompt] {
        &self.pool
    }

    /// Prompts in the pool that pass the current settings
    pub fn eligible_count(&self) -> usize {
        ContentSelector::eligible_count(&self.pool, &SelectionFilters::from_settings(&self.settings))
    }

    /// The turn currently being played, if any
    pub fn current_turn(&self) -> Option<Turn> {
        self.pending.as_ref().map(|pending| self.turn_view(pending))
    }

    fn turn_view(&self, pending: &PendingTurn) -> Turn {
        Turn {
            round_no: self.round_no,
            player: self.seats[pending.player].name.clone(),
            prompt: pending.drawn.clone(),
            epoch_reset: pending.epoch_reset,
        }
    }

    fn seat_index(&self, name: &str) -> Result<PlayerIndex, SessionError> {
        self.seats
            .iter()
            .position(|s| same_name(&s.name, name))
            .ok_or_else(|| SessionError::UnknownPlayer(name.to_string()))
    }

    fn filters_for(&self, choice: Option<ContentType>) -> Result<SelectionFilters, SessionError> {
        let filters = SelectionFilters::from_settings(&self.settings);
        match choice {
            None => Ok(filters),
            Some(choice) if filters.required_types.contains(&choice) => {
                Ok(filters.narrowed_to(choice))
            }
            Some(choice) => Err(SessionError::ChoiceNotInMode {
                choice,
                mode: self.settings.mode,
            }),
        }
    }

    /// Call up the next player
    pub fn next_player(&mut self) -> Result<PlayerName, SessionError> {
        if self.pending.is_some() {
            return Err(SessionError::TurnInProgress);
        }

        let player = self.rotation.advance(&mut self.rng);
        self.pending = Some(PendingTurn {
            player,
            drawn: None,
            epoch_reset: false,
        });

        let name = self.seats[player].name.clone();
        tracing::debug!("Round {}: {} is up", self.round_no, name);
        Ok(name)
    }

    /// Draw a prompt for the player whose turn it is and mark it seen.
    ///
    /// `choice` narrows the mode's content types, e.g. truth or dare.
    /// Returns `Ok(None)` when nothing passes the settings; the player may
    /// then draw again after the settings change, or complete the turn.
    pub fn draw_prompt(
        &mut self,
        choice: Option<ContentType>,
    ) -> Result<Option<Prompt>, SessionError> {
        let filters = self.filters_for(choice)?;
        let pending = self.pending.as_mut().ok_or(SessionError::NoTurnInProgress)?;
        if pending.drawn.is_some() {
            return Err(SessionError::PromptAlreadyDrawn);
        }

        let seat = &mut self.seats[pending.player];
        let Some(selection) =
            self.selector
                .select(&self.pool, &mut seat.exposure, &filters, &mut self.rng)
        else {
            return Ok(None);
        };

        let prompt = selection.prompt.clone();
        seat.exposure.mark_seen(&prompt.id);
        pending.drawn = Some(prompt.clone());
        pending.epoch_reset = selection.epoch_reset;

        tracing::debug!(
            "{} drew {} prompt {} (seen {} this epoch)",
            seat.name,
            prompt.content_type,
            prompt.id,
            seat.exposure.len()
        );
        Ok(Some(prompt))
    }

    /// Call up the next player and draw their prompt in one step
    pub fn next_turn(&mut self, choice: Option<ContentType>) -> Result<Turn, SessionError> {
        // Validate before the rotation moves
        self.filters_for(choice)?;
        self.next_player()?;
        self.draw_prompt(choice)?;
        self.current_turn().ok_or(SessionError::NoTurnInProgress)
    }

    /// Finish the current turn and move to the next round
    pub fn complete_turn(&mut self, outcome: TurnOutcome) -> Result<SessionStats, SessionError> {
        let pending = self.pending.take().ok_or(SessionError::NoTurnInProgress)?;
        let seat = &mut self.seats[pending.player];
        seat.drinks = seat.drinks.saturating_add(outcome.sips());

        tracing::debug!(
            "Round {} done: {} -> {:?} ({} drinks total)",
            self.round_no,
            seat.name,
            outcome,
            seat.drinks
        );

        self.round_no += 1;
        self.turns_played += 1;
        Ok(self.stats())
    }

    /// Peek at what a player would draw without consuming it
    pub fn preview(
        &mut self,
        player: &str,
        choice: Option<ContentType>,
    ) -> Result<Option<Prompt>, SessionError> {
        let filters = self.filters_for(choice)?;
        let index = self.seat_index(player)?;
        let mut exposure = self.seats[index].exposure.clone();
        Ok(self
            .selector
            .select(&self.pool, &mut exposure, &filters, &mut self.rng)
            .map(|selection| selection.prompt.clone()))
    }

    /// Add a player mid-game. Resets rotation, tallies and exposures.
    pub fn add_player(&mut self, name: &str) -> Result<(), SessionError> {
        let name = normalize_name(name)?;
        ensure_unique(&self.roster(), &name)?;
        self.seats.push(Seat::new(name.clone()));
        self.reset()?;
        tracing::info!("{} joined, roster is now {} players", name, self.seats.len());
        Ok(())
    }

    /// Remove a player mid-game. Resets rotation, tallies and exposures.
    pub fn remove_player(&mut self, name: &str) -> Result<(), SessionError> {
        let index = self.seat_index(name)?;
        if self.seats.len() == 1 {
            return Err(RotationError::InvalidRoster { count: 0 }.into());
        }
        let removed = self.seats.remove(index);
        self.reset()?;
        tracing::info!(
            "{} left, roster is now {} players",
            removed.name,
            self.seats.len()
        );
        Ok(())
    }

    /// Change filters for later draws. Exposures are kept.
    pub fn update_settings(&mut self, settings: GameSettings) {
        tracing::info!("Session settings changed to {:?}", settings);
        self.settings = settings;
    }

    /// Start over with the same roster and pool
    pub fn reset(&mut self) -> Result<(), SessionError> {
        self.rotation.reset(self.seats.len(), &mut self.rng)?;
        for seat in &mut self.seats {
            *seat = Seat::new(std::mem::take(&mut seat.name));
        }
        self.pending = None;
        self.round_no = 1;
        self.turns_played = 0;
        Ok(())
    }

    pub fn tuning(&self) -> GameTuning {
        self.tuning
    }

    pub fn stats(&self) -> SessionStats {
        SessionStats {
            round_no: self.round_no,
            turns_played: self.turns_played,
            cycle: self.rotation.cycle(),
            players: self
                .seats
                .iter()
                .enumerate()
                .map(|(i, seat)| PlayerStats {
                    name: seat.name.clone(),
                    turns: self.rotation.turn_count(i),
                    drinks: seat.drinks,
                    seen: seat.exposure.len(),
                })
                .collect(),
        }
    }
}
