use super::{AppState, RoomError, RoomResult, RoomSnapshot, MAX_PLAYERS};
use crate::session::{ensure_unique, normalize_name};
use rand::Rng;

/// Safe character set for short codes (excludes 0/O, 1/I/L to avoid confusion)
const CODE_CHARS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 5;

/// Generate a random short room code (5 characters)
pub(super) fn generate_short_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

impl AppState {
    /// Add a player to the roster. During a game this resets the rotation,
    /// drink tallies and every player's seen prompts.
    pub async fn add_player(&self, code: &str, name: &str) -> RoomResult<RoomSnapshot> {
        self.with_room(code, |room| {
            let name = normalize_name(name)?;
            ensure_unique(&room.roster, &name)?;
            if room.roster.len() >= MAX_PLAYERS {
                return Err(RoomError::RosterFull);
            }

            if let Some(session) = room.session.as_mut() {
                session.add_player(&name)?;
                room.roster = session.roster();
            } else {
                room.roster.push(name.clone());
            }

            tracing::info!("Room {}: {} joined", room.code, name);
            Ok(room.snapshot())
        })
        .await
    }

    /// Remove a player from the roster. A running game keeps at least one player.
    pub async fn remove_player(&self, code: &str, name: &str) -> RoomResult<RoomSnapshot> {
        self.with_room(code, |room| {
            if let Some(session) = room.session.as_mut() {
                session.remove_player(name)?;
                room.roster = session.roster();
            } else {
                let index = room
                    .roster
                    .iter()
                    .position(|p| crate::session::same_name(p, name))
                    .ok_or_else(|| {
                        crate::session::SessionError::UnknownPlayer(name.to_string())
                    })?;
                room.roster.remove(index);
            }

            tracing::info!("Room {}: {} left", room.code, name);
            Ok(room.snapshot())
        })
        .await
    }
}
