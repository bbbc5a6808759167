//! Fair player rotation
//!
//! Hands out players from a shuffled cyclic order. Every player is visited
//! exactly once per cycle, and when a cycle is exhausted a fresh permutation
//! is drawn. The first player of a new cycle is swapped away from the front
//! if they were also the last player of the previous cycle.

use crate::types::PlayerIndex;
use rand::seq::SliceRandom;
use rand::Rng;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RotationError {
    #[error("Rotation needs at least one player, got {count}")]
    InvalidRoster { count: usize },
}

/// Tunable rotation behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RotationPolicy {
    /// Swap the first player of a new cycle if they just had the last turn
    pub avoid_repeat: bool,
}

impl Default for RotationPolicy {
    fn default() -> Self {
        Self { avoid_repeat: true }
    }
}

#[derive(Debug, Clone)]
pub struct RotationQueue {
    order: Vec<PlayerIndex>,
    /// Position of the next player to hand out within `order`
    next: usize,
    last_player: Option<PlayerIndex>,
    turn_counts: Vec<u32>,
    cycle: u32,
    policy: RotationPolicy,
}

/// Uniform permutation of `0..count` (Fisher-Yates via `SliceRandom::shuffle`)
fn permutation<R: Rng + ?Sized>(count: usize, rng: &mut R) -> Vec<PlayerIndex> {
    let mut order: Vec<PlayerIndex> = (0..count).collect();
    order.shuffle(rng);
    order
}

impl RotationQueue {
    /// Build a queue over `player_count` players with a fresh random order
    pub fn new<R: Rng + ?Sized>(
        player_count: usize,
        policy: RotationPolicy,
        rng: &mut R,
    ) -> Result<Self, RotationError> {
        if player_count < 1 {
            return Err(RotationError::InvalidRoster {
                count: player_count,
            });
        }

        Ok(Self {
            order: permutation(player_count, rng),
            next: 0,
            last_player: None,
            turn_counts: vec![0; player_count],
            cycle: 1,
            policy,
        })
    }

    pub fn player_count(&self) -> usize {
        self.order.len()
    }

    /// The player whose turn it is, or the upcoming player before the first draw
    pub fn current(&self) -> PlayerIndex {
        self.last_player.unwrap_or(self.order[0])
    }

    /// Hand out the next player, reshuffling when the cycle is exhausted
    pub fn advance<R: Rng + ?Sized>(&mut self, rng: &mut R) -> PlayerIndex {
        let count = self.order.len();

        let player = if count <= 1 {
            self.order[0]
        } else {
            if self.next >= count {
                self.reshuffle(rng);
            }
            let player = self.order[self.next];
            self.next += 1;
            player
        };

        debug_assert!(player < count, "rotation handed out index {} of {}", player, count);
        self.last_player = Some(player);
        self.turn_counts[player] += 1;
        player
    }

    fn reshuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let count = self.order.len();
        let mut order = permutation(count, rng);

        if self.policy.avoid_repeat && count > 1 && self.last_player == Some(order[0]) {
            // Any other slot holds a different player
            let target = rng.random_range(1..count);
            order.swap(0, target);
        }

        debug_assert_eq!(order.len(), count);
        self.order = order;
        self.next = 0;
        self.cycle += 1;
        tracing::debug!("Rotation reshuffled, starting cycle {}", self.cycle);
    }

    /// Reinitialize for a (possibly different) player count, clearing turn counters
    pub fn reset<R: Rng + ?Sized>(
        &mut self,
        player_count: usize,
        rng: &mut R,
    ) -> Result<(), RotationError> {
        *self = Self::new(player_count, self.policy, rng)?;
        Ok(())
    }

    /// Number of times `player` was handed out since the last reset
    pub fn turn_count(&self, player: PlayerIndex) -> u32 {
        self.turn_counts.get(player).copied().unwrap_or(0)
    }

    /// 1-based number of the cycle currently being handed out
    pub fn cycle(&self) -> u32 {
        self.cycle
    }

    /// Players not yet handed out in the current cycle
    pub fn remaining_in_cycle(&self) -> usize {
        self.order.len() - self.next.min(self.order.len())
    }
}
