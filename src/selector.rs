//! Non-repeating prompt selection
//!
//! Picks a prompt a player has not seen in their current exposure epoch.
//! When everything eligible has been seen, the player's exposure is cleared
//! and selection restarts from the full eligible pool.

use crate::types::{ContentType, GameSettings, Level, Prompt, PromptId};
use rand::seq::IndexedRandom;
use rand::Rng;
use std::collections::{BTreeSet, HashSet};

/// Default probability of narrowing to adult prompts when 18+ is enabled
pub const DEFAULT_ADULT_BIAS: f64 = 0.8;

/// Prompt ids a single player has been shown since their last reset
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Exposure {
    seen: HashSet<PromptId>,
    epoch: u32,
}

impl Exposure {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mark_seen(&mut self, id: &str) {
        self.seen.insert(id.to_string());
    }

    pub fn contains(&self, id: &str) -> bool {
        self.seen.contains(id)
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Start a new epoch with nothing seen
    pub fn clear(&mut self) {
        self.seen.clear();
        self.epoch += 1;
    }

    /// How many times this exposure has been cleared
    pub fn epoch(&self) -> u32 {
        self.epoch
    }
}

/// Eligibility filters for one selection
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionFilters {
    pub max_level: Level,
    pub adult_enabled: bool,
    /// Empty means any type
    pub required_types: BTreeSet<ContentType>,
}

impl SelectionFilters {
    pub fn from_settings(settings: &GameSettings) -> Self {
        Self {
            max_level: settings.max_level,
            adult_enabled: settings.adult_enabled,
            required_types: settings.mode.content_types(),
        }
    }

    /// Restrict to a single type (a truth-or-dare pick)
    pub fn narrowed_to(&self, content_type: ContentType) -> Self {
        Self {
            required_types: [content_type].into(),
            ..self.clone()
        }
    }

    pub fn allows(&self, prompt: &Prompt) -> bool {
        (self.required_types.is_empty() || self.required_types.contains(&prompt.content_type))
            && prompt.level <= self.max_level
            && (!prompt.adult || self.adult_enabled)
    }
}

/// Tunable selection behaviour
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectorPolicy {
    pub adult_bias: f64,
}

impl SelectorPolicy {
    pub fn new(adult_bias: f64) -> Self {
        let adult_bias = if adult_bias.is_finite() {
            adult_bias.clamp(0.0, 1.0)
        } else {
            DEFAULT_ADULT_BIAS
        };
        Self { adult_bias }
    }
}

impl Default for SelectorPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_ADULT_BIAS)
    }
}

/// Result of a selection, including whether the player's epoch rolled over
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Selection<'a> {
    pub prompt: &'a Prompt,
    pub epoch_reset: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ContentSelector {
    policy: SelectorPolicy,
}

impl ContentSelector {
    pub fn new(policy: SelectorPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> SelectorPolicy {
        self.policy
    }

    /// Pick an unseen eligible prompt for a player.
    ///
    /// Returns `None` only when no prompt in `pool` passes `filters` at all.
    /// Clears `exposure` if every eligible prompt has already been seen.
    /// Does not mark the returned prompt as seen.
    pub fn select<'a, R: Rng + ?Sized>(
        &self,
        pool: &'a [Prompt],
        exposure: &mut Exposure,
        filters: &SelectionFilters,
        rng: &mut R,
    ) -> Option<Selection<'a>> {
        let mut epoch_reset = false;
        let mut available: Vec<&Prompt> = pool
            .iter()
            .filter(|p| filters.allows(p) && !exposure.contains(&p.id))
            .collect();

        if available.is_empty() {
            available = pool.iter().filter(|p| filters.allows(p)).collect();
            if available.is_empty() {
                tracing::warn!(
                    "No eligible content for filters (max_level={}, adult={}, types={:?})",
                    filters.max_level.get(),
                    filters.adult_enabled,
                    filters.required_types
                );
                return None;
            }
            tracing::debug!(
                "Exposure exhausted after {} prompts, starting a new epoch",
                exposure.len()
            );
            exposure.clear();
            epoch_reset = true;
        }

        if filters.adult_enabled && rng.random_bool(self.policy.adult_bias) {
            let adult: Vec<&Prompt> = available.iter().copied().filter(|p| p.adult).collect();
            if !adult.is_empty() {
                available = adult;
            }
        }

        available.choose(rng).map(|prompt| Selection {
            prompt: *prompt,
            epoch_reset,
        })
    }

    /// Number of prompts in `pool` that pass `filters`, ignoring exposure
    pub fn eligible_count(pool: &[Prompt], filters: &SelectionFilters) -> usize {
        pool.iter().filter(|p| filters.allows(p)).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{GameMode, PromptSource};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn prompt(id: &str, content_type: ContentType, level: u8, adult: bool) -> Prompt {
        Prompt {
            id: id.to_string(),
            text: format!("Prompt {}", id),
            content_type,
            level: Level::new(level).unwrap(),
            adult,
            source: PromptSource::System,
        }
    }

    fn filters(max_level: u8, adult_enabled: bool, types: &[ContentType]) -> SelectionFilters {
        SelectionFilters {
            max_level: Level::new(max_level).unwrap(),
            adult_enabled,
            required_types: types.iter().copied().collect(),
        }
    }

    fn mixed_pool() -> Vec<Prompt> {
        let mut pool = Vec::new();
        for (i, content_type) in ContentType::ALL.iter().enumerate() {
            for level in 1..=3 {
                for adult in [false, true] {
                    pool.push(prompt(
                        &format!("{}-{}-{}", i, level, adult),
                        *content_type,
                        level,
                        adult,
                    ));
                }
            }
        }
        pool
    }

    #[test]
    fn test_never_returns_seen_prompt() {
        let pool = mixed_pool();
        let selector = ContentSelector::default();
        let filters = filters(3, true, &[]);
        let mut rng = StdRng::seed_from_u64(42);

        for trial in 0..200 {
            let mut exposure = Exposure::new();
            // Mark a random half as seen
            for p in pool.iter().filter(|_| rng.random_bool(0.5)) {
                exposure.mark_seen(&p.id);
            }
            if exposure.len() == pool.len() {
                continue;
            }
            let before = exposure.clone();
            let selection = selector
                .select(&pool, &mut exposure, &filters, &mut rng)
                .unwrap();
            assert!(!before.contains(&selection.prompt.id), "trial {}", trial);
            assert!(!selection.epoch_reset);
            assert_eq!(exposure, before, "selection must not mutate exposure");
        }
    }

    #[test]
    fn test_exhaustion_resets_exposure() {
        let pool: Vec<_> = (0..4)
            .map(|i| prompt(&format!("q{}", i), ContentType::Question, 1, false))
            .collect();
        let selector = ContentSelector::default();
        let filters = filters(1, false, &[ContentType::Question]);
        let mut rng = StdRng::seed_from_u64(1);

        let mut exposure = Exposure::new();
        for p in &pool {
            exposure.mark_seen(&p.id);
        }

        let selection = selector
            .select(&pool, &mut exposure, &filters, &mut rng)
            .unwrap();
        assert!(selection.epoch_reset);
        assert!(exposure.is_empty());
        assert_eq!(exposure.epoch(), 1);

        exposure.mark_seen(&selection.prompt.id);
        assert_eq!(exposure.len(), 1);
        assert!(exposure.contains(&selection.prompt.id));
    }

    #[test]
    fn test_exhaustion_only_counts_eligible_prompts() {
        // Seen everything eligible, but ineligible prompts remain unseen
        let pool = vec![
            prompt("a", ContentType::Question, 1, false),
            prompt("b", ContentType::Question, 3, false),
            prompt("c", ContentType::Dare, 1, false),
        ];
        let selector = ContentSelector::default();
        let filters = filters(1, false, &[ContentType::Question]);
        let mut rng = StdRng::seed_from_u64(3);
        let mut exposure = Exposure::new();
        exposure.mark_seen("a");

        let selection = selector
            .select(&pool, &mut exposure, &filters, &mut rng)
            .unwrap();
        assert_eq!(selection.prompt.id, "a");
        assert!(selection.epoch_reset);
    }

    #[test]
    fn test_empty_eligible_pool_returns_none() {
        let pool = vec![
            prompt("a", ContentType::Dare, 3, false),
            prompt("b", ContentType::Question, 1, true),
        ];
        let selector = ContentSelector::default();
        let mut rng = StdRng::seed_from_u64(5);
        let mut exposure = Exposure::new();
        exposure.mark_seen("a");

        let filters = filters(2, false, &[ContentType::Question, ContentType::Dare]);
        assert!(selector
            .select(&pool, &mut exposure, &filters, &mut rng)
            .is_none());
        // A failed selection leaves exposure untouched
        assert!(exposure.contains("a"));
        assert_eq!(exposure.epoch(), 0);

        assert!(selector
            .select(&[], &mut exposure, &filters, &mut rng)
            .is_none());
    }

    #[test]
    fn test_adult_content_excluded_when_disabled() {
        let pool = mixed_pool();
        let selector = ContentSelector::new(SelectorPolicy::new(1.0));
        let filters = filters(3, false, &[]);
        let mut rng = StdRng::seed_from_u64(8);
        let mut exposure = Exposure::new();

        for _ in 0..500 {
            let selection = selector
                .select(&pool, &mut exposure, &filters, &mut rng)
                .unwrap();
            assert!(!selection.prompt.adult);
            exposure.mark_seen(&selection.prompt.id);
        }
    }

    #[test]
    fn test_level_ceiling_enforced() {
        let pool = mixed_pool();
        let selector = ContentSelector::default();
        let mut rng = StdRng::seed_from_u64(13);

        for max_level in 1..=3 {
            let filters = filters(max_level, true, &[]);
            let mut exposure = Exposure::new();
            for _ in 0..300 {
                let selection = selector
                    .select(&pool, &mut exposure, &filters, &mut rng)
                    .unwrap();
                assert!(selection.prompt.level.get() <= max_level);
                exposure.mark_seen(&selection.prompt.id);
            }
        }
    }

    #[test]
    fn test_type_filter_enforced() {
        let pool = mixed_pool();
        let selector = ContentSelector::default();
        let settings = GameSettings {
            mode: GameMode::TruthOrDare,
            ..GameSettings::default()
        };
        let filters = SelectionFilters::from_settings(&settings);
        let mut rng = StdRng::seed_from_u64(21);
        let mut exposure = Exposure::new();

        for _ in 0..100 {
            let selection = selector
                .select(&pool, &mut exposure, &filters, &mut rng)
                .unwrap();
            assert!(matches!(
                selection.prompt.content_type,
                ContentType::Truth | ContentType::Dare
            ));
            exposure.mark_seen(&selection.prompt.id);
        }

        let dares = filters.narrowed_to(ContentType::Dare);
        let selection = selector
            .select(&pool, &mut exposure, &dares, &mut rng)
            .unwrap();
        assert_eq!(selection.prompt.content_type, ContentType::Dare);
    }

    #[test]
    fn test_adult_bias_prefers_adult_content() {
        // One adult prompt among many; with the default bias it should dominate
        let mut pool: Vec<_> = (0..20)
            .map(|i| prompt(&format!("clean{}", i), ContentType::Question, 1, false))
            .collect();
        pool.push(prompt("spicy", ContentType::Question, 1, true));

        let selector = ContentSelector::default();
        let filters = filters(3, true, &[]);
        let mut rng = StdRng::seed_from_u64(99);

        let trials = 2000;
        let adult_hits = (0..trials)
            .filter(|_| {
                let mut exposure = Exposure::new();
                selector
                    .select(&pool, &mut exposure, &filters, &mut rng)
                    .unwrap()
                    .prompt
                    .adult
            })
            .count();
        let ratio = adult_hits as f64 / trials as f64;
        assert!(ratio > 0.7 && ratio < 0.9, "adult ratio {}", ratio);
    }

    #[test]
    fn test_adult_bias_falls_back_when_no_adult_available() {
        let pool: Vec<_> = (0..3)
            .map(|i| prompt(&format!("q{}", i), ContentType::Question, 1, false))
            .collect();
        let selector = ContentSelector::new(SelectorPolicy::new(1.0));
        let filters = filters(3, true, &[]);
        let mut rng = StdRng::seed_from_u64(4);
        let mut exposure = Exposure::new();
        assert!(selector
            .select(&pool, &mut exposure, &filters, &mut rng)
            .is_some());
    }

    #[test]
    fn test_single_player_exhausts_pool_then_resets() {
        let pool: Vec<_> = (1..=5)
            .map(|i| prompt(&format!("q{}", i), ContentType::Question, 1, false))
            .collect();
        let selector = ContentSelector::default();
        let filters = filters(1, false, &[ContentType::Question]);
        let mut rng = StdRng::seed_from_u64(2024);
        let mut exposure = Exposure::new();

        let mut seen = HashSet::new();
        for _ in 0..5 {
            let selection = selector
                .select(&pool, &mut exposure, &filters, &mut rng)
                .unwrap();
            assert!(seen.insert(selection.prompt.id.clone()));
            exposure.mark_seen(&selection.prompt.id);
        }
        assert_eq!(seen.len(), 5);

        let sixth = selector
            .select(&pool, &mut exposure, &filters, &mut rng)
            .unwrap();
        assert!(sixth.epoch_reset);
        assert!(seen.contains(&sixth.prompt.id));
    }

    #[test]
    fn test_policy_clamps_bias() {
        assert_eq!(SelectorPolicy::new(2.0).adult_bias, 1.0);
        assert_eq!(SelectorPolicy::new(-1.0).adult_bias, 0.0);
        assert_eq!(SelectorPolicy::new(f64::NAN).adult_bias, DEFAULT_ADULT_BIAS);
    }

    #[test]
    fn test_eligible_count() {
        let pool = mixed_pool();
        assert_eq!(ContentSelector::eligible_count(&pool, &filters(3, true, &[])), 30);
        assert_eq!(ContentSelector::eligible_count(&pool, &filters(1, false, &[])), 5);
        assert_eq!(
            ContentSelector::eligible_count(&pool, &filters(2, false, &[ContentType::Dare])),
            2
        );
    }
}
