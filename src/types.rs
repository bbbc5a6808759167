use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Opaque ID types for type safety
pub type PromptId = String;
pub type RoomCode = String;
pub type PlayerName = String;

/// Index of a player in the session roster
pub type PlayerIndex = usize;

/// Closed set of prompt kinds
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Question,
    Truth,
    Dare,
    ChaosRule,
    Vote,
}

impl ContentType {
    pub const ALL: [ContentType; 5] = [
        ContentType::Question,
        ContentType::Truth,
        ContentType::Dare,
        ContentType::ChaosRule,
        ContentType::Vote,
    ];

    /// Parse a content type, accepting the legacy spellings older content uses
    pub fn parse_loose(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase().replace('-', "_");
        match normalized.as_str() {
            "question" | "generic" | "generic_question" => Some(Self::Question),
            "truth" => Some(Self::Truth),
            "dare" => Some(Self::Dare),
            "chaos_rule" | "chaos" | "rule" => Some(Self::ChaosRule),
            "vote" | "vote_prompt" => Some(Self::Vote),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Question => "question",
            Self::Truth => "truth",
            Self::Dare => "dare",
            Self::ChaosRule => "chaos_rule",
            Self::Vote => "vote",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intensity level, 1 (mild) to 3 (spicy)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(try_from = "u8", into = "u8")]
pub struct Level(u8);

impl Level {
    pub const MIN: Level = Level(1);
    pub const MAX: Level = Level(3);

    pub fn new(value: u8) -> Option<Self> {
        (1..=3).contains(&value).then_some(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Level {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Level::new(value).ok_or_else(|| format!("level must be between 1 and 3, got {}", value))
    }
}

impl From<Level> for u8 {
    fn from(level: Level) -> Self {
        level.0
    }
}

impl Default for Level {
    fn default() -> Self {
        Level::MAX
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PromptSource {
    /// Loaded from the content store
    System,
    /// Built-in list used when the content store is unreachable
    Fallback,
    /// Written by players for this session
    Custom,
}

/// A single validated content item. Immutable once it enters a pool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Prompt {
    pub id: PromptId,
    pub text: String,
    pub content_type: ContentType,
    pub level: Level,
    pub adult: bool,
    pub source: PromptSource,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    Classic,
    TruthOrDare,
    Chaos,
    Vote,
    #[default]
    Mixed,
}

impl GameMode {
    /// Content types this mode draws from
    pub fn content_types(&self) -> BTreeSet<ContentType> {
        match self {
            GameMode::Classic => [ContentType::Question].into(),
            GameMode::TruthOrDare => [ContentType::Truth, ContentType::Dare].into(),
            GameMode::Chaos => [ContentType::ChaosRule].into(),
            GameMode::Vote => [ContentType::Vote].into(),
            GameMode::Mixed => ContentType::ALL.into(),
        }
    }
}

/// Per-room eligibility settings chosen in the lobby
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GameSettings {
    #[serde(default)]
    pub mode: GameMode,
    #[serde(default)]
    pub max_level: Level,
    #[serde(default)]
    pub adult_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlayerStats {
    pub name: PlayerName,
    pub turns: u32,
    pub drinks: u32,
    /// Prompts seen in the current exposure epoch
    pub seen: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionStats {
    pub round_no: u32,
    pub turns_played: u32,
    pub cycle: u32,
    pub players: Vec<PlayerStats>,
}

/// How a player finished their turn
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TurnOutcome {
    Done,
    Drink { sips: u32 },
    /// Refused the prompt; costs one sip
    Skip,
}

impl TurnOutcome {
    pub fn sips(&self) -> u32 {
        match self {
            TurnOutcome::Done => 0,
            TurnOutcome::Drink { sips } => *sips,
            TurnOutcome::Skip => 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Host,
    Viewer,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_bounds() {
        assert!(Level::new(0).is_none());
        assert_eq!(Level::new(1), Some(Level::MIN));
        assert_eq!(Level::new(3), Some(Level::MAX));
        assert!(Level::new(4).is_none());
    }

    #[test]
    fn test_level_deserialize_rejects_out_of_range() {
        assert!(serde_json::from_str::<Level>("2").is_ok());
        assert!(serde_json::from_str::<Level>("7").is_err());
    }

    #[test]
    fn test_content_type_aliases() {
        assert_eq!(ContentType::parse_loose("Chaos-Rule"), Some(ContentType::ChaosRule));
        assert_eq!(ContentType::parse_loose("generic"), Some(ContentType::Question));
        assert_eq!(ContentType::parse_loose("VOTE_PROMPT"), Some(ContentType::Vote));
        assert_eq!(ContentType::parse_loose("riddle"), None);
    }

    #[test]
    fn test_mode_content_types() {
        let tod = GameMode::TruthOrDare.content_types();
        assert_eq!(tod.len(), 2);
        assert!(tod.contains(&ContentType::Truth));
        assert!(tod.contains(&ContentType::Dare));
        assert_eq!(GameMode::Mixed.content_types().len(), 5);
    }

    #[test]
    fn test_settings_defaults() {
        let settings: GameSettings = serde_json::from_str("{}").unwrap();
        assert_eq!(settings.mode, GameMode::Mixed);
        assert_eq!(settings.max_level, Level::MAX);
        assert!(!settings.adult_enabled);
    }

    #[test]
    fn test_turn_outcome_sips() {
        assert_eq!(TurnOutcome::Done.sips(), 0);
        assert_eq!(TurnOutcome::Skip.sips(), 1);
        assert_eq!(TurnOutcome::Drink { sips: 3 }.sips(), 3);
    }
}
