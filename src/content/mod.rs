//! Content ingestion and content stores
//!
//! Prompts arrive from several places (the content store, the built-in
//! fallback list, player-written custom prompts) in loosely-typed shapes.
//! Everything is validated into a [`Prompt`] here before it reaches a pool.

mod fallback;
mod file;
mod http;
mod memory;

use crate::types::{ContentType, GameSettings, Level, Prompt, PromptSource};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};

pub use fallback::fallback_prompts;
pub use file::FileContentStore;
pub use http::HttpContentStore;
pub use memory::MemoryContentStore;

/// Longest prompt text accepted from any source
pub const MAX_PROMPT_CHARS: usize = 500;

/// Result type for content operations
pub type ContentResult<T> = Result<T, ContentError>;

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("Prompt text is missing or blank")]
    MissingText,

    #[error("Prompt text exceeds {max} characters")]
    TextTooLong { max: usize },

    #[error("Prompt type is missing")]
    MissingType,

    #[error("Unknown content type: {0}")]
    UnknownType(String),

    #[error("Invalid level: {0}")]
    InvalidLevel(String),

    #[error("Invalid adult flag: {0}")]
    InvalidAdultFlag(String),

    #[error("Prompt id is missing")]
    MissingId,

    #[error("Malformed prompt record: {0}")]
    Malformed(String),

    #[error("Content store request failed: {0}")]
    Transport(String),

    #[error("Content file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Content parsing failed: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A prompt as it arrives from the outside world, before validation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPrompt {
    /// Stores use either string or numeric ids
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default, alias = "type", alias = "kind")]
    pub content_type: Option<String>,
    /// Number or numeric string
    #[serde(default)]
    pub level: Option<Value>,
    /// Bool, 0/1 or a "true"/"false" string
    #[serde(default, alias = "is_adult", alias = "isAdult", alias = "nsfw")]
    pub adult: Option<Value>,
    /// Set when the record could not be decoded at all
    #[serde(skip)]
    pub malformed: Option<String>,
}

impl From<&Prompt> for RawPrompt {
    fn from(prompt: &Prompt) -> Self {
        Self {
            id: Some(Value::String(prompt.id.clone())),
            text: Some(prompt.text.clone()),
            content_type: Some(prompt.content_type.as_str().to_string()),
            level: Some(Value::from(prompt.level.get())),
            adult: Some(Value::Bool(prompt.adult)),
            malformed: None,
        }
    }
}

/// Decode store records one at a time so a bad record is rejected on its
/// own instead of failing the whole batch.
pub fn decode_rows(rows: Vec<Value>) -> Vec<RawPrompt> {
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row).unwrap_or_else(|e| RawPrompt {
                malformed: Some(e.to_string()),
                ..RawPrompt::default()
            })
        })
        .collect()
}

fn parse_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_level(value: &Value) -> ContentResult<Level> {
    let number = match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    number
        .and_then(|n| u8::try_from(n).ok())
        .and_then(Level::new)
        .ok_or_else(|| ContentError::InvalidLevel(value.to_string()))
}

fn parse_adult(value: &Value) -> ContentResult<bool> {
    match value {
        Value::Bool(b) => Ok(*b),
        Value::Number(n) if n.as_u64() == Some(0) => Ok(false),
        Value::Number(n) if n.as_u64() == Some(1) => Ok(true),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(true),
            "false" | "0" | "no" | "" => Ok(false),
            _ => Err(ContentError::InvalidAdultFlag(s.clone())),
        },
        Value::Null => Ok(false),
        other => Err(ContentError::InvalidAdultFlag(other.to_string())),
    }
}

impl RawPrompt {
    /// Validate into a pool-ready prompt.
    ///
    /// Missing level defaults to 1 and missing adult flag to false. Custom
    /// prompts without an id get a generated `custom-` id; other sources must
    /// carry their own.
    pub fn validate(&self, source: PromptSource) -> ContentResult<Prompt> {
        if let Some(reason) = &self.malformed {
            return Err(ContentError::Malformed(reason.clone()));
        }

        let text = self
            .text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(ContentError::MissingText)?;
        if text.chars().count() > MAX_PROMPT_CHARS {
            return Err(ContentError::TextTooLong {
                max: MAX_PROMPT_CHARS,
            });
        }

        let raw_type = self.content_type.as_deref().ok_or(ContentError::MissingType)?;
        let content_type = ContentType::parse_loose(raw_type)
            .ok_or_else(|| ContentError::UnknownType(raw_type.to_string()))?;

        let level = match &self.level {
            Some(value) => parse_level(value)?,
            None => Level::MIN,
        };
        let adult = match &self.adult {
            Some(value) => parse_adult(value)?,
            None => false,
        };

        let id = match (self.id.as_ref().and_then(parse_id), source) {
            (Some(id), PromptSource::Custom) if !id.starts_with("custom-") => {
                format!("custom-{}", id)
            }
            (Some(id), _) => id,
            (None, PromptSource::Custom) => format!("custom-{}", ulid::Ulid::new()),
            (None, _) => return Err(ContentError::MissingId),
        };

        Ok(Prompt {
            id,
            text: text.to_string(),
            content_type,
            level,
            adult,
            source,
        })
    }
}

/// Validate a batch of raw prompts, dropping malformed entries and duplicate ids
pub fn ingest(raws: &[RawPrompt], source: PromptSource) -> Vec<Prompt> {
    let mut seen_ids = HashSet::new();
    let mut prompts = Vec::with_capacity(raws.len());

    for raw in raws {
        match raw.validate(source) {
            Ok(prompt) => {
                if seen_ids.insert(prompt.id.clone()) {
                    prompts.push(prompt);
                } else {
                    tracing::warn!("Dropping duplicate prompt id {}", prompt.id);
                }
            }
            Err(e) => {
                tracing::warn!("Rejected {:?} prompt {:?}: {}", source, raw.id, e);
            }
        }
    }

    prompts
}

/// What a pool load asks the content store for
#[derive(Debug, Clone, PartialEq)]
pub struct ContentQuery {
    /// Empty means any type
    pub types: BTreeSet<ContentType>,
    pub max_level: Level,
    pub include_adult: bool,
}

impl ContentQuery {
    pub fn from_settings(settings: &GameSettings) -> Self {
        Self {
            types: settings.mode.content_types(),
            max_level: settings.max_level,
            include_adult: settings.adult_enabled,
        }
    }

    /// Whether a pool loaded with `self` holds everything `other` can select
    pub fn covers(&self, other: &ContentQuery) -> bool {
        let types_covered = self.types.is_empty()
            || (!other.types.is_empty() && other.types.is_subset(&self.types));
        types_covered
            && other.max_level <= self.max_level
            && (self.include_adult || !other.include_adult)
    }

    pub fn matches(&self, prompt: &Prompt) -> bool {
        (self.types.is_empty() || self.types.contains(&prompt.content_type))
            && prompt.level <= self.max_level
            && (self.include_adult || !prompt.adult)
    }
}

/// Source of the system prompt pool
#[async_trait]
pub trait ContentStore: Send + Sync {
    /// Fetch prompts for a query. Stores may return extra entries; the pool
    /// loader filters after validation.
    async fn fetch(&self, query: &ContentQuery) -> ContentResult<Vec<RawPrompt>>;

    /// Number of valid prompts matching a query
    async fn count(&self, query: &ContentQuery) -> ContentResult<usize> {
        let raws = self.fetch(query).await?;
        Ok(ingest(&raws, PromptSource::System)
            .iter()
            .filter(|p| query.matches(p))
            .count())
    }

    /// Name of this store for logging
    fn name(&self) -> &str;
}

/// A session pool ready to hand to the selector
#[derive(Debug, Clone)]
pub struct PoolLoad {
    pub prompts: Vec<Prompt>,
    /// True when the store failed and the built-in list was used instead
    pub used_fallback: bool,
    /// Entries dropped during validation or as duplicates
    pub rejected: usize,
}

/// Assemble a session pool: store prompts (or the fallback list when the
/// store is unreachable) plus the session's custom prompts.
pub async fn load_pool(
    store: &dyn ContentStore,
    query: &ContentQuery,
    custom: &[Prompt],
) -> PoolLoad {
    let (mut prompts, used_fallback, rejected) = match store.fetch(query).await {
        Ok(raws) => {
            let prompts = ingest(&raws, PromptSource::System);
            let rejected = raws.len() - prompts.len();
            (prompts, false, rejected)
        }
        Err(e) => {
            tracing::warn!(
                "Content store {} unavailable ({}), using built-in prompts",
                store.name(),
                e
            );
            (fallback_prompts(), true, 0)
        }
    };

    prompts.retain(|p| query.matches(p));

    let mut ids: HashSet<_> = prompts.iter().map(|p| p.id.clone()).collect();
    let mut custom_added = 0;
    for prompt in custom {
        if ids.insert(prompt.id.clone()) {
            prompts.push(prompt.clone());
            custom_added += 1;
        }
    }

    tracing::info!(
        "Loaded pool of {} prompts from {} ({} custom, {} rejected, fallback={})",
        prompts.len(),
        store.name(),
        custom_added,
        rejected,
        used_fallback
    );

    PoolLoad {
        prompts,
        used_fallback,
        rejected,
    }
}
