//! Environment-driven configuration
//!
//! Every value is optional. Blank values are ignored and unparseable values
//! are logged and replaced by the default.

use crate::rotation::RotationPolicy;
use crate::selector::{SelectorPolicy, DEFAULT_ADULT_BIAS};
use std::path::PathBuf;
use std::time::Duration;

/// Read a trimmed, non-empty environment variable
pub(crate) fn env_value(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|value| {
        let trimmed = value.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_string())
    })
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env_value(key) {
        Some(raw) => match raw.parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!("Invalid {} '{}', using default", key, raw);
                default
            }
        },
        None => default,
    }
}

fn env_flag(key: &str, default: bool) -> bool {
    env_value(key)
        .map(|v| v != "0" && v.to_lowercase() != "false")
        .unwrap_or(default)
}

/// HTTP server settings
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Rooms without activity for this long are removed
    pub room_ttl: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 6580,
            room_ttl: Duration::from_secs(120 * 60),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let port = match env_parse("PORT", defaults.port) {
            0 => {
                tracing::warn!("PORT must be > 0, using default");
                defaults.port
            }
            port => port,
        };
        let ttl_minutes = env_parse("ROOM_TTL_MINUTES", defaults.room_ttl.as_secs() / 60);

        Self {
            port,
            room_ttl: Duration::from_secs(ttl_minutes.max(1) * 60),
        }
    }
}

/// Rotation and selection policy knobs
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct GameTuning {
    pub rotation: RotationPolicy,
    pub selector: SelectorPolicy,
}

impl GameTuning {
    pub fn from_env() -> Self {
        Self {
            rotation: RotationPolicy {
                avoid_repeat: env_flag("AVOID_IMMEDIATE_REPEAT", true),
            },
            selector: SelectorPolicy::new(env_parse("ADULT_BIAS", DEFAULT_ADULT_BIAS)),
        }
    }
}

/// Where the system prompt pool comes from
#[derive(Debug, Clone, PartialEq)]
pub enum ContentSource {
    Http { base_url: String, timeout: Duration },
    File(PathBuf),
    /// Admin-curated pool seeded with the built-in prompts
    Memory,
}

#[derive(Debug, Clone)]
pub struct ContentConfig {
    pub source: ContentSource,
}

impl ContentConfig {
    /// `CONTENT_STORE_URL` wins over `CONTENT_FILE`; with neither set the
    /// in-memory store is used.
    pub fn from_env() -> Self {
        let timeout = Duration::from_secs(env_parse("CONTENT_TIMEOUT_SECS", 5u64));

        let source = if let Some(base_url) = env_value("CONTENT_STORE_URL") {
            ContentSource::Http { base_url, timeout }
        } else if let Some(path) = env_value("CONTENT_FILE") {
            ContentSource::File(PathBuf::from(path))
        } else {
            ContentSource::Memory
        };

        Self { source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "PORT",
        "ROOM_TTL_MINUTES",
        "AVOID_IMMEDIATE_REPEAT",
        "ADULT_BIAS",
        "CONTENT_STORE_URL",
        "CONTENT_FILE",
        "CONTENT_TIMEOUT_SECS",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        clear_env();
        let server = ServerConfig::from_env();
        assert_eq!(server.port, 6580);
        assert_eq!(server.room_ttl, Duration::from_secs(7200));

        let tuning = GameTuning::from_env();
        assert!(tuning.rotation.avoid_repeat);
        assert_eq!(tuning.selector.adult_bias, DEFAULT_ADULT_BIAS);

        assert_eq!(ContentConfig::from_env().source, ContentSource::Memory);
    }

    #[test]
    #[serial]
    fn test_values_from_env() {
        clear_env();
        std::env::set_var("PORT", "7000");
        std::env::set_var("ROOM_TTL_MINUTES", "15");
        std::env::set_var("AVOID_IMMEDIATE_REPEAT", "false");
        std::env::set_var("ADULT_BIAS", "0.5");
        std::env::set_var("CONTENT_FILE", "/tmp/prompts.json");

        let server = ServerConfig::from_env();
        assert_eq!(server.port, 7000);
        assert_eq!(server.room_ttl, Duration::from_secs(15 * 60));

        let tuning = GameTuning::from_env();
        assert!(!tuning.rotation.avoid_repeat);
        assert_eq!(tuning.selector.adult_bias, 0.5);

        assert_eq!(
            ContentConfig::from_env().source,
            ContentSource::File(PathBuf::from("/tmp/prompts.json"))
        );

        std::env::set_var("CONTENT_STORE_URL", " http://content.local ");
        assert_eq!(
            ContentConfig::from_env().source,
            ContentSource::Http {
                base_url: "http://content.local".to_string(),
                timeout: Duration::from_secs(5),
            }
        );
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_values_fall_back() {
        clear_env();
        std::env::set_var("PORT", "0");
        std::env::set_var("ADULT_BIAS", "lots");
        std::env::set_var("ROOM_TTL_MINUTES", "   ");

        assert_eq!(ServerConfig::from_env().port, 6580);
        assert_eq!(ServerConfig::from_env().room_ttl, Duration::from_secs(7200));
        assert_eq!(GameTuning::from_env().selector.adult_bias, DEFAULT_ADULT_BIAS);

        std::env::set_var("ADULT_BIAS", "3.5");
        assert_eq!(GameTuning::from_env().selector.adult_bias, 1.0);
        clear_env();
    }
}
