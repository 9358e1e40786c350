//! Canned messages served when no model produced a valid answer.

use std::path::Path;

use rand::seq::SliceRandom;
use serde::Deserialize;

use crate::error::LLMError;
use crate::theme::Theme;

const DEFAULT_POOLS: &str = include_str!("../data/fallbacks.json");

#[derive(Deserialize)]
struct PoolFile {
    wholesome: Vec<String>,
    dark: Vec<String>,
}

/// Read-only per-theme pools of pre-approved messages.
///
/// Both pools are guaranteed non-empty once constructed, so [`FallbackBank::pick`]
/// cannot fail.
#[derive(Debug, Clone)]
pub struct FallbackBank {
    wholesome: Vec<String>,
    dark: Vec<String>,
}

impl FallbackBank {
    /// Builds a bank from explicit pools.
    pub fn new(wholesome: Vec<String>, dark: Vec<String>) -> Result<Self, LLMError> {
        let wholesome = sanitize(wholesome);
        let dark = sanitize(dark);
        for (theme, pool) in [(Theme::Wholesome, &wholesome), (Theme::Dark, &dark)] {
            if pool.is_empty() {
                return Err(LLMError::ConfigError(format!(
                    "Fallback pool for theme '{theme}' is empty"
                )));
            }
        }
        Ok(Self { wholesome, dark })
    }

    /// The pools shipped with the crate.
    pub fn builtin() -> Result<Self, LLMError> {
        Self::from_json(DEFAULT_POOLS)
    }

    /// Parses pools from a JSON document with `wholesome` and `dark` arrays.
    pub fn from_json(json: &str) -> Result<Self, LLMError> {
        let file: PoolFile = serde_json::from_str(json)
            .map_err(|e| LLMError::ConfigError(format!("Invalid fallback pool file: {e}")))?;
        Self::new(file.wholesome, file.dark)
    }

    /// Loads pools from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LLMError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LLMError::ConfigError(format!("Cannot read fallback pools {}: {e}", path.display()))
        })?;
        log::debug!("Loaded fallback pools from {}", path.display());
        Self::from_json(&contents)
    }

    /// All messages for a theme.
    pub fn pool(&self, theme: Theme) -> &[String] {
        match theme {
            Theme::Wholesome => &self.wholesome,
            Theme::Dark => &self.dark,
        }
    }

    /// Picks one message for `theme` uniformly at random.
    pub fn pick(&self, theme: Theme) -> &str {
        let pool = self.pool(theme);
        pool.choose(&mut rand::thread_rng())
            .map(String::as_str)
            // Non-empty pools are checked at construction.
            .unwrap_or_default()
    }
}

fn sanitize(pool: Vec<String>) -> Vec<String> {
    pool.into_iter()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::{word_count, MAX_WORDS};
    use std::collections::HashSet;
    use std::io::Write;

    #[test]
    fn builtin_pools_load_and_respect_word_limit() {
        let bank = FallbackBank::builtin().unwrap();
        for theme in Theme::ALL {
            let pool = bank.pool(theme);
            assert!(pool.len() >= 50, "{theme} pool too small");
            for msg in pool {
                assert!(word_count(msg) < MAX_WORDS, "too long: {msg}");
            }
        }
    }

    #[test]
    fn pick_stays_within_theme_pool() {
        let bank = FallbackBank::builtin().unwrap();
        for theme in Theme::ALL {
            for _ in 0..200 {
                let msg = bank.pick(theme);
                assert!(bank.pool(theme).iter().any(|m| m == msg));
            }
        }
    }

    #[test]
    fn pick_is_not_degenerate() {
        let bank = FallbackBank::builtin().unwrap();
        let seen: HashSet<&str> = (0..200).map(|_| bank.pick(Theme::Dark)).collect();
        assert!(seen.len() > 1);
    }

    #[test]
    fn empty_pool_is_rejected_at_load() {
        let err = FallbackBank::new(vec!["hi".into()], vec!["  ".into()]).unwrap_err();
        assert!(matches!(err, LLMError::ConfigError(_)));
        assert!(err.to_string().contains("dark"));

        let err = FallbackBank::from_json(r#"{"wholesome": [], "dark": ["x"]}"#).unwrap_err();
        assert!(err.to_string().contains("wholesome"));
    }

    #[test]
    fn missing_key_is_a_config_error() {
        let err = FallbackBank::from_json(r#"{"wholesome": ["a"]}"#).unwrap_err();
        assert!(matches!(err, LLMError::ConfigError(_)));
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"wholesome": ["only kind"], "dark": ["only grim"]}}"#).unwrap();
        let bank = FallbackBank::from_path(file.path()).unwrap();
        assert_eq!(bank.pick(Theme::Wholesome), "only kind");
        assert_eq!(bank.pick(Theme::Dark), "only grim");
    }
}
