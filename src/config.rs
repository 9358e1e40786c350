//! Process-wide settings read once at startup.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::builder::LLMBackend;
use crate::error::LLMError;
use crate::ladder::ModelLadder;
use crate::resilient::RetryPolicy;

pub const ENV_BACKEND: &str = "MOODLINE_BACKEND";
pub const ENV_API_KEY: &str = "MOODLINE_API_KEY";
pub const ENV_BASE_URL: &str = "MOODLINE_BASE_URL";
pub const ENV_MODELS: &str = "MOODLINE_MODELS";
pub const ENV_MAX_ATTEMPTS: &str = "MOODLINE_MAX_ATTEMPTS";
pub const ENV_MAX_PASSES: &str = "MOODLINE_MAX_PASSES";
pub const ENV_PASS_DELAY_MS: &str = "MOODLINE_PASS_DELAY_MS";
pub const ENV_DEADLINE_MS: &str = "MOODLINE_DEADLINE_MS";
pub const ENV_TIMEOUT_SECS: &str = "MOODLINE_TIMEOUT_SECS";
pub const ENV_FALLBACKS: &str = "MOODLINE_FALLBACKS";

/// Default per-request HTTP timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Immutable configuration for building an orchestrator.
#[derive(Debug, Clone)]
pub struct Settings {
    pub backend: LLMBackend,
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    /// `None` means the backend's default ladder
    pub models: Option<ModelLadder>,
    pub policy: RetryPolicy,
    pub timeout_seconds: u64,
    pub fallbacks_path: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend: LLMBackend::OpenRouter,
            api_key: None,
            base_url: None,
            models: None,
            policy: RetryPolicy::defaults(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            fallbacks_path: None,
        }
    }
}

impl Settings {
    /// Reads settings from the process environment.
    pub fn from_env() -> Result<Self, LLMError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`, which maps a variable name to its value.
    ///
    /// Unset or blank variables keep their defaults; malformed values are a
    /// [`LLMError::ConfigError`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, LLMError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut settings = Settings::default();

        if let Some(backend) = get(ENV_BACKEND) {
            settings.backend = LLMBackend::from_str(&backend)
                .map_err(|e| LLMError::ConfigError(format!("{ENV_BACKEND}: {e}")))?;
        }

        settings.api_key = get(ENV_API_KEY).or_else(|| get(settings.backend.api_key_env()));
        settings.base_url = get(ENV_BASE_URL);

        if let Some(models) = get(ENV_MODELS) {
            settings.models = Some(ModelLadder::from_str(&models)?);
        }
        if let Some(n) = parse_num::<usize>(&get, ENV_MAX_ATTEMPTS)? {
            settings.policy.max_attempts_per_model = n;
        }
        if let Some(n) = parse_num::<usize>(&get, ENV_MAX_PASSES)? {
            settings.policy.max_passes = n;
        }
        if let Some(ms) = parse_num::<u64>(&get, ENV_PASS_DELAY_MS)? {
            settings.policy.pass_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = parse_num::<u64>(&get, ENV_DEADLINE_MS)? {
            settings.policy.deadline = Some(Duration::from_millis(ms));
        }
        if let Some(secs) = parse_num::<u64>(&get, ENV_TIMEOUT_SECS)? {
            settings.timeout_seconds = secs;
        }
        settings.fallbacks_path = get(ENV_FALLBACKS).map(PathBuf::from);

        settings.policy = settings.policy.normalized();
        Ok(settings)
    }
}

fn parse_num<N>(get: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<N>, LLMError>
where
    N: FromStr,
    N::Err: std::fmt::Display,
{
    get(key)
        .map(|raw| {
            raw.trim()
                .parse::<N>()
                .map_err(|e| LLMError::ConfigError(format!("{key}={raw}: {e}")))
        })
        .transpose()
}
