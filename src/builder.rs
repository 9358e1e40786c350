//! Builder module for configuring and instantiating an [`Orchestrator`].
//!
//! The builder wires a provider backend (or any custom [`CompletionProvider`]),
//! a model ladder, a retry policy, prompts and fallback pools together.

use std::path::PathBuf;
use std::time::Duration;

use crate::{
    completion::CompletionProvider,
    config::Settings,
    error::LLMError,
    fallback::FallbackBank,
    ladder::ModelLadder,
    orchestrator::Orchestrator,
    prompt::{PromptBuilder, ThemePrompts},
    resilient::RetryPolicy,
};

/// Supported LLM backend providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LLMBackend {
    /// OpenRouter gateway (many hosted models, free tiers)
    OpenRouter,
    /// Groq API provider
    Groq,
}

impl LLMBackend {
    /// Provider-specific environment variable holding the API key.
    pub fn api_key_env(&self) -> &'static str {
        match self {
            LLMBackend::OpenRouter => "OPENROUTER_API_KEY",
            LLMBackend::Groq => "GROQ_API_KEY",
        }
    }

    /// Ladder used when none is configured.
    pub fn default_ladder(&self) -> Result<ModelLadder, LLMError> {
        match self {
            LLMBackend::OpenRouter => {
                #[cfg(not(feature = "openrouter"))]
                return Err(LLMError::InvalidRequest(
                    "OpenRouter feature not enabled".to_string(),
                ));

                #[cfg(feature = "openrouter")]
                {
                    use crate::providers::openai_compatible::OpenAICompatibleConfig;
                    ModelLadder::new(
                        crate::backends::openrouter::OpenRouterConfig::DEFAULT_LADDER
                            .iter()
                            .copied(),
                    )
                }
            }
            LLMBackend::Groq => {
                #[cfg(not(feature = "groq"))]
                return Err(LLMError::InvalidRequest(
                    "Groq feature not enabled".to_string(),
                ));

                #[cfg(feature = "groq")]
                {
                    use crate::providers::openai_compatible::OpenAICompatibleConfig;
                    ModelLadder::new(
                        crate::backends::groq::GroqConfig::DEFAULT_LADDER
                            .iter()
                            .copied(),
                    )
                }
            }
        }
    }
}

/// Implements string parsing for LLMBackend enum.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use moodline::builder::LLMBackend;
///
/// let backend = LLMBackend::from_str("openrouter").unwrap();
/// assert!(matches!(backend, LLMBackend::OpenRouter));
///
/// let err = LLMBackend::from_str("invalid").unwrap_err();
/// assert!(err.to_string().contains("Unknown LLM backend"));
/// ```
impl std::str::FromStr for LLMBackend {
    type Err = LLMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openrouter" => Ok(LLMBackend::OpenRouter),
            "groq" => Ok(LLMBackend::Groq),
            _ => Err(LLMError::InvalidRequest(format!(
                "Unknown LLM backend: {}",
                s
            ))),
        }
    }
}

/// Builder for configuring and instantiating an [`Orchestrator`].
///
/// Provides a fluent interface; anything left unset falls back to the
/// backend's defaults, [`RetryPolicy::defaults`], [`ThemePrompts`] and the
/// built-in fallback pools.
#[derive(Default)]
pub struct MoodlineBuilder {
    /// Selected backend provider
    backend: Option<LLMBackend>,
    /// Custom provider, takes precedence over `backend`
    provider: Option<Box<dyn CompletionProvider>>,
    /// API key for authentication with the provider
    api_key: Option<String>,
    /// Base URL for API requests
    base_url: Option<String>,
    /// Request timeout duration in seconds
    timeout_seconds: Option<u64>,
    /// Ordered model identifiers
    models: Option<ModelLadder>,
    /// Retry policy, defaults applied at build time
    policy: Option<RetryPolicy>,
    /// Sampling temperature
    temperature: Option<f32>,
    /// Prompt source
    prompts: Option<Box<dyn PromptBuilder>>,
    /// Canned messages
    fallbacks: Option<FallbackBank>,
    /// File to load canned messages from
    fallbacks_path: Option<PathBuf>,
}

impl MoodlineBuilder {
    /// Creates a new empty builder instance with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a builder from settings read at startup.
    pub fn from_settings(settings: &Settings) -> Self {
        let mut builder = Self::new()
            .backend(settings.backend.clone())
            .policy(settings.policy.clone())
            .timeout_seconds(settings.timeout_seconds);
        builder.api_key = settings.api_key.clone();
        builder.base_url = settings.base_url.clone();
        builder.models = settings.models.clone();
        builder.fallbacks_path = settings.fallbacks_path.clone();
        builder
    }

    /// Sets the backend provider to use.
    pub fn backend(mut self, backend: LLMBackend) -> Self {
        self.backend = Some(backend);
        self
    }

    /// Uses a custom completion provider instead of a built-in backend.
    pub fn provider(mut self, provider: impl CompletionProvider + 'static) -> Self {
        self.provider = Some(Box::new(provider));
        self
    }

    /// Sets the API key for authentication.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the base URL for API requests.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Sets the request timeout in seconds.
    pub fn timeout_seconds(mut self, timeout_seconds: u64) -> Self {
        self.timeout_seconds = Some(timeout_seconds);
        self
    }

    /// Sets the model ladder.
    pub fn ladder(mut self, ladder: ModelLadder) -> Self {
        self.models = Some(ladder);
        self
    }

    /// Sets the model ladder from identifiers, tried in order.
    pub fn models<I, S>(mut self, models: I) -> Result<Self, LLMError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.models = Some(ModelLadder::new(models)?);
        Ok(self)
    }

    /// Replaces the whole retry policy.
    pub fn policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    fn policy_mut(&mut self) -> &mut RetryPolicy {
        self.policy.get_or_insert_with(RetryPolicy::defaults)
    }

    /// Sets the maximum attempts against one model within a pass.
    pub fn max_attempts_per_model(mut self, attempts: usize) -> Self {
        self.policy_mut().max_attempts_per_model = attempts;
        self
    }

    /// Sets the number of full passes over the ladder.
    pub fn max_passes(mut self, passes: usize) -> Self {
        self.policy_mut().max_passes = passes;
        self
    }

    /// Sets the pause between passes.
    pub fn pass_delay(mut self, delay: Duration) -> Self {
        self.policy_mut().pass_delay = delay;
        self
    }

    /// Sets an overall deadline after which the canned fallback is served.
    pub fn deadline(mut self, deadline: Duration) -> Self {
        self.policy_mut().deadline = Some(deadline);
        self
    }

    /// Sets the temperature parameter for controlling response randomness.
    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Sets the prompt source.
    pub fn prompts(mut self, prompts: impl PromptBuilder + 'static) -> Self {
        self.prompts = Some(Box::new(prompts));
        self
    }

    /// Sets the canned fallback pools.
    pub fn fallbacks(mut self, bank: FallbackBank) -> Self {
        self.fallbacks = Some(bank);
        self
    }

    /// Loads the canned fallback pools from a JSON file at build time.
    pub fn fallbacks_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.fallbacks_path = Some(path.into());
        self
    }

    /// Builds the orchestrator.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Neither a custom provider nor a backend is specified
    /// - Required backend feature is not enabled
    /// - The API key is missing for a built-in backend
    /// - No ladder is configured and the provider has no default one
    /// - Fallback pools cannot be loaded or are empty
    pub fn build(self) -> Result<Orchestrator, LLMError> {
        let fallbacks = match (self.fallbacks, &self.fallbacks_path) {
            (Some(bank), _) => bank,
            (None, Some(path)) => FallbackBank::from_path(path)?,
            (None, None) => FallbackBank::builtin()?,
        };

        let (provider, ladder) = match self.provider {
            Some(provider) => {
                let ladder = match (self.models, &self.backend) {
                    (Some(ladder), _) => ladder,
                    (None, Some(backend)) => backend.default_ladder()?,
                    (None, None) => {
                        return Err(LLMError::ConfigError(
                            "A model ladder is required with a custom provider".to_string(),
                        ))
                    }
                };
                (provider, ladder)
            }
            None => {
                let backend = self
                    .backend
                    .ok_or_else(|| LLMError::InvalidRequest("No backend specified".to_string()))?;
                let ladder = match self.models {
                    Some(ladder) => ladder,
                    None => backend.default_ladder()?,
                };
                let provider = build_backend(
                    &backend,
                    self.api_key,
                    self.base_url,
                    self.timeout_seconds,
                )?;
                (provider, ladder)
            }
        };

        let policy = self.policy.unwrap_or_default();
        let prompts = self
            .prompts
            .unwrap_or_else(|| Box::new(ThemePrompts) as Box<dyn PromptBuilder>);

        log::debug!(
            "Building orchestrator: ladder [{}], {} attempts/model, {} passes",
            ladder,
            policy.max_attempts_per_model,
            policy.max_passes
        );

        let orchestrator = Orchestrator::new(provider, ladder, policy, prompts, fallbacks);
        Ok(match self.temperature {
            Some(t) => orchestrator.with_temperature(t),
            None => orchestrator,
        })
    }
}

#[allow(unused_variables)]
fn build_backend(
    backend: &LLMBackend,
    api_key: Option<String>,
    base_url: Option<String>,
    timeout_seconds: Option<u64>,
) -> Result<Box<dyn CompletionProvider>, LLMError> {
    match backend {
        LLMBackend::OpenRouter => {
            #[cfg(not(feature = "openrouter"))]
            return Err(LLMError::InvalidRequest(
                "OpenRouter feature not enabled".to_string(),
            ));

            #[cfg(feature = "openrouter")]
            {
                let key = api_key.ok_or_else(|| {
                    LLMError::AuthError("No API key provided for OpenRouter".to_string())
                })?;
                Ok(Box::new(crate::backends::openrouter::OpenRouter::with_config(
                    key,
                    base_url,
                    timeout_seconds,
                )?))
            }
        }
        LLMBackend::Groq => {
            #[cfg(not(feature = "groq"))]
            return Err(LLMError::InvalidRequest(
                "Groq feature not enabled".to_string(),
            ));

            #[cfg(feature = "groq")]
            {
                let key = api_key.ok_or_else(|| {
                    LLMError::AuthError("No API key provided for Groq".to_string())
                })?;
                Ok(Box::new(crate::backends::groq::Groq::with_config(
                    key,
                    base_url,
                    timeout_seconds,
                )?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::completion::{CompletionRequest, RawCompletion};
    use async_trait::async_trait;

    struct Silent;

    #[async_trait]
    impl CompletionProvider for Silent {
        async fn complete(&self, _req: &CompletionRequest) -> Result<RawCompletion, LLMError> {
            Err(LLMError::EmptyResponse)
        }
    }

    #[test]
    fn custom_provider_requires_a_ladder() {
        let err = MoodlineBuilder::new().provider(Silent).build().err().unwrap();
        assert!(matches!(err, LLMError::ConfigError(_)));
    }

    #[test]
    fn custom_provider_with_ladder_builds() {
        let orchestrator = MoodlineBuilder::new()
            .provider(Silent)
            .models(["a", "b"])
            .unwrap()
            .max_attempts_per_model(2)
            .max_passes(1)
            .build()
            .unwrap();
        assert_eq!(orchestrator.ladder().len(), 2);
        assert_eq!(orchestrator.policy().max_attempts_per_model, 2);
        assert_eq!(orchestrator.policy().max_passes, 1);
    }

    #[test]
    fn missing_backend_is_rejected() {
        let err = MoodlineBuilder::new().build().err().unwrap();
        assert!(err.to_string().contains("No backend specified"));
    }

    #[cfg(feature = "openrouter")]
    #[test]
    fn backend_without_key_is_an_auth_error() {
        let err = MoodlineBuilder::new()
            .backend(LLMBackend::OpenRouter)
            .build()
            .err()
            .unwrap();
        assert!(matches!(err, LLMError::AuthError(_)));
    }

    #[cfg(feature = "groq")]
    #[test]
    fn backend_uses_default_ladder() {
        let orchestrator = MoodlineBuilder::new()
            .backend(LLMBackend::Groq)
            .api_key("k")
            .build()
            .unwrap();
        assert!(orchestrator.ladder().len() >= 2);
        assert_eq!(orchestrator.policy(), &RetryPolicy::defaults());
    }
}
