//! OpenRouter API client implementation for completions.
//!
//! OpenRouter fronts many hosted models behind one OpenAI-compatible API; its
//! free tiers have per-model rate limits, which is what the default ladder
//! spreads load across.

use crate::{
    error::LLMError,
    providers::openai_compatible::{OpenAICompatibleConfig, OpenAICompatibleProvider},
};

/// OpenRouter configuration for the generic provider
pub struct OpenRouterConfig;

impl OpenAICompatibleConfig for OpenRouterConfig {
    const PROVIDER_NAME: &'static str = "OpenRouter";
    const DEFAULT_BASE_URL: &'static str = "https://openrouter.ai/api/v1/";
    const DEFAULT_LADDER: &'static [&'static str] = &[
        "meta-llama/llama-3.3-70b-instruct:free",
        "google/gemma-3-27b-it:free",
        "mistralai/mistral-small-3.1-24b-instruct:free",
        "qwen/qwen-2.5-72b-instruct:free",
        "deepseek/deepseek-chat-v3-0324:free",
    ];

    fn custom_headers() -> Option<Vec<(String, String)>> {
        Some(vec![("X-Title".to_string(), "moodline".to_string())])
    }
}

pub type OpenRouter = OpenAICompatibleProvider<OpenRouterConfig>;

impl OpenRouter {
    /// Creates a new OpenRouter client with the specified configuration.
    pub fn with_config(
        api_key: impl Into<String>,
        base_url: Option<String>,
        timeout_seconds: Option<u64>,
    ) -> Result<Self, LLMError> {
        OpenAICompatibleProvider::<OpenRouterConfig>::new(api_key, base_url, timeout_seconds)
    }
}

#[cfg(test)]
const LLM_API_KEY_ENV: &str = "OPENROUTER_API_KEY";

#[tokio::test]
async fn test_openrouter_generate() -> Result<(), Box<dyn std::error::Error>> {
    use crate::builder::{LLMBackend, MoodlineBuilder};
    use crate::theme::Theme;

    let api_key = match std::env::var(LLM_API_KEY_ENV) {
        Ok(key) => key,
        Err(_) => {
            eprintln!("test test_openrouter_generate ... ignored, {LLM_API_KEY_ENV} not set");
            return Ok(());
        }
    };
    let orchestrator = MoodlineBuilder::new()
        .backend(LLMBackend::OpenRouter)
        .api_key(api_key)
        .max_passes(1)
        .build()?;

    let result = orchestrator.generate(Theme::Wholesome).await;
    assert!(!result.message().is_empty(), "Expected a message, got {result:?}");
    Ok(())
}
