//! Groq API client implementation for completions.
//!
//! This module provides integration with Groq's hosted models through their
//! OpenAI-compatible API.

use crate::{
    error::LLMError,
    providers::openai_compatible::{OpenAICompatibleConfig, OpenAICompatibleProvider},
};

/// Groq configuration for the generic provider
pub struct GroqConfig;

impl OpenAICompatibleConfig for GroqConfig {
    const PROVIDER_NAME: &'static str = "Groq";
    const DEFAULT_BASE_URL: &'static str = "https://api.groq.com/openai/v1/";
    const DEFAULT_LADDER: &'static [&'static str] = &[
        "llama-3.1-8b-instant",
        "gemma2-9b-it",
        "llama-3.3-70b-versatile",
        "meta-llama/llama-4-scout-17b-16e-instruct",
    ];
}

pub type Groq = OpenAICompatibleProvider<GroqConfig>;

impl Groq {
    /// Creates a new Groq client with the specified configuration.
    pub fn with_config(
        api_key: impl Into<String>,
        base_url: Option<String>,
        timeout_seconds: Option<u64>,
    ) -> Result<Self, LLMError> {
        OpenAICompatibleProvider::<GroqConfig>::new(api_key, base_url, timeout_seconds)
    }
}

#[cfg(test)]
const LLM_API_KEY_ENV: &str = "GROQ_API_KEY";

#[tokio::test]
async fn test_groq_complete_json() -> Result<(), Box<dyn std::error::Error>> {
    use crate::completion::{CompletionProvider, CompletionRequest};

    let api_key = match std::env::var(LLM_API_KEY_ENV) {
        Ok(key) => key,
        Err(_) => {
            eprintln!("test test_groq_complete_json ... ignored, {LLM_API_KEY_ENV} not set");
            return Ok(());
        }
    };
    let groq = Groq::with_config(api_key, None, Some(30))?;
    let req = CompletionRequest::builder(GroqConfig::DEFAULT_LADDER[0])
        .system("Reply with a JSON object with a single key \"ok\" set to true.")
        .user("Go.")
        .build();
    match groq.complete(&req).await {
        Ok(raw) => {
            assert!(!raw.text.is_empty(), "Expected response text");
        }
        Err(e) if e.is_rate_limit() => {
            eprintln!("test test_groq_complete_json ... rate limited, skipping");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
