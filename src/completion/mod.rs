use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::LLMError;

/// Temperature used when a request does not set one.
pub const DEFAULT_TEMPERATURE: f32 = 1.0;

/// Output format requested from the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ResponseFormat {
    /// Ask the provider for a single JSON object
    #[default]
    Json,
    /// Free-form text
    Text,
}

/// A single completion request sent to one model.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    /// Instructions framing the model's behaviour
    pub system_prompt: String,
    /// The user turn
    pub user_prompt: String,
    /// Model identifier understood by the provider
    pub model: String,
    /// Sampling temperature
    pub temperature: f32,
    /// Requested output format
    pub response_format: ResponseFormat,
}

/// The provider's answer, exactly as received. May contain formatting noise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCompletion {
    /// The generated text
    pub text: String,
}

impl RawCompletion {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl std::fmt::Display for RawCompletion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

impl CompletionRequest {
    /// Creates a builder for constructing a completion request.
    ///
    /// # Arguments
    ///
    /// * `model` - The model identifier to address
    pub fn builder(model: impl Into<String>) -> CompletionRequestBuilder {
        CompletionRequestBuilder {
            model: model.into(),
            system_prompt: String::new(),
            user_prompt: String::new(),
            temperature: None,
            response_format: ResponseFormat::default(),
        }
    }
}

/// Builder for constructing completion requests with optional parameters.
#[derive(Debug, Clone)]
pub struct CompletionRequestBuilder {
    model: String,
    system_prompt: String,
    user_prompt: String,
    temperature: Option<f32>,
    response_format: ResponseFormat,
}

impl CompletionRequestBuilder {
    /// Sets the system prompt.
    pub fn system(mut self, val: impl Into<String>) -> Self {
        self.system_prompt = val.into();
        self
    }

    /// Sets the user prompt.
    pub fn user(mut self, val: impl Into<String>) -> Self {
        self.user_prompt = val.into();
        self
    }

    /// Sets the temperature parameter for controlling randomness.
    pub fn temperature(mut self, val: f32) -> Self {
        self.temperature = Some(val);
        self
    }

    /// Sets the requested output format.
    pub fn response_format(mut self, val: ResponseFormat) -> Self {
        self.response_format = val;
        self
    }

    /// Builds the completion request with the configured parameters.
    pub fn build(self) -> CompletionRequest {
        CompletionRequest {
            system_prompt: self.system_prompt,
            user_prompt: self.user_prompt,
            model: self.model,
            temperature: self.temperature.unwrap_or(DEFAULT_TEMPERATURE),
            response_format: self.response_format,
        }
    }
}

/// One network round trip to a completion service.
///
/// Implementations perform no retries, no cleaning and no validation. Failures
/// are reported as [`LLMError::RateLimited`] when the provider throttles,
/// [`LLMError::EmptyResponse`] when the envelope carries no text, or any other
/// variant for transport and provider faults.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Sends a completion request to generate text.
    ///
    /// # Arguments
    ///
    /// * `req` - The completion request parameters
    ///
    /// # Returns
    ///
    /// The raw generated text or an error
    async fn complete(&self, req: &CompletionRequest) -> Result<RawCompletion, LLMError>;
}

#[async_trait]
impl<P: CompletionProvider + ?Sized> CompletionProvider for Box<P> {
    async fn complete(&self, req: &CompletionRequest) -> Result<RawCompletion, LLMError> {
        (**self).complete(req).await
    }
}

#[async_trait]
impl<P: CompletionProvider + ?Sized> CompletionProvider for std::sync::Arc<P> {
    async fn complete(&self, req: &CompletionRequest) -> Result<RawCompletion, LLMError> {
        (**self).complete(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_defaults_to_json_and_unit_temperature() {
        let req = CompletionRequest::builder("m1")
            .system("sys")
            .user("usr")
            .build();
        assert_eq!(req.model, "m1");
        assert_eq!(req.temperature, DEFAULT_TEMPERATURE);
        assert_eq!(req.response_format, ResponseFormat::Json);
        assert_eq!(req.system_prompt, "sys");
        assert_eq!(req.user_prompt, "usr");
    }

    #[test]
    fn builder_overrides() {
        let req = CompletionRequest::builder("m2")
            .temperature(0.3)
            .response_format(ResponseFormat::Text)
            .build();
        assert_eq!(req.temperature, 0.3);
        assert_eq!(req.response_format, ResponseFormat::Text);
    }
}
