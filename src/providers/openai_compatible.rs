//! OpenAI-compatible API client base implementation
//!
//! This module provides a generic completion adapter for chat-completions
//! style APIs that can be reused across providers like OpenRouter and Groq.

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header::RETRY_AFTER, Client, StatusCode, Url};
use serde::{Deserialize, Serialize};

use crate::completion::{CompletionProvider, CompletionRequest, RawCompletion, ResponseFormat};
use crate::error::LLMError;

/// Generic OpenAI-compatible provider
///
/// Different providers customize behavior by implementing [`OpenAICompatibleConfig`].
/// The model is taken from each request, so one client serves the whole ladder.
pub struct OpenAICompatibleProvider<T: OpenAICompatibleConfig> {
    pub api_key: String,
    pub base_url: Url,
    pub timeout_seconds: Option<u64>,
    pub client: Client,
    _phantom: PhantomData<T>,
}

/// Configuration trait for OpenAI-compatible providers
pub trait OpenAICompatibleConfig: Send + Sync {
    /// The name of the provider (e.g., "OpenRouter", "Groq")
    const PROVIDER_NAME: &'static str;

    /// Default base URL for the provider
    const DEFAULT_BASE_URL: &'static str;

    /// Models tried when no ladder is configured, cheapest/fastest first
    const DEFAULT_LADDER: &'static [&'static str];

    /// Chat completions endpoint path (usually "chat/completions")
    const CHAT_ENDPOINT: &'static str = "chat/completions";

    /// Whether this provider accepts `response_format: {"type": "json_object"}`
    const SUPPORTS_JSON_MODE: bool = true;

    /// Custom headers to add to requests
    fn custom_headers() -> Option<Vec<(String, String)>> {
        None
    }
}

#[derive(Serialize, Debug)]
pub struct OpenAICompatibleChatMessage<'a> {
    pub role: &'a str,
    pub content: &'a str,
}

#[derive(Serialize, Debug, PartialEq, Eq)]
pub enum ResponseType {
    #[serde(rename = "text")]
    Text,
    #[serde(rename = "json_object")]
    JsonObject,
}

#[derive(Serialize, Debug)]
pub struct OpenAIResponseFormat {
    #[serde(rename = "type")]
    pub response_type: ResponseType,
}

/// Generic OpenAI-compatible chat request
#[derive(Serialize, Debug)]
pub struct OpenAICompatibleChatRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<OpenAICompatibleChatMessage<'a>>,
    pub temperature: f32,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_format: Option<OpenAIResponseFormat>,
}

/// Generic OpenAI-compatible chat response
#[derive(Deserialize, Debug)]
pub struct OpenAICompatibleChatResponse {
    #[serde(default)]
    pub choices: Vec<OpenAICompatibleChatChoice>,
    /// Some gateways report upstream failures inside a 200 envelope
    pub error: Option<OpenAICompatibleApiError>,
}

#[derive(Deserialize, Debug)]
pub struct OpenAICompatibleChatChoice {
    pub message: OpenAICompatibleChatMsg,
}

#[derive(Deserialize, Debug)]
pub struct OpenAICompatibleChatMsg {
    pub content: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct OpenAICompatibleApiError {
    #[serde(default)]
    pub message: String,
    pub code: Option<serde_json::Value>,
}

impl OpenAICompatibleApiError {
    fn is_rate_limit(&self) -> bool {
        match &self.code {
            Some(serde_json::Value::Number(n)) => n.as_u64() == Some(429),
            Some(serde_json::Value::String(s)) => s == "429" || s.contains("rate_limit"),
            _ => false,
        }
    }
}

impl<'a> OpenAICompatibleChatRequest<'a> {
    fn from_completion<T: OpenAICompatibleConfig>(req: &'a CompletionRequest) -> Self {
        let response_format = match req.response_format {
            ResponseFormat::Json if T::SUPPORTS_JSON_MODE => Some(OpenAIResponseFormat {
                response_type: ResponseType::JsonObject,
            }),
            _ => None,
        };
        Self {
            model: &req.model,
            messages: vec![
                OpenAICompatibleChatMessage {
                    role: "system",
                    content: &req.system_prompt,
                },
                OpenAICompatibleChatMessage {
                    role: "user",
                    content: &req.user_prompt,
                },
            ],
            temperature: req.temperature,
            stream: false,
            response_format,
        }
    }
}

impl<T: OpenAICompatibleConfig> OpenAICompatibleProvider<T> {
    /// Creates a client for provider `T`.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Bearer credential for the provider
    /// * `base_url` - Override for `T::DEFAULT_BASE_URL`
    /// * `timeout_seconds` - Per-request timeout
    pub fn new(
        api_key: impl Into<String>,
        base_url: Option<String>,
        timeout_seconds: Option<u64>,
    ) -> Result<Self, LLMError> {
        let mut builder = Client::builder();
        if let Some(sec) = timeout_seconds {
            builder = builder.timeout(Duration::from_secs(sec));
        }

        let mut base = base_url.unwrap_or_else(|| T::DEFAULT_BASE_URL.to_owned());
        if !base.ends_with('/') {
            base.push('/');
        }

        Ok(Self {
            api_key: api_key.into(),
            base_url: Url::parse(&base).map_err(|e| {
                LLMError::ConfigError(format!("Invalid {} base URL: {e}", T::PROVIDER_NAME))
            })?,
            timeout_seconds,
            client: builder.build()?,
            _phantom: PhantomData,
        })
    }
}

#[async_trait]
impl<T: OpenAICompatibleConfig> CompletionProvider for OpenAICompatibleProvider<T> {
    async fn complete(&self, req: &CompletionRequest) -> Result<RawCompletion, LLMError> {
        if self.api_key.is_empty() {
            return Err(LLMError::AuthError(format!(
                "Missing {} API key",
                T::PROVIDER_NAME
            )));
        }

        let body = OpenAICompatibleChatRequest::from_completion::<T>(req);

        let url = self
            .base_url
            .join(T::CHAT_ENDPOINT)
            .map_err(|e| LLMError::HttpError(e.to_string()))?;

        let mut request = self.client.post(url).bearer_auth(&self.api_key).json(&body);

        if let Some(headers) = T::custom_headers() {
            for (key, value) in headers {
                request = request.header(key, value);
            }
        }

        if log::log_enabled!(log::Level::Trace) {
            if let Ok(json) = serde_json::to_string(&body) {
                log::trace!("{} request payload: {}", T::PROVIDER_NAME, json);
            }
        }

        let response = request.send().await?;
        let status = response.status();
        log::debug!("{} HTTP status: {} for {}", T::PROVIDER_NAME, status, req.model);

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(parse_retry_after);
            return Err(LLMError::RateLimited { retry_after });
        }

        let resp_text = response.text().await?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(LLMError::AuthError(format!(
                "{} rejected the API key ({status}): {resp_text}",
                T::PROVIDER_NAME
            )));
        }
        if !status.is_success() {
            return Err(LLMError::ResponseFormatError {
                message: format!("{} API returned error status: {status}", T::PROVIDER_NAME),
                raw_response: resp_text,
            });
        }

        extract_text(T::PROVIDER_NAME, &resp_text)
    }
}

/// Pulls the first choice's text out of a chat-completions body.
fn extract_text(provider: &str, body: &str) -> Result<RawCompletion, LLMError> {
    let parsed: OpenAICompatibleChatResponse =
        serde_json::from_str(body).map_err(|e| LLMError::ResponseFormatError {
            message: format!("Failed to decode {provider} API response: {e}"),
            raw_response: body.to_string(),
        })?;

    if let Some(err) = parsed.error {
        if err.is_rate_limit() {
            return Err(LLMError::RateLimited { retry_after: None });
        }
        return Err(LLMError::ProviderError(format!("{provider}: {}", err.message)));
    }

    match parsed
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.message.content)
    {
        Some(text) if !text.trim().is_empty() => Ok(RawCompletion::new(text)),
        _ => Err(LLMError::EmptyResponse),
    }
}

/// `Retry-After` in delay-seconds form. HTTP-date values are ignored.
fn parse_retry_after(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TestConfig;

    impl OpenAICompatibleConfig for TestConfig {
        const PROVIDER_NAME: &'static str = "Test";
        const DEFAULT_BASE_URL: &'static str = "http://localhost:9/v1";
        const DEFAULT_LADDER: &'static [&'static str] = &["test-model"];
    }

    struct NoJsonConfig;

    impl OpenAICompatibleConfig for NoJsonConfig {
        const PROVIDER_NAME: &'static str = "NoJson";
        const DEFAULT_BASE_URL: &'static str = "http://localhost:9/v1/";
        const DEFAULT_LADDER: &'static [&'static str] = &["m"];
        const SUPPORTS_JSON_MODE: bool = false;
    }

    fn request() -> CompletionRequest {
        CompletionRequest::builder("m1")
            .system("be brief")
            .user("say hi")
            .build()
    }

    #[test]
    fn request_body_carries_prompts_model_and_json_mode() {
        let req = request();
        let body = OpenAICompatibleChatRequest::from_completion::<TestConfig>(&req);
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["model"], "m1");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "say hi");
        assert_eq!(json["response_format"]["type"], "json_object");
        assert_eq!(json["stream"], false);

        let body = OpenAICompatibleChatRequest::from_completion::<NoJsonConfig>(&req);
        assert!(body.response_format.is_none());
    }

    #[test]
    fn base_url_gets_trailing_slash() {
        let provider = OpenAICompatibleProvider::<TestConfig>::new("k", None, Some(5)).unwrap();
        let url = provider.base_url.join(TestConfig::CHAT_ENDPOINT).unwrap();
        assert_eq!(url.as_str(), "http://localhost:9/v1/chat/completions");

        let bad = OpenAICompatibleProvider::<TestConfig>::new("k", Some("not a url".into()), None);
        assert!(matches!(bad, Err(LLMError::ConfigError(_))));
    }

    #[test]
    fn extracts_first_choice() {
        let body = r#"{"choices": [{"message": {"role": "assistant", "content": "{\"a\":1}"}}]}"#;
        assert_eq!(extract_text("Test", body).unwrap().text, "{\"a\":1}");
    }

    #[test]
    fn missing_or_blank_content_is_empty_response() {
        for body in [
            r#"{"choices": []}"#,
            r#"{"choices": [{"message": {"content": null}}]}"#,
            r#"{"choices": [{"message": {"content": "  "}}]}"#,
        ] {
            assert!(matches!(extract_text("Test", body), Err(LLMError::EmptyResponse)));
        }
    }

    #[test]
    fn embedded_errors_are_classified() {
        let limited = r#"{"error": {"message": "slow down", "code": 429}}"#;
        assert!(extract_text("Test", limited).unwrap_err().is_rate_limit());

        let other = r#"{"error": {"message": "upstream down", "code": 502}}"#;
        assert!(matches!(extract_text("Test", other), Err(LLMError::ProviderError(_))));

        assert!(matches!(
            extract_text("Test", "<html>"),
            Err(LLMError::ResponseFormatError { .. })
        ));
    }

    #[test]
    fn retry_after_seconds() {
        assert_eq!(parse_retry_after(" 12 "), Some(Duration::from_secs(12)));
        assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
    }

    #[tokio::test]
    async fn missing_key_fails_without_network() {
        let provider = OpenAICompatibleProvider::<TestConfig>::new("", None, None).unwrap();
        let err = provider.complete(&request()).await.unwrap_err();
        assert!(matches!(err, LLMError::AuthError(_)));
    }
}
