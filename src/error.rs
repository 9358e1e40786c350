use std::fmt;
use std::time::Duration;

/// Error types that can occur while configuring or running a generation.
#[derive(Debug)]
pub enum LLMError {
    /// HTTP request/response errors
    HttpError(String),
    /// Authentication and authorization errors
    AuthError(String),
    /// Invalid request parameters or format
    InvalidRequest(String),
    /// A caller passed a value outside the accepted domain (e.g. an unknown theme)
    InvalidArgument(String),
    /// Errors returned by the LLM provider
    ProviderError(String),
    /// The provider answered with something that could not be decoded
    ResponseFormatError {
        message: String,
        raw_response: String,
    },
    /// JSON serialization/deserialization errors
    JsonError(String),
    /// The provider throttled the request
    RateLimited { retry_after: Option<Duration> },
    /// The provider returned a well-formed envelope without any text
    EmptyResponse,
    /// Invalid process configuration (ladder, fallback pools, settings)
    ConfigError(String),
}

impl LLMError {
    /// Whether this error is the provider telling us to back off.
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, LLMError::RateLimited { .. })
    }
}

impl fmt::Display for LLMError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LLMError::HttpError(e) => write!(f, "HTTP Error: {e}"),
            LLMError::AuthError(e) => write!(f, "Auth Error: {e}"),
            LLMError::InvalidRequest(e) => write!(f, "Invalid Request: {e}"),
            LLMError::InvalidArgument(e) => write!(f, "Invalid Argument: {e}"),
            LLMError::ProviderError(e) => write!(f, "Provider Error: {e}"),
            LLMError::ResponseFormatError {
                message,
                raw_response,
            } => write!(f, "Response Format Error: {message}. Raw response: {raw_response}"),
            LLMError::JsonError(e) => write!(f, "JSON Parse Error: {e}"),
            LLMError::RateLimited {
                retry_after: Some(d),
            } => write!(f, "Rate limited (retry after {}s)", d.as_secs()),
            LLMError::RateLimited { retry_after: None } => write!(f, "Rate limited"),
            LLMError::EmptyResponse => write!(f, "Provider returned an empty response"),
            LLMError::ConfigError(e) => write!(f, "Configuration Error: {e}"),
        }
    }
}

impl std::error::Error for LLMError {}

/// Converts reqwest HTTP errors into LLMErrors
impl From<reqwest::Error> for LLMError {
    fn from(err: reqwest::Error) -> Self {
        LLMError::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for LLMError {
    fn from(err: serde_json::Error) -> Self {
        LLMError::JsonError(format!(
            "{} at line {} column {}",
            err,
            err.line(),
            err.column()
        ))
    }
}

impl From<std::io::Error> for LLMError {
    fn from(err: std::io::Error) -> Self {
        LLMError::ConfigError(err.to_string())
    }
}
