//! moodline generates short themed messages with an LLM, and keeps answering
//! when the LLM does not.
//!
//! # Overview
//! One call to [`orchestrator::Orchestrator::generate`] asks a completion
//! provider for a JSON payload, strips code fences, validates the payload
//! against a strict contract and, on failure, retries the same model, moves
//! down a ladder of alternative models, repeats the ladder after a pause and
//! finally serves a canned message. Provider faults never reach the caller.
//!
//! # Architecture
//! Leaf-first:
//!
//! - [`cleaner`] strips fences around raw output
//! - [`validator`] checks decoded payloads
//! - [`completion`] is the provider seam
//! - [`ladder`] orders the models to try
//! - [`resilient`] holds the retry policy and ladder-walk state machine
//! - [`fallback`] holds the canned pools
//! - [`orchestrator`] composes all of the above

// Re-export for convenience
pub use async_trait::async_trait;

/// Backend implementations for supported providers
pub mod backends;

/// Builder pattern for configuring and instantiating an orchestrator
pub mod builder;

/// Fence stripping for raw completions
pub mod cleaner;

/// Single-call completion capability
pub mod completion;

/// Settings read from the environment at startup
pub mod config;

/// Error types and handling
pub mod error;

/// Canned per-theme messages
pub mod fallback;

/// Ordered model identifiers
pub mod ladder;

/// Resilient generation entry point
pub mod orchestrator;

/// Prompt construction per theme
pub mod prompt;

/// Shared OpenAI-compatible client
pub mod providers;

/// Retry policy and ladder-walk state machine
pub mod resilient;

/// Secret store for storing API keys
pub mod secret_store;

/// Message themes
pub mod theme;

/// Output contract for provider payloads
pub mod validator;

#[cfg(feature = "api")]
pub mod api;

pub use error::LLMError;
pub use orchestrator::{GenerationResult, Orchestrator};
pub use theme::Theme;

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
/// This is a no-op if the feature is not enabled.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::try_init();
    }
}
