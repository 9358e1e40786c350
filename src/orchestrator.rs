//! Resilient generation of one themed message.
//!
//! An [`Orchestrator`] walks its [`ModelLadder`] under a [`RetryPolicy`],
//! cleaning and validating every raw completion, and falls back to a canned
//! message from the [`FallbackBank`] when nothing valid comes back. Provider
//! faults never escape [`Orchestrator::generate`].
//!
//! # Example
//!
//! ```no_run
//! use moodline::builder::{LLMBackend, MoodlineBuilder};
//! use moodline::theme::Theme;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let orchestrator = MoodlineBuilder::new()
//!         .backend(LLMBackend::OpenRouter)
//!         .api_key(std::env::var("OPENROUTER_API_KEY").unwrap_or_default())
//!         .max_attempts_per_model(3)
//!         .build()?;
//!
//!     let result = orchestrator.generate(Theme::Wholesome).await;
//!     println!("{}", result.message());
//!     Ok(())
//! }
//! ```

use std::str::FromStr;
use std::time::Duration;

use serde::Serialize;
use serde_json::Value;
use tokio::time::{sleep, timeout};

use crate::cleaner::clean;
use crate::completion::{CompletionProvider, CompletionRequest, ResponseFormat};
use crate::error::LLMError;
use crate::fallback::FallbackBank;
use crate::ladder::ModelLadder;
use crate::prompt::{Prompt, PromptBuilder};
use crate::resilient::{AttemptOutcome, LadderCursor, RetryPolicy, Step};
use crate::theme::Theme;
use crate::validator::{validate, Candidate};

/// Terminal result of one generation.
///
/// Serialized with a `source` tag so a canned message can never be mistaken
/// for a live answer with reasoning and score.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "source")]
pub enum GenerationResult {
    /// A model produced a payload that passed validation
    #[serde(rename = "llm", rename_all = "camelCase")]
    Validated {
        candidate: Candidate,
        system_prompt: String,
        user_prompt: String,
        model: String,
    },
    /// Every permitted attempt failed; the message comes from the canned pool
    #[serde(rename = "fallback")]
    Fallback { message: String },
}

impl GenerationResult {
    /// The text meant for the end user, whatever its origin.
    pub fn message(&self) -> &str {
        match self {
            GenerationResult::Validated { candidate, .. } => &candidate.final_message,
            GenerationResult::Fallback { message } => message,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, GenerationResult::Fallback { .. })
    }
}

/// Composes provider, ladder, retry policy, prompts and fallbacks.
///
/// Holds no mutable state; share it behind an `Arc` to serve concurrent
/// generations.
pub struct Orchestrator {
    provider: Box<dyn CompletionProvider>,
    ladder: ModelLadder,
    policy: RetryPolicy,
    prompts: Box<dyn PromptBuilder>,
    fallbacks: FallbackBank,
    temperature: f32,
}

impl Orchestrator {
    /// Creates an orchestrator from its parts.
    ///
    /// # Arguments
    ///
    /// * `provider` - Completion adapter used for every attempt
    /// * `ladder` - Models to try, in order
    /// * `policy` - Attempt, pass and delay bounds
    /// * `prompts` - Prompt source for each theme
    /// * `fallbacks` - Canned messages used once the ladder is exhausted
    pub fn new(
        provider: Box<dyn CompletionProvider>,
        ladder: ModelLadder,
        policy: RetryPolicy,
        prompts: Box<dyn PromptBuilder>,
        fallbacks: FallbackBank,
    ) -> Self {
        Self {
            provider,
            ladder,
            policy: policy.normalized(),
            prompts,
            fallbacks,
            temperature: crate::completion::DEFAULT_TEMPERATURE,
        }
    }

    /// Overrides the sampling temperature used for every attempt.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn ladder(&self) -> &ModelLadder {
        &self.ladder
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn fallbacks(&self) -> &FallbackBank {
        &self.fallbacks
    }

    /// Parses `theme` and generates a message for it.
    ///
    /// An unknown theme fails with [`LLMError::InvalidArgument`] before any
    /// provider call is made.
    pub async fn generate_str(&self, theme: &str) -> Result<GenerationResult, LLMError> {
        let theme = Theme::from_str(theme)?;
        Ok(self.generate(theme).await)
    }

    /// Generates one message for `theme`.
    ///
    /// Always returns a result: either a validated candidate from one of the
    /// ladder's models, or a canned message once every attempt has failed or
    /// the deadline has elapsed.
    pub async fn generate(&self, theme: Theme) -> GenerationResult {
        let prompt = self.prompts.build(theme);
        let walk = self.walk_ladder(&prompt);

        let found = match self.policy.deadline {
            Some(limit) => match timeout(limit, walk).await {
                Ok(found) => found,
                Err(_) => {
                    log::warn!(
                        "Generation for theme '{}' hit the {}ms deadline",
                        theme,
                        limit.as_millis()
                    );
                    None
                }
            },
            None => walk.await,
        };

        match found {
            Some((candidate, model)) => {
                log::info!("Generated '{}' message with model {}", theme, model);
                GenerationResult::Validated {
                    candidate,
                    system_prompt: prompt.system,
                    user_prompt: prompt.user,
                    model,
                }
            }
            None => {
                log::warn!(
                    "All models exhausted for theme '{}', serving a fallback message",
                    theme
                );
                GenerationResult::Fallback {
                    message: self.fallbacks.pick(theme).to_string(),
                }
            }
        }
    }

    async fn walk_ladder(&self, prompt: &Prompt) -> Option<(Candidate, String)> {
        let mut cursor = LadderCursor::new(self.ladder.len(), &self.policy);
        let mut step = cursor.current();

        loop {
            match step {
                Step::Attempt {
                    model_index,
                    attempt,
                } => {
                    let model = self.ladder.get(model_index)?;
                    log::debug!(
                        "Pass {} attempt {}/{} with model {}",
                        cursor.pass(),
                        attempt,
                        self.policy.max_attempts_per_model,
                        model
                    );

                    let outcome = self.attempt(model, prompt).await;
                    if let AttemptOutcome::Success(candidate) = outcome {
                        return Some((candidate, model.to_string()));
                    }
                    log_failure(model, attempt, &outcome);
                    step = cursor.advance(&outcome).unwrap_or(Step::Exhausted);
                }
                Step::PassBackoff { next_pass } => {
                    log::debug!(
                        "Ladder pass failed, waiting {}ms before pass {}",
                        self.policy.pass_delay.as_millis(),
                        next_pass
                    );
                    if self.policy.pass_delay > Duration::ZERO {
                        sleep(self.policy.pass_delay).await;
                    }
                    step = cursor.begin_next_pass();
                }
                Step::Exhausted => return None,
            }
        }
    }

    async fn attempt(&self, model: &str, prompt: &Prompt) -> AttemptOutcome {
        let req = CompletionRequest::builder(model)
            .system(prompt.system.as_str())
            .user(prompt.user.as_str())
            .temperature(self.temperature)
            .response_format(ResponseFormat::Json)
            .build();

        match self.provider.complete(&req).await {
            Ok(raw) => evaluate(&raw.text),
            Err(LLMError::RateLimited { retry_after }) => {
                if let Some(hint) = retry_after {
                    log::debug!("Model {} asked to retry after {}s", model, hint.as_secs());
                }
                AttemptOutcome::RateLimited
            }
            Err(e) => AttemptOutcome::TransportError(e.to_string()),
        }
    }
}

/// Cleans, decodes and validates one raw completion.
pub fn evaluate(raw: &str) -> AttemptOutcome {
    let cleaned = clean(raw);
    if cleaned.is_empty() {
        return AttemptOutcome::TransportError(LLMError::EmptyResponse.to_string());
    }

    let decoded: Value = match serde_json::from_str(&cleaned) {
        Ok(v) => v,
        Err(e) => return AttemptOutcome::Invalid(format!("malformed json: {e}")),
    };

    match validate(&decoded) {
        Ok(candidate) => AttemptOutcome::Success(candidate),
        Err(violation) => AttemptOutcome::Invalid(violation.to_string()),
    }
}

fn log_failure(model: &str, attempt: usize, outcome: &AttemptOutcome) {
    match outcome {
        AttemptOutcome::RateLimited => {
            log::warn!("Model {} rate limited, moving down the ladder", model)
        }
        AttemptOutcome::Invalid(reason) | AttemptOutcome::TransportError(reason) => {
            log::warn!(
                "Model {} attempt {} failed ({}): {}",
                model,
                attempt,
                outcome.kind(),
                reason
            )
        }
        AttemptOutcome::Success(_) => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn evaluate_classifies_raw_text() {
        let ok = r#"```json
{"reasoning": "fits", "score": 9, "finalMessage": "You matter."}
```"#;
        assert!(matches!(evaluate(ok), AttemptOutcome::Success(c) if c.final_message == "You matter."));

        assert!(matches!(evaluate("not json"), AttemptOutcome::Invalid(r) if r.starts_with("malformed json")));
        assert!(matches!(evaluate("   "), AttemptOutcome::TransportError(_)));
        assert!(matches!(evaluate("```\n```"), AttemptOutcome::TransportError(_)));

        let long = r#"{"reasoning": "r", "score": 1, "finalMessage": "one two three four five six seven eight nine ten eleven twelve thirteen fourteen fifteen"}"#;
        assert!(matches!(evaluate(long), AttemptOutcome::Invalid(r) if r.contains("word count")));
    }

    #[test]
    fn results_serialize_with_distinct_tags() {
        let validated = GenerationResult::Validated {
            candidate: Candidate {
                reasoning: "r".into(),
                score: 7.0,
                final_message: "hello there".into(),
            },
            system_prompt: "s".into(),
            user_prompt: "u".into(),
            model: "m".into(),
        };
        let v = serde_json::to_value(&validated).unwrap();
        assert_eq!(v["source"], json!("llm"));
        assert_eq!(v["candidate"]["finalMessage"], json!("hello there"));
        assert_eq!(v["systemPrompt"], json!("s"));
        assert_eq!(validated.message(), "hello there");

        let fallback = GenerationResult::Fallback {
            message: "canned".into(),
        };
        let v = serde_json::to_value(&fallback).unwrap();
        assert_eq!(v, json!({"source": "fallback", "message": "canned"}));
        assert!(fallback.is_fallback());
    }
}
