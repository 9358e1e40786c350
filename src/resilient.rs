//! Retry policy and the ladder walk it drives.
//!
//! The walk is kept as plain data, a [`LadderCursor`] holding the pass, model
//! index and attempt number, plus a pure transition function
//! ([`LadderCursor::advance`]). The orchestrator only performs the side
//! effects (provider call, sleep) that each [`Step`] asks for, which keeps the
//! termination conditions easy to audit and to test without any I/O.

use std::time::Duration;

use crate::validator::Candidate;

/// Configuration for retry and backoff behavior.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum attempts against a single model within one pass, including the first
    pub max_attempts_per_model: usize,
    /// Number of full traversals of the ladder before giving up
    pub max_passes: usize,
    /// Pause between two passes
    pub pass_delay: Duration,
    /// Optional overall budget for one generation; when it runs out the
    /// generation degrades to a canned message
    pub deadline: Option<Duration>,
}

impl RetryPolicy {
    /// Creates a default configuration with sane values.
    pub fn defaults() -> Self {
        Self {
            max_attempts_per_model: 3,
            max_passes: 2,
            pass_delay: Duration::from_millis(1_000),
            deadline: None,
        }
    }

    /// One pass, no pause, no deadline.
    pub fn single_pass(max_attempts_per_model: usize) -> Self {
        Self {
            max_attempts_per_model,
            max_passes: 1,
            pass_delay: Duration::ZERO,
            deadline: None,
        }
    }

    /// Clamps zero bounds up to one so the walk always issues at least one call.
    pub fn normalized(mut self) -> Self {
        self.max_attempts_per_model = self.max_attempts_per_model.max(1);
        self.max_passes = self.max_passes.max(1);
        self
    }

    /// Upper bound on provider calls one generation can make.
    pub fn max_calls(&self, ladder_len: usize) -> usize {
        self.max_attempts_per_model
            .saturating_mul(ladder_len)
            .saturating_mul(self.max_passes)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::defaults()
    }
}

/// Result of a single attempt against a single model.
#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome {
    /// The payload decoded and passed validation
    Success(Candidate),
    /// The provider throttled this model
    RateLimited,
    /// The payload was malformed or violated the output contract
    Invalid(String),
    /// Network, provider or empty-payload failure
    TransportError(String),
}

impl AttemptOutcome {
    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AttemptOutcome::Success(_) => "success",
            AttemptOutcome::RateLimited => "rate_limited",
            AttemptOutcome::Invalid(_) => "invalid",
            AttemptOutcome::TransportError(_) => "transport_error",
        }
    }
}

/// What the orchestrator must do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Issue attempt number `attempt` (1-based) against the model at `model_index`
    Attempt { model_index: usize, attempt: usize },
    /// Sleep for the pass delay, then ask the cursor again
    PassBackoff { next_pass: usize },
    /// Every permitted call has failed
    Exhausted,
}

/// Position of one generation in the ladder walk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LadderCursor {
    pass: usize,
    model_index: usize,
    attempt: usize,
    ladder_len: usize,
    max_attempts: usize,
    max_passes: usize,
    done: bool,
}

impl LadderCursor {
    /// Cursor at pass 1, model 0, attempt 1.
    pub fn new(ladder_len: usize, policy: &RetryPolicy) -> Self {
        Self {
            pass: 1,
            model_index: 0,
            attempt: 1,
            ladder_len,
            max_attempts: policy.max_attempts_per_model.max(1),
            max_passes: policy.max_passes.max(1),
            done: ladder_len == 0,
        }
    }

    /// The step for the current position, without moving.
    pub fn current(&self) -> Step {
        if self.done {
            Step::Exhausted
        } else {
            Step::Attempt {
                model_index: self.model_index,
                attempt: self.attempt,
            }
        }
    }

    /// Current pass number (1-based).
    pub fn pass(&self) -> usize {
        self.pass
    }

    /// Moves the cursor according to the outcome of the current attempt.
    ///
    /// Returns `None` on success (the walk is over and nothing else should be
    /// tried), otherwise the next step.
    pub fn advance(&mut self, outcome: &AttemptOutcome) -> Option<Step> {
        match outcome {
            AttemptOutcome::Success(_) => {
                self.done = true;
                None
            }
            AttemptOutcome::RateLimited => Some(self.next_model()),
            AttemptOutcome::Invalid(_) | AttemptOutcome::TransportError(_) => {
                if self.attempt < self.max_attempts {
                    self.attempt += 1;
                    Some(self.current())
                } else {
                    Some(self.next_model())
                }
            }
        }
    }

    /// Starts the pass announced by [`Step::PassBackoff`].
    pub fn begin_next_pass(&mut self) -> Step {
        if self.done {
            return Step::Exhausted;
        }
        self.pass += 1;
        self.model_index = 0;
        self.attempt = 1;
        self.current()
    }

    fn next_model(&mut self) -> Step {
        self.attempt = 1;
        if self.model_index + 1 < self.ladder_len {
            self.model_index += 1;
            return self.current();
        }
        if self.pass < self.max_passes {
            return Step::PassBackoff {
                next_pass: self.pass + 1,
            };
        }
        self.done = true;
        Step::Exhausted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transport() -> AttemptOutcome {
        AttemptOutcome::TransportError("boom".into())
    }

    fn candidate() -> Candidate {
        Candidate {
            reasoning: "r".into(),
            score: 1.0,
            final_message: "hi".into(),
        }
    }

    /// Drives a cursor with a fixed outcome and records every attempt issued.
    fn walk(ladder_len: usize, policy: &RetryPolicy, outcome: AttemptOutcome) -> Vec<(usize, usize)> {
        let mut cursor = LadderCursor::new(ladder_len, policy);
        let mut step = cursor.current();
        let mut calls = Vec::new();
        loop {
            match step {
                Step::Attempt { model_index, .. } => {
                    calls.push((cursor.pass(), model_index));
                    match cursor.advance(&outcome) {
                        Some(next) => step = next,
                        None => break,
                    }
                }
                Step::PassBackoff { .. } => step = cursor.begin_next_pass(),
                Step::Exhausted => break,
            }
        }
        calls
    }

    #[test]
    fn rate_limit_skips_to_next_model() {
        let calls = walk(4, &RetryPolicy::single_pass(3), AttemptOutcome::RateLimited);
        assert_eq!(calls, vec![(1, 0), (1, 1), (1, 2), (1, 3)]);
    }

    #[test]
    fn transport_errors_exhaust_each_model() {
        let calls = walk(2, &RetryPolicy::single_pass(3), transport());
        assert_eq!(calls, vec![(1, 0), (1, 0), (1, 0), (1, 1), (1, 1), (1, 1)]);
    }

    #[test]
    fn passes_repeat_the_ladder() {
        let policy = RetryPolicy {
            max_attempts_per_model: 1,
            max_passes: 3,
            pass_delay: Duration::ZERO,
            deadline: None,
        };
        let calls = walk(2, &policy, transport());
        assert_eq!(calls, vec![(1, 0), (1, 1), (2, 0), (2, 1), (3, 0), (3, 1)]);
        assert_eq!(calls.len(), policy.max_calls(2));
    }

    #[test]
    fn backoff_is_announced_between_passes_only() {
        let policy = RetryPolicy {
            max_attempts_per_model: 1,
            max_passes: 2,
            pass_delay: Duration::from_millis(5),
            deadline: None,
        };
        let mut cursor = LadderCursor::new(1, &policy);
        assert_eq!(
            cursor.advance(&AttemptOutcome::RateLimited),
            Some(Step::PassBackoff { next_pass: 2 })
        );
        assert_eq!(
            cursor.begin_next_pass(),
            Step::Attempt {
                model_index: 0,
                attempt: 1
            }
        );
        assert_eq!(cursor.advance(&AttemptOutcome::RateLimited), Some(Step::Exhausted));
        assert_eq!(cursor.current(), Step::Exhausted);
    }

    #[test]
    fn success_stops_the_walk() {
        let mut cursor = LadderCursor::new(3, &RetryPolicy::single_pass(3));
        assert_eq!(cursor.advance(&transport()), Some(Step::Attempt { model_index: 0, attempt: 2 }));
        assert_eq!(cursor.advance(&AttemptOutcome::Success(candidate())), None);
        assert_eq!(cursor.current(), Step::Exhausted);
    }

    #[test]
    fn rate_limit_resets_attempt_counter() {
        let mut cursor = LadderCursor::new(2, &RetryPolicy::single_pass(3));
        cursor.advance(&AttemptOutcome::Invalid("bad".into()));
        assert_eq!(
            cursor.advance(&AttemptOutcome::RateLimited),
            Some(Step::Attempt {
                model_index: 1,
                attempt: 1
            })
        );
    }

    #[test]
    fn zero_bounds_are_clamped() {
        let policy = RetryPolicy {
            max_attempts_per_model: 0,
            max_passes: 0,
            pass_delay: Duration::ZERO,
            deadline: None,
        };
        assert_eq!(walk(2, &policy, transport()).len(), 2);
        assert_eq!(policy.normalized().max_calls(2), 2);
    }
}
