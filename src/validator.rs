//! Output contract for generated messages.
//!
//! Providers are asked for a JSON object of the form
//! `{"reasoning": "...", "score": 7, "finalMessage": "..."}`. The payload is
//! decoded into an untyped [`serde_json::Value`] first and then checked here,
//! so nothing about field presence is taken on trust.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Upper bound (exclusive) on the number of words in `finalMessage`.
pub const MAX_WORDS: usize = 15;

/// A decoded generation that satisfies the output contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// The model's explanation of its choice
    pub reasoning: String,
    /// The model's self-assessed quality score
    pub score: f64,
    /// The message shown to the user
    #[serde(rename = "finalMessage")]
    pub final_message: String,
}

/// Reason a decoded value was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaViolation {
    /// The payload is a primitive or an array
    NotAnObject,
    /// A required field is absent
    MissingField(&'static str),
    /// A required field has the wrong JSON type
    WrongType {
        field: &'static str,
        expected: &'static str,
    },
    /// `finalMessage` contains no words at all
    EmptyMessage,
    /// `finalMessage` is too long
    TooManyWords { count: usize, limit: usize },
}

impl SchemaViolation {
    /// True for violations caused by the word-count ceiling.
    pub fn is_word_count(&self) -> bool {
        matches!(self, SchemaViolation::TooManyWords { .. })
    }
}

impl std::fmt::Display for SchemaViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchemaViolation::NotAnObject => write!(f, "payload is not a JSON object"),
            SchemaViolation::MissingField(field) => write!(f, "missing field `{field}`"),
            SchemaViolation::WrongType { field, expected } => {
                write!(f, "field `{field}` must be a {expected}")
            }
            SchemaViolation::EmptyMessage => write!(f, "field `finalMessage` is empty"),
            SchemaViolation::TooManyWords { count, limit } => write!(
                f,
                "word count exceeded: finalMessage has {count} words, must be fewer than {limit}"
            ),
        }
    }
}

impl std::error::Error for SchemaViolation {}

/// Number of whitespace-separated words in `text`.
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Checks a decoded payload against the output contract.
///
/// Checks run in order and stop at the first failure: object shape,
/// `reasoning` string, `score` number, `finalMessage` string, word count.
pub fn validate(decoded: &Value) -> Result<Candidate, SchemaViolation> {
    let obj = decoded.as_object().ok_or(SchemaViolation::NotAnObject)?;

    let reasoning = field(obj, "reasoning")?
        .as_str()
        .ok_or(SchemaViolation::WrongType {
            field: "reasoning",
            expected: "string",
        })?;
    let score = field(obj, "score")?
        .as_f64()
        .ok_or(SchemaViolation::WrongType {
            field: "score",
            expected: "number",
        })?;
    let final_message = field(obj, "finalMessage")?
        .as_str()
        .ok_or(SchemaViolation::WrongType {
            field: "finalMessage",
            expected: "string",
        })?;

    match word_count(final_message) {
        0 => return Err(SchemaViolation::EmptyMessage),
        count if count >= MAX_WORDS => {
            return Err(SchemaViolation::TooManyWords {
                count,
                limit: MAX_WORDS,
            })
        }
        _ => {}
    }

    Ok(Candidate {
        reasoning: reasoning.to_string(),
        score,
        final_message: final_message.trim().to_string(),
    })
}

fn field<'a>(
    obj: &'a serde_json::Map<String, Value>,
    name: &'static str,
) -> Result<&'a Value, SchemaViolation> {
    match obj.get(name) {
        None | Some(Value::Null) => Err(SchemaViolation::MissingField(name)),
        Some(v) => Ok(v),
    }
}
