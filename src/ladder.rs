//! Ordered list of models tried one after another.
//!
//! Each backing model has its own rate-limit bucket, so walking down the list
//! after a throttle or repeated failure usually finds one that answers.

use crate::error::LLMError;

/// Non-empty ordered sequence of model identifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelLadder {
    models: Vec<String>,
}

impl ModelLadder {
    /// Creates a ladder from model identifiers, tried left-to-right.
    ///
    /// Blank identifiers are rejected, as is an empty list.
    pub fn new<I, S>(models: I) -> Result<Self, LLMError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let models: Vec<String> = models
            .into_iter()
            .map(|m| m.into().trim().to_string())
            .collect();

        if models.is_empty() {
            return Err(LLMError::ConfigError(
                "Model ladder must contain at least one model".to_string(),
            ));
        }
        if let Some(pos) = models.iter().position(|m| m.is_empty()) {
            return Err(LLMError::ConfigError(format!(
                "Model ladder entry {pos} is blank"
            )));
        }

        Ok(Self { models })
    }

    /// Number of models in the ladder.
    pub fn len(&self) -> usize {
        self.models.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    /// Model at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.models.get(index).map(String::as_str)
    }

    /// Iterates over the models in order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.models.iter().map(String::as_str)
    }
}

/// Parses a comma-separated list such as `"a/model:free, b/model"`.
impl std::str::FromStr for ModelLadder {
    type Err = LLMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s
            .split(',')
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .collect();
        ModelLadder::new(parts)
    }
}

impl std::fmt::Display for ModelLadder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.models.join(" -> "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn keeps_order() {
        let ladder = ModelLadder::new(["a", "b", "c"]).unwrap();
        assert_eq!(ladder.iter().collect::<Vec<_>>(), vec!["a", "b", "c"]);
        assert_eq!(ladder.get(1), Some("b"));
        assert_eq!(ladder.get(3), None);
        assert_eq!(ladder.to_string(), "a -> b -> c");
    }

    #[test]
    fn rejects_empty_and_blank() {
        assert!(ModelLadder::new(Vec::<String>::new()).is_err());
        assert!(ModelLadder::new(["a", "  "]).is_err());
        assert!(ModelLadder::from_str(" , ,").is_err());
    }

    #[test]
    fn parses_comma_list() {
        let ladder = ModelLadder::from_str(" x/one:free ,x/two,, x/three ").unwrap();
        assert_eq!(ladder.len(), 3);
        assert_eq!(ladder.get(0), Some("x/one:free"));
        assert_eq!(ladder.get(2), Some("x/three"));
    }
}
