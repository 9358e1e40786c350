use serde::{Deserialize, Serialize};

use crate::error::LLMError;

/// Emotional register of a generated message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    /// Warm, kind, uplifting
    Wholesome,
    /// Gallows humour and gentle menace
    Dark,
}

impl Theme {
    /// All themes, in a stable order.
    pub const ALL: [Theme; 2] = [Theme::Wholesome, Theme::Dark];

    /// Lowercase name used in configuration files and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Wholesome => "wholesome",
            Theme::Dark => "dark",
        }
    }
}

impl std::fmt::Display for Theme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a theme name case-insensitively.
///
/// # Examples
///
/// ```
/// use std::str::FromStr;
/// use moodline::theme::Theme;
///
/// assert_eq!(Theme::from_str("Dark").unwrap(), Theme::Dark);
/// let err = Theme::from_str("spooky").unwrap_err();
/// assert!(err.to_string().contains("Unknown theme"));
/// ```
impl std::str::FromStr for Theme {
    type Err = LLMError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "wholesome" => Ok(Theme::Wholesome),
            "dark" => Ok(Theme::Dark),
            _ => Err(LLMError::InvalidArgument(format!("Unknown theme: {s}"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn parses_known_themes_ignoring_case_and_padding() {
        assert_eq!(Theme::from_str("wholesome").unwrap(), Theme::Wholesome);
        assert_eq!(Theme::from_str(" DARK ").unwrap(), Theme::Dark);
    }

    #[test]
    fn rejects_unknown_theme() {
        let err = Theme::from_str("").unwrap_err();
        assert!(matches!(err, LLMError::InvalidArgument(_)));
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Theme::Dark).unwrap(), "\"dark\"");
        for theme in Theme::ALL {
            assert_eq!(Theme::from_str(&theme.to_string()).unwrap(), theme);
        }
    }
}
