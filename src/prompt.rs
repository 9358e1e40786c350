//! Prompt construction for a theme.
//!
//! The orchestrator treats prompts as opaque strings: it asks a
//! [`PromptBuilder`] once per generation and reuses the result for every
//! attempt of that generation.

use crate::theme::Theme;

/// System and user prompt for one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// Produces the prompt for a theme.
pub trait PromptBuilder: Send + Sync {
    fn build(&self, theme: Theme) -> Prompt;
}

impl<F> PromptBuilder for F
where
    F: Fn(Theme) -> Prompt + Send + Sync,
{
    fn build(&self, theme: Theme) -> Prompt {
        self(theme)
    }
}

/// Stock prompts describing the JSON contract and the tone of each theme.
#[derive(Debug, Clone, Default)]
pub struct ThemePrompts;

impl ThemePrompts {
    fn tone(theme: Theme) -> &'static str {
        match theme {
            Theme::Wholesome => {
                "warm, kind and uplifting, the kind of note that makes a stranger smile"
            }
            Theme::Dark => {
                "darkly funny and a little ominous, gallows humour without cruelty or slurs"
            }
        }
    }
}

impl PromptBuilder for ThemePrompts {
    fn build(&self, theme: Theme) -> Prompt {
        let system = "You write one short message for a stranger. \
            Reply with a single JSON object and nothing else, with exactly these keys: \
            \"reasoning\" (string, why this message fits), \
            \"score\" (number from 1 to 10, how well it fits), \
            \"finalMessage\" (string, the message itself, fewer than 15 words).";
        let user = format!(
            "Theme: {theme}. Write a message that is {}. Keep finalMessage under 15 words.",
            Self::tone(theme)
        );
        Prompt::new(system, user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stock_prompts_mention_theme_and_contract() {
        for theme in Theme::ALL {
            let prompt = ThemePrompts.build(theme);
            assert!(prompt.system.contains("finalMessage"));
            assert!(prompt.user.contains(theme.as_str()));
        }
    }

    #[test]
    fn closures_are_prompt_builders() {
        let builder = |theme: Theme| Prompt::new("sys", format!("go {theme}"));
        assert_eq!(builder.build(Theme::Dark).user, "go dark");
    }
}
