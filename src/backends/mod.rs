#[cfg(feature = "openrouter")]
pub mod openrouter;

#[cfg(feature = "groq")]
pub mod groq;
