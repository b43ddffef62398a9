//! Configuration for the murmur gateway
//!
//! Everything is read from the environment once at process start; the
//! resulting [`Config`] is immutable and injected into the API state.

use crate::upstream::KEY_PREFIX;

/// Default chat model when `GROQ_MODEL` is unset
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";

/// Default conversation memory length (user+assistant pairs)
pub const DEFAULT_MAX_TURNS: usize = 10;

/// System prompt sent upstream ahead of the caller's transcript
///
/// Tuned for spoken output: short sentences, no markdown.
pub const SYSTEM_PROMPT: &str = "You are a helpful, detailed voice assistant. \
    Provide comprehensive and informative responses in 3-8 sentences. \
    Be conversational and engaging while being accurate and helpful. \
    Use simple English without markdown formatting.";

/// Murmur gateway configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Groq API key; `None` runs the gateway in fallback mode
    pub api_key: Option<String>,

    /// Chat model identifier for upstream completions
    pub model: String,

    /// Conversation memory length in user+assistant pairs
    pub max_turns: usize,

    /// Verbose diagnostics (`DEBUG` env var)
    pub debug: bool,

    /// System prompt prepended to every upstream call
    pub system_prompt: String,
}

impl Config {
    /// Load configuration from the environment
    ///
    /// Absence of `GROQ_API_KEY` is a supported mode, not an error: the
    /// gateway serves canned replies until a key is provided.
    #[must_use]
    pub fn from_env() -> Self {
        let api_key = std::env::var("GROQ_API_KEY")
            .ok()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty());

        if let Some(key) = &api_key {
            if !key.starts_with(KEY_PREFIX) {
                tracing::warn!(
                    "GROQ_API_KEY format may be invalid (expected \"{KEY_PREFIX}\" prefix)"
                );
            }
        }

        let model = std::env::var("GROQ_MODEL")
            .ok()
            .map(|m| m.trim().to_string())
            .filter(|m| !m.is_empty())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let max_turns = std::env::var("MURMUR_MAX_TURNS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_MAX_TURNS);

        let debug = std::env::var("DEBUG").is_ok_and(|v| !v.is_empty() && v != "0");

        Self {
            api_key,
            model,
            max_turns,
            debug,
            system_prompt: SYSTEM_PROMPT.to_string(),
        }
    }

    /// True when no usable API key is configured
    #[must_use]
    pub const fn fallback_mode(&self) -> bool {
        self.api_key.is_none()
    }
}
