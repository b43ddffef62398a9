//! Conversation transcript types and memory trimming
//!
//! A transcript is the ordered list of role-tagged messages for one browser
//! session. The browser owns it and sends it with every request; the server
//! only sanitizes it before forwarding upstream.

use serde::{Deserialize, Serialize};

/// Chat message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single role-tagged message in a transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Sanitize a transcript before it is sent upstream
///
/// Three passes, in order:
/// 1. drop messages with empty or whitespace-only content;
/// 2. collapse runs of consecutive same-role messages, keeping only the
///    latest of each run (the upstream API expects strict alternation);
/// 3. drop leading messages until at most `max_turns * 2` remain.
///
/// Pure and idempotent; always returns a valid (possibly empty) transcript.
#[must_use]
pub fn trim(transcript: &[ChatMessage], max_turns: usize) -> Vec<ChatMessage> {
    let mut kept: Vec<ChatMessage> = Vec::with_capacity(transcript.len());

    for msg in transcript {
        if msg.content.trim().is_empty() {
            continue;
        }
        // A later message of the same role supersedes the one before it.
        if kept.last().is_some_and(|prev| prev.role == msg.role) {
            kept.pop();
        }
        kept.push(msg.clone());
    }

    let limit = max_turns.saturating_mul(2);
    if kept.len() > limit {
        kept.drain(..kept.len() - limit);
    }

    kept
}

/// Content of the most recent user message, if any
#[must_use]
pub fn last_user_content(transcript: &[ChatMessage]) -> Option<&str> {
    transcript
        .iter()
        .rev()
        .find(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
}
