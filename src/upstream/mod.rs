//! Upstream chat-completion client boundary
//!
//! Every upstream-facing failure is normalized into [`UpstreamError`] here.
//! The relay treats any error from this module as "unavailable" and degrades
//! to canned replies; raw transport errors never reach the caller.

mod groq;

pub use groq::GroqClient;

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;
use thiserror::Error;

use crate::transcript::ChatMessage;

/// Groq API keys are issued with this prefix
pub const KEY_PREFIX: &str = "gsk_";

/// Why the upstream could not produce a reply
#[derive(Debug, Error)]
pub enum UpstreamError {
    /// No API key configured. A supported mode, not a fault: the gateway
    /// runs on canned replies until a key is provided.
    #[error("no API key configured (fallback mode)")]
    NotConfigured,

    /// API key is present but does not look like a valid key
    #[error("API key format looks invalid (expected \"{KEY_PREFIX}\" prefix)")]
    KeyFormat,

    /// Network-level failure: connect error, timeout, mid-stream drop
    #[error("request failed: {0}")]
    Request(String),

    /// Upstream answered with a non-success status
    #[error("upstream returned HTTP {status}: {detail}")]
    Status {
        status: u16,
        detail: String,
    },

    /// Upstream answered with a body we could not interpret
    #[error("malformed upstream response: {0}")]
    Malformed(String),
}

/// Incremental reply fragments in arrival order
///
/// Finite and non-restartable: the stream ends when the upstream signals
/// completion or at the first error item. Dropping it cancels the upstream
/// read.
pub type FragmentStream = Pin<Box<dyn Stream<Item = Result<String, UpstreamError>> + Send>>;

/// A chat-completion backend
///
/// `GroqClient` is the production implementation; tests script their own.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Model identifier this backend targets
    fn model(&self) -> &str;

    /// Request a full completion for the transcript
    async fn complete(&self, transcript: &[ChatMessage]) -> Result<String, UpstreamError>;

    /// Request a streaming completion for the transcript
    fn stream(&self, transcript: Vec<ChatMessage>) -> FragmentStream;

    /// Minimal reachability check for health reporting
    ///
    /// Checks credentials without I/O first, then attempts the cheapest
    /// possible upstream call. Never panics; the error is the reason.
    async fn probe(&self) -> Result<(), UpstreamError>;
}
