//! Murmur Gateway - browser voice chat with Groq-backed streaming replies
//!
//! This library provides the core functionality for the murmur gateway:
//! - Transcript sanitization (conversation memory trimming)
//! - Groq chat-completion relay, single-shot and streaming
//! - Canned-reply fallback when the upstream is unavailable
//! - The HTTP API and embedded browser voice UI
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                     Browser                          │
//! │   Web Speech STT  │  EventSource  │  Speech TTS     │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │                 Murmur Gateway                       │
//! │   Trim  │  Relay (/chat, /chat_stream)  │  Fallback │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │              Groq (chat completions)                 │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! Speech recognition and synthesis happen entirely in the browser; the
//! gateway only relays text.

pub mod api;
pub mod config;
pub mod error;
pub mod fallback;
pub mod transcript;
pub mod upstream;

pub use config::Config;
pub use error::{Error, Result};
pub use transcript::{trim, ChatMessage, Role};
pub use upstream::{ChatBackend, FragmentStream, GroqClient, UpstreamError};
