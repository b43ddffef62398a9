//! Error types for the murmur gateway

use thiserror::Error;

/// Result type alias for gateway operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the murmur gateway
///
/// Upstream-facing failures are deliberately not represented here; they are
/// normalized into [`crate::upstream::UpstreamError`] at the client boundary
/// and never escalate past the relay handlers.
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// HTTP server error (bind/serve failures)
    #[error("server error: {0}")]
    Server(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
