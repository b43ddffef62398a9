//! Shared test utilities

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use murmur_gateway::api::{chat, health, ApiState};
use murmur_gateway::{ChatBackend, ChatMessage, FragmentStream, UpstreamError};

/// Scripted reply for the mock backend
#[derive(Debug, Clone)]
pub enum MockReply {
    /// Complete successfully with this text; streaming yields it as the
    /// listed fragments
    Fragments(Vec<String>),
    /// Fail immediately as unavailable
    Unavailable,
    /// Stream these fragments, then fail mid-stream
    FailAfter(Vec<String>),
}

/// Deterministic scripted chat backend
pub struct MockBackend {
    pub reply: MockReply,
}

impl MockBackend {
    pub fn text(reply: &str) -> Self {
        Self {
            reply: MockReply::Fragments(vec![reply.to_string()]),
        }
    }

    pub fn fragments(fragments: &[&str]) -> Self {
        Self {
            reply: MockReply::Fragments(fragments.iter().map(ToString::to_string).collect()),
        }
    }

    pub fn unavailable() -> Self {
        Self {
            reply: MockReply::Unavailable,
        }
    }

    pub fn fail_after(fragments: &[&str]) -> Self {
        Self {
            reply: MockReply::FailAfter(fragments.iter().map(ToString::to_string).collect()),
        }
    }
}

fn down() -> UpstreamError {
    UpstreamError::Request("mock upstream down".to_string())
}

#[async_trait]
impl ChatBackend for MockBackend {
    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, _transcript: &[ChatMessage]) -> Result<String, UpstreamError> {
        match &self.reply {
            MockReply::Fragments(fragments) => Ok(fragments.concat()),
            MockReply::Unavailable | MockReply::FailAfter(_) => Err(down()),
        }
    }

    fn stream(&self, _transcript: Vec<ChatMessage>) -> FragmentStream {
        let items: Vec<Result<String, UpstreamError>> = match &self.reply {
            MockReply::Fragments(fragments) => fragments.iter().cloned().map(Ok).collect(),
            MockReply::Unavailable => vec![Err(down())],
            MockReply::FailAfter(fragments) => fragments
                .iter()
                .cloned()
                .map(Ok)
                .chain(std::iter::once(Err(down())))
                .collect(),
        };
        Box::pin(futures::stream::iter(items))
    }

    async fn probe(&self) -> Result<(), UpstreamError> {
        match &self.reply {
            MockReply::Fragments(_) => Ok(()),
            MockReply::Unavailable | MockReply::FailAfter(_) => Err(down()),
        }
    }
}

/// Build a test router around the given backend
pub fn build_test_router(backend: Arc<dyn ChatBackend>) -> Router {
    let state = Arc::new(ApiState {
        backend,
        max_turns: 10,
        system_prompt: "You are a test assistant.".to_string(),
    });

    Router::new()
        .merge(chat::router(state.clone()))
        .merge(health::router())
        .merge(health::upstream_router(state))
}
