//! Chat relay endpoints: single-shot JSON and SSE streaming
//!
//! Both endpoints are stateless across requests; the browser sends its
//! transcript (or just the latest utterance) each time. Upstream failures
//! degrade to canned replies, never to error statuses.

use std::convert::Infallible;
use std::sync::Arc;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::routing::{get, post};
use axum::{Json, Router};
use futures::{Stream, StreamExt};
use serde::{Deserialize, Serialize};

use crate::fallback;
use crate::transcript::{self, ChatMessage};

use super::ApiState;

/// End-of-stream marker, mirrored by the browser `EventSource` handler
const DONE_MARKER: &str = "[DONE]";

/// Longest accepted user utterance
const MAX_MESSAGE_CHARS: usize = 1000;

const TOO_LONG_REPLY: &str =
    "Your message is too long. Please keep it under 1000 characters.";

/// Flush a pending fragment past this length at the next word boundary
const FLUSH_LEN: usize = 48;

/// Build the chat router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/chat", post(chat))
        .route("/chat_stream", get(chat_stream_get).post(chat_stream_post))
        .with_state(state)
}

/// Chat request: either a bare message or a full transcript
///
/// When both are present the message is appended as the newest user turn.
#[derive(Debug, Default, Deserialize)]
pub struct ChatRequest {
    /// Latest user utterance
    #[serde(default, alias = "text")]
    pub message: Option<String>,

    /// Full conversation history held by the browser
    #[serde(default)]
    pub transcript: Option<Vec<ChatMessage>>,
}

impl ChatRequest {
    fn into_transcript(self) -> Vec<ChatMessage> {
        let mut transcript = self.transcript.unwrap_or_default();
        if let Some(message) = self.message {
            transcript.push(ChatMessage::user(message));
        }
        transcript
    }
}

/// Single-shot chat response
#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub reply: String,
}

/// One streamed reply fragment
#[derive(Debug, Serialize)]
struct Fragment<'a> {
    fragment: &'a str,
}

/// Single-shot relay: trim, attempt upstream, fall back on any failure
async fn chat(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ChatRequest>,
) -> Json<ChatResponse> {
    let transcript = transcript::trim(&request.into_transcript(), state.max_turns);

    let reply = if transcript.is_empty() {
        fallback::reply(&transcript)
    } else if overlong(&transcript) {
        TOO_LONG_REPLY.to_string()
    } else {
        let upstream_input = with_system_prompt(&state.system_prompt, &transcript);
        match state.backend.complete(&upstream_input).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(error = %e, "upstream unavailable, using fallback");
                fallback::reply(&transcript)
            }
        }
    };

    Json(ChatResponse { reply })
}

#[derive(Debug, Deserialize)]
struct StreamQuery {
    /// Latest user utterance (`?q=` as the browser sends it)
    #[serde(default)]
    q: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

async fn chat_stream_get(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let message = query.q.or(query.message).unwrap_or_default();
    let transcript = if message.trim().is_empty() {
        Vec::new()
    } else {
        vec![ChatMessage::user(message)]
    };
    stream_response(state, transcript)
}

async fn chat_stream_post(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<ChatRequest>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    stream_response(state, request.into_transcript())
}

/// Streaming relay
///
/// Fragments are delivered in arrival order, regrouped at natural break
/// points for speech pacing. On upstream failure at any point the full
/// fallback text goes out as one terminal fragment. The `[DONE]` marker is
/// always the final event; a disconnecting client simply drops the stream,
/// which cancels the upstream read.
fn stream_response(
    state: Arc<ApiState>,
    transcript: Vec<ChatMessage>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let transcript = transcript::trim(&transcript, state.max_turns);

    let stream = async_stream::stream! {
        if transcript.is_empty() {
            yield fragment_event(&fallback::reply(&transcript));
            yield done_event();
            return;
        }
        if overlong(&transcript) {
            yield fragment_event(TOO_LONG_REPLY);
            yield done_event();
            return;
        }

        let upstream_input = with_system_prompt(&state.system_prompt, &transcript);
        let mut fragments = state.backend.stream(upstream_input);
        let mut buffer = FragmentBuffer::new();
        let mut delivered = false;

        while let Some(item) = fragments.next().await {
            match item {
                Ok(delta) => {
                    if let Some(fragment) = buffer.push(&delta) {
                        delivered = true;
                        yield fragment_event(&fragment);
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "upstream stream failed, using fallback");
                    yield fragment_event(&fallback::reply(&transcript));
                    yield done_event();
                    return;
                }
            }
        }

        if let Some(rest) = buffer.finish() {
            delivered = true;
            yield fragment_event(&rest);
        }
        if !delivered {
            // Upstream completed without producing any text
            yield fragment_event(&fallback::reply(&transcript));
        }
        yield done_event();
    };

    Sse::new(stream).keep_alive(KeepAlive::default())
}

fn overlong(transcript: &[ChatMessage]) -> bool {
    transcript::last_user_content(transcript)
        .is_some_and(|text| text.chars().count() > MAX_MESSAGE_CHARS)
}

fn with_system_prompt(prompt: &str, transcript: &[ChatMessage]) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(transcript.len() + 1);
    messages.push(ChatMessage::system(prompt));
    messages.extend_from_slice(transcript);
    messages
}

fn fragment_event(text: &str) -> Result<Event, Infallible> {
    let event = Event::default()
        .json_data(Fragment { fragment: text })
        .unwrap_or_else(|_| Event::default().data(text));
    Ok(event)
}

fn done_event() -> Result<Event, Infallible> {
    Ok(Event::default().data(DONE_MARKER))
}

/// Groups streamed deltas into speech-paced fragments
///
/// A fragment is flushed when it ends a sentence, or at the last word
/// boundary once it grows past [`FLUSH_LEN`]. Concatenating the flushed
/// fragments (plus [`FragmentBuffer::finish`]) reproduces the upstream text
/// exactly; the grouping is a pacing heuristic for downstream speech
/// synthesis, not a content transformation.
#[derive(Debug, Default)]
struct FragmentBuffer {
    pending: String,
}

impl FragmentBuffer {
    fn new() -> Self {
        Self::default()
    }

    /// Absorb a delta; returns a fragment when a break point is reached
    fn push(&mut self, delta: &str) -> Option<String> {
        self.pending.push_str(delta);
        self.split_point().map(|at| {
            let rest = self.pending.split_off(at);
            std::mem::replace(&mut self.pending, rest)
        })
    }

    /// Whatever remains once the upstream is done
    fn finish(self) -> Option<String> {
        if self.pending.trim().is_empty() {
            None
        } else {
            Some(self.pending)
        }
    }

    fn split_point(&self) -> Option<usize> {
        // Prefer the last sentence boundary: terminator followed by
        // whitespace. Requiring the whitespace keeps decimals like "3.5"
        // intact.
        let mut sentence_end = None;
        let mut prev: Option<char> = None;
        for (i, c) in self.pending.char_indices() {
            if let Some(p) = prev {
                if matches!(p, '.' | '!' | '?') && c.is_whitespace() {
                    sentence_end = Some(i + c.len_utf8());
                }
            }
            prev = Some(c);
        }
        if sentence_end.is_some() {
            return sentence_end;
        }

        if self.pending.len() <= FLUSH_LEN {
            return None;
        }
        // Past the length threshold: cut after the last space so a partial
        // word keeps accumulating.
        match self.pending.rfind(' ') {
            Some(at) => Some(at + 1),
            None => Some(self.pending.len()),
        }
    }
}
