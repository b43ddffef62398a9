//! Groq chat-completions client (OpenAI-compatible wire format)

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::transcript::ChatMessage;

use super::{ChatBackend, FragmentStream, KEY_PREFIX, UpstreamError};

const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

/// Bounded per-call budget so a stalled upstream falls back instead of
/// hanging the voice session
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_REPLY_TOKENS: u32 = 800;
const TEMPERATURE: f32 = 0.4;
const PROBE_MAX_TOKENS: u32 = 8;

/// How much of an upstream error body to keep in the error detail
const DETAIL_LIMIT: usize = 200;

/// Groq client
///
/// One bounded attempt per call, no retries: for voice chat a fast fallback
/// beats a late answer.
pub struct GroqClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
}

impl GroqClient {
    /// Create a new Groq client
    ///
    /// An empty or whitespace-only key is treated as absent.
    #[must_use]
    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Self {
        Self {
            client: build_http_client(),
            api_key: api_key
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty()),
            model: model.into(),
            base_url: GROQ_BASE_URL.to_string(),
        }
    }

    /// Set custom base URL (for API-compatible services)
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn key(&self) -> Result<&str, UpstreamError> {
        self.api_key.as_deref().ok_or(UpstreamError::NotConfigured)
    }

    async fn complete_with(
        &self,
        transcript: &[ChatMessage],
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, UpstreamError> {
        let key = self.key()?;

        let body = CompletionBody {
            model: &self.model,
            messages: transcript,
            max_tokens,
            temperature,
            stream: false,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(key)
            .json(&body)
            .send()
            .await
            .map_err(request_error)?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let data: CompletionResponse = response
            .json()
            .await
            .map_err(|e| UpstreamError::Malformed(e.to_string()))?;

        data.choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .ok_or_else(|| UpstreamError::Malformed("no completion content".to_string()))
    }
}

#[async_trait]
impl ChatBackend for GroqClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, transcript: &[ChatMessage]) -> Result<String, UpstreamError> {
        self.complete_with(transcript, MAX_REPLY_TOKENS, TEMPERATURE)
            .await
    }

    fn stream(&self, transcript: Vec<ChatMessage>) -> FragmentStream {
        let client = self.client.clone();
        let api_key = self.api_key.clone();
        let model = self.model.clone();
        let base_url = self.base_url.clone();

        Box::pin(async_stream::stream! {
            let Some(key) = api_key else {
                yield Err(UpstreamError::NotConfigured);
                return;
            };

            let body = serde_json::json!({
                "model": model,
                "messages": transcript,
                "max_tokens": MAX_REPLY_TOKENS,
                "temperature": TEMPERATURE,
                "stream": true,
            });

            let response = match client
                .post(format!("{base_url}/chat/completions"))
                .bearer_auth(&key)
                .json(&body)
                .send()
                .await
            {
                Ok(resp) => resp,
                Err(e) => {
                    yield Err(request_error(e));
                    return;
                }
            };

            if !response.status().is_success() {
                yield Err(status_error(response).await);
                return;
            }

            let mut bytes = response.bytes_stream();
            let mut buffer = String::new();

            while let Some(chunk) = bytes.next().await {
                let chunk = match chunk {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        yield Err(request_error(e));
                        return;
                    }
                };

                buffer.push_str(&String::from_utf8_lossy(&chunk));

                // Process complete SSE events from the buffer
                while let Some(pos) = buffer.find("\n\n") {
                    let event = buffer[..pos].to_string();
                    buffer.drain(..pos + 2);

                    for line in event.lines() {
                        let Some(data) = line.strip_prefix("data: ") else {
                            continue;
                        };
                        if data.trim() == "[DONE]" {
                            return;
                        }
                        let Ok(parsed) = serde_json::from_str::<StreamResponse>(data) else {
                            continue;
                        };
                        for choice in parsed.choices {
                            if let Some(content) = choice.delta.content {
                                if !content.is_empty() {
                                    yield Ok(content);
                                }
                            }
                        }
                    }
                }
            }
        })
    }

    async fn probe(&self) -> Result<(), UpstreamError> {
        let key = self.key()?;
        if !key.starts_with(KEY_PREFIX) {
            return Err(UpstreamError::KeyFormat);
        }

        let probe = [
            ChatMessage::system("You are a helpful assistant."),
            ChatMessage::user("Reply with OK."),
        ];
        self.complete_with(&probe, PROBE_MAX_TOKENS, 0.0)
            .await
            .map(|_| ())
    }
}

fn build_http_client() -> Client {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .expect("failed to build reqwest client")
}

fn request_error(e: reqwest::Error) -> UpstreamError {
    if e.is_timeout() {
        UpstreamError::Request("timed out waiting for upstream".to_string())
    } else {
        UpstreamError::Request(e.to_string())
    }
}

async fn status_error(response: reqwest::Response) -> UpstreamError {
    let status = response.status().as_u16();
    let mut detail = response.text().await.unwrap_or_default();
    if detail.len() > DETAIL_LIMIT {
        let mut end = DETAIL_LIMIT;
        while !detail.is_char_boundary(end) {
            end -= 1;
        }
        detail.truncate(end);
    }
    UpstreamError::Status { status, detail }
}

#[derive(Serialize)]
struct CompletionBody<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    max_tokens: u32,
    temperature: f32,
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

#[derive(Deserialize)]
struct StreamResponse {
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
}

#[derive(Deserialize)]
struct StreamDelta {
    content: Option<String>,
}
