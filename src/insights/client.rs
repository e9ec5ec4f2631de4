//! Reqwest-backed client for OpenAI compatible chat completion APIs.
//!
//! This client owns transport details only: request serialisation, timeout,
//! HTTP error mapping and decoding the first choice of the response.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

/// The chat completions endpoint used when none is configured.
pub const DEFAULT_COMPLETION_URL: &str = "https://api.mistral.ai/v1/chat/completions";
/// The model used when none is configured.
pub const DEFAULT_COMPLETION_MODEL: &str = "open-mistral-7b";
/// How long to wait for a completion before giving up.
pub const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_TOKENS: u32 = 150;
const TEMPERATURE: f64 = 0.7;

/// The ways a completion request can fail.
#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum InsightError {
    /// No API key was configured, so no request was sent.
    #[error("no completion API key configured")]
    MissingApiKey,

    /// The request did not complete in time.
    #[error("completion request timed out: {0}")]
    Timeout(String),

    /// The API key was rejected.
    #[error("completion API rejected the API key: {0}")]
    Unauthorized(String),

    /// Too many requests were sent.
    #[error("completion API rate limit exceeded: {0}")]
    RateLimited(String),

    /// The API responded with some other unsuccessful status.
    #[error("completion API responded with {0}")]
    Status(String),

    /// The request could not be sent or the response could not be read.
    #[error("could not reach completion API: {0}")]
    Transport(String),

    /// The response body was not a completion.
    #[error("malformed completion response: {0}")]
    Decode(String),
}

/// Something that can answer a prompt with generated text.
#[async_trait]
pub trait CompletionClient: Send + Sync {
    /// Generate a reply to `prompt`, following `system_prompt`.
    async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String, InsightError>;
}

/// A completion client that sends requests to an OpenAI compatible
/// chat completions endpoint, such as Mistral's.
pub struct ChatCompletionClient {
    client: Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl ChatCompletionClient {
    /// Build a client with an explicit request timeout.
    ///
    /// Without an `api_key` every request fails with [InsightError::MissingApiKey]
    /// and nothing is sent.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(
        endpoint: &str,
        model: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_owned(),
            model: model.to_owned(),
            api_key: api_key.filter(|key| !key.trim().is_empty()),
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    max_tokens: u32,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: String,
}

#[async_trait]
impl CompletionClient for ChatCompletionClient {
    async fn complete(&self, system_prompt: &str, prompt: &str) -> Result<String, InsightError> {
        let api_key = self.api_key.as_deref().ok_or(InsightError::MissingApiKey)?;

        let request = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system_prompt,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }

        parse_completion(body.as_ref())
    }
}

fn parse_completion(body: &[u8]) -> Result<String, InsightError> {
    let response: ChatResponse = serde_json::from_slice(body)
        .map_err(|error| InsightError::Decode(format!("invalid JSON payload: {error}")))?;

    let content = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.trim().to_owned())
        .ok_or_else(|| InsightError::Decode("response has no choices".to_owned()))?;

    if content.is_empty() {
        return Err(InsightError::Decode("completion is empty".to_owned()));
    }

    Ok(content)
}

fn map_transport_error(error: reqwest::Error) -> InsightError {
    if error.is_timeout() {
        InsightError::Timeout(error.to_string())
    } else {
        InsightError::Transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> InsightError {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let preview: String = String::from_utf8_lossy(body)
        .chars()
        .take(PREVIEW_CHAR_LIMIT)
        .collect();
    let message = format!("status {}: {}", status.as_u16(), preview.trim());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => InsightError::Unauthorized(message),
        StatusCode::TOO_MANY_REQUESTS => InsightError::RateLimited(message),
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => {
            InsightError::Timeout(message)
        }
        _ => InsightError::Status(message),
    }
}
