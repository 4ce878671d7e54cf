// src/services/completion.rs
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::Config;

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("No API key provided. Set OPENAI_API_KEY in the environment or a .env file.")]
    MissingApiKey,
    #[error("{}", error_chain(.0))]
    Http(#[from] reqwest::Error),
    #[error("{message}")]
    Api { status: StatusCode, message: String },
    #[error("completion response contained no choices")]
    NoChoices,
    #[error("completion response contained no message content")]
    EmptyContent,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    #[serde(default)]
    pub content: Option<String>,
}

impl ChatMessage {
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self { role, content: Some(content.into()) }
    }
}

#[derive(Debug, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Something that turns one user message into one generated reply.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, message: &str) -> Result<String, CompletionError>;
}

/// Client for an OpenAI-compatible `/chat/completions` endpoint.
#[derive(Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    api_key: Option<String>,
    model: String,
    api_base: String,
    system_prompt: Option<String>,
}

impl std::fmt::Debug for OpenAiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenAiClient")
            .field("model", &self.model)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl OpenAiClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_key: config.openai_api_key.clone(),
            model: config.model.clone(),
            api_base: config.api_base.clone(),
            system_prompt: config.system_prompt.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn build_request(&self, message: &str) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(prompt) = &self.system_prompt {
            messages.push(ChatMessage::new(MessageRole::System, prompt.as_str()));
        }
        messages.push(ChatMessage::new(MessageRole::User, message));

        ChatCompletionRequest { model: self.model.clone(), messages }
    }
}

#[async_trait]
impl CompletionService for OpenAiClient {
    async fn complete(&self, message: &str) -> Result<String, CompletionError> {
        let api_key = self.api_key.as_deref().ok_or(CompletionError::MissingApiKey)?;
        let url = format!("{}/chat/completions", self.api_base);

        let resp = self
            .http
            .post(&url)
            .bearer_auth(api_key)
            .json(&self.build_request(message))
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(api_error(status, &body));
        }

        let completion: ChatCompletionResponse = resp.json().await?;
        let reply = first_reply(completion)?;
        debug!(model = %self.model, reply_len = reply.len(), "completion received");
        Ok(reply)
    }
}

fn first_reply(completion: ChatCompletionResponse) -> Result<String, CompletionError> {
    completion
        .choices
        .into_iter()
        .next()
        .ok_or(CompletionError::NoChoices)?
        .message
        .content
        .ok_or(CompletionError::EmptyContent)
}

// "error decoding response body" alone hides the serde cause.
fn error_chain(err: &reqwest::Error) -> String {
    let mut out = err.to_string();
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

// Prefer the provider's own message; fall back to the status line.
fn api_error(status: StatusCode, body: &str) -> CompletionError {
    let message = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| status.to_string());
    CompletionError::Api { status, message }
}
