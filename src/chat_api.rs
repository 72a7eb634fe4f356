use crate::store::Message;
use log::debug;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com";
pub const MODEL_OPTIONS: [&str; 3] = ["gpt-4o-mini", "gpt-4o", "gpt-4.1-mini"];

#[derive(Clone, Debug)]
pub struct ChatConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 1024,
        }
    }
}

impl ChatConfig {
    /// The credential is read once at startup; a missing key is not treated
    /// specially here and surfaces as an HTTP error at request time.
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            api_key: std::env::var("OPENAI_API_KEY").unwrap_or_default(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("malformed response body: {0}")]
    Malformed(String),
    #[error("response contained no choices")]
    Empty,
}

impl ChatError {
    /// Coarse failure class for the status line.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::Transport(_) => "network",
            ChatError::Status { .. } => "http",
            ChatError::Malformed(_) => "malformed",
            ChatError::Empty => "empty",
        }
    }
}

/// Prefixes the history with one system-role message when the instruction
/// is non-blank.
pub fn build_request_messages(system: &str, history: &[Message]) -> Vec<Message> {
    let mut messages = Vec::with_capacity(history.len() + 1);
    if !system.trim().is_empty() {
        messages.push(Message::new("system", system));
    }
    messages.extend_from_slice(history);
    messages
}

pub struct ChatClient {
    client: reqwest::Client,
    config: ChatConfig,
}

impl ChatClient {
    pub fn new(config: ChatConfig) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder().build()?;
        Ok(Self { client, config })
    }

    /// One request, one response. No retry, no streaming.
    pub async fn complete(&self, messages: Vec<Message>) -> Result<Message, ChatError> {
        let req = ChatCompletionsRequest {
            model: &self.config.model,
            messages: &messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };
        debug!(
            "requesting completion from {} ({} message(s), model {})",
            self.config.base_url,
            messages.len(),
            self.config.model
        );

        let resp = self
            .client
            .post(self.url("/v1/chat/completions"))
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, format!("Bearer {}", self.config.api_key))
            .json(&req)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ChatError::Status { status, body });
        }

        let body = resp.text().await?;
        let parsed: ChatCompletionsResponse =
            serde_json::from_str(&body).map_err(|err| ChatError::Malformed(err.to_string()))?;

        let content = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ChatError::Empty)?;

        Ok(Message::new("assistant", content))
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Serialize, Debug)]
struct ChatCompletionsRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize, Debug)]
struct ChatCompletionsResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Deserialize, Debug)]
struct AssistantMessage {
    content: Option<String>,
}
