//! Minimal OpenAI client: one chat.completions call, nothing else.
//!
//! The client only moves the envelope over the wire. Interpreting the reply
//! (choices, content, question JSON) is the quiz pipeline's job.
//!
//! NOTE: We never log the API key and we keep payload truncations short to avoid PII leaks.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, instrument};

use crate::config::UpstreamConfig;

#[derive(Error, Debug)]
pub enum ChatError {
  #[error("transport error: {0}")]
  Transport(#[from] reqwest::Error),

  #[error("OpenAI HTTP {status}: {message}")]
  Status { status: u16, message: String },
}

/// Anything that can answer a chat-completion request.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
  async fn complete(&self, req: &ChatCompletionRequest) -> Result<ChatCompletionResponse, ChatError>;
}

#[derive(Clone)]
pub struct OpenAI {
  client: reqwest::Client,
  api_key: String,
  pub base_url: String,
}

impl OpenAI {
  pub fn new(cfg: &UpstreamConfig) -> Result<Self, reqwest::Error> {
    let client = reqwest::Client::builder()
      .timeout(cfg.timeout)
      .build()?;

    Ok(Self { client, api_key: cfg.api_key.clone(), base_url: cfg.base_url.clone() })
  }
}

#[async_trait]
impl ChatCompletion for OpenAI {
  #[instrument(level = "info", skip(self, req), fields(model = %req.model, messages = req.messages.len()))]
  async fn complete(&self, req: &ChatCompletionRequest) -> Result<ChatCompletionResponse, ChatError> {
    let url = format!("{}/chat/completions", self.base_url);
    let start = std::time::Instant::now();

    let res = self.client.post(&url)
      .header(USER_AGENT, "pdf-quiz-backend/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(req).send().await?;

    if !res.status().is_success() {
      let status = res.status();
      let body = res.text().await.unwrap_or_default();
      let message = extract_openai_error(&body).unwrap_or(body);
      return Err(ChatError::Status { status: status.as_u16(), message });
    }

    let body: ChatCompletionResponse = res.json().await?;
    let elapsed = start.elapsed();
    if let Some(usage) = &body.usage {
      info!(?elapsed, prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "OpenAI usage");
    } else {
      info!(?elapsed, choices = body.choices.len(), "OpenAI response received");
    }
    Ok(body)
  }
}

// --- Chat DTOs ---

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ChatCompletionRequest {
  pub model: String,
  pub messages: Vec<ChatMessageReq>,
  pub temperature: f32,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessageReq { pub role: String, pub content: String }

impl ChatMessageReq {
  pub fn system(content: impl Into<String>) -> Self { Self { role: "system".into(), content: content.into() } }
  pub fn user(content: impl Into<String>) -> Self { Self { role: "user".into(), content: content.into() } }
}

/// Envelope as returned by the service. A missing `choices` key reads as empty.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChatCompletionResponse {
  #[serde(default)] pub choices: Vec<ChatChoice>,
  #[serde(default, skip_serializing_if = "Option::is_none")] pub usage: Option<Usage>,
}
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChatChoice { #[serde(default)] pub message: Option<ChatMessageResp> }
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ChatMessageResp { #[serde(default)] pub content: Option<String> }
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Usage {
  #[serde(default)] pub prompt_tokens: Option<u32>,
  #[serde(default)] pub completion_tokens: Option<u32>,
  #[serde(default)] pub total_tokens: Option<u32>,
}

impl ChatCompletionResponse {
  /// Envelope with a single choice carrying `content`.
  #[cfg(test)]
  pub fn with_content(content: impl Into<String>) -> Self {
    Self {
      choices: vec![ChatChoice { message: Some(ChatMessageResp { content: Some(content.into()) }) }],
      usage: None,
    }
  }

  /// Content of the first choice, if there is one.
  pub fn first_content(&self) -> Option<&str> {
    self.choices.first()?.message.as_ref()?.content.as_deref()
  }
}

/// Try to extract a clean error message from OpenAI error body.
fn extract_openai_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  match serde_json::from_str::<EWrap>(body) {
    Ok(w) => Some(w.error.message),
    Err(_) => None,
  }
}
