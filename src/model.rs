//! Model collaborator: the `AskModel` capability and an OpenAI-compatible client.
//!
//! The engine only needs "send this prompt to that model, give me the text back".
//! `OpenAiClient` does that over chat.completions and logs model names, latencies and
//! token usage. API keys, prompts and replies are never logged.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, USER_AGENT};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, info, instrument};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 20;

const SYSTEM_PROMPT: &str = "你是一位耐心的算法竞赛教练，请严格按照用户给出的格式要求用中文回答。";

#[derive(Debug, Error)]
pub enum ModelError {
  #[error("no model client configured")]
  Disabled,
  #[error("transport error: {0}")]
  Transport(String),
  #[error("model HTTP {status}: {message}")]
  Http { status: u16, message: String },
  #[error("could not decode model response: {0}")]
  Decode(String),
  #[error("model returned an empty reply")]
  EmptyResponse,
}

/// Opaque text completion: `(model, prompt) -> reply`.
#[async_trait]
pub trait AskModel: Send + Sync {
  async fn ask(&self, model: &str, prompt: &str) -> Result<String, ModelError>;
}

#[derive(Clone)]
pub struct OpenAiClient {
  client: reqwest::Client,
  api_key: String,
  pub base_url: String,
  pub fast_model: String,
  pub strong_model: String,
}

impl OpenAiClient {
  /// Construct the client if we find OPENAI_API_KEY; otherwise return None.
  pub fn from_env() -> Option<Self> {
    let api_key = std::env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty())?;
    let base_url = std::env::var("OPENAI_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    let fast_model = std::env::var("OPENAI_FAST_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
    let strong_model = std::env::var("OPENAI_STRONG_MODEL").unwrap_or_else(|_| "gpt-4o".into());
    let timeout = std::env::var("OPENAI_TIMEOUT_SECS")
      .ok()
      .and_then(|v| v.trim().parse::<u64>().ok())
      .unwrap_or(DEFAULT_TIMEOUT_SECS);

    let client = match reqwest::Client::builder().timeout(Duration::from_secs(timeout)).build() {
      Ok(c) => c,
      Err(e) => {
        error!(target: "model", error = %e, "Failed to build HTTP client; model disabled");
        return None;
      }
    };

    Some(Self { client, api_key, base_url: base_url.trim_end_matches('/').to_string(), fast_model, strong_model })
  }
}

#[async_trait]
impl AskModel for OpenAiClient {
  #[instrument(level = "info", skip(self, prompt), fields(model = %model, prompt_len = prompt.len()))]
  async fn ask(&self, model: &str, prompt: &str) -> Result<String, ModelError> {
    let url = format!("{}/chat/completions", self.base_url);
    let req = ChatCompletionRequest {
      model: model.to_string(),
      messages: vec![
        ChatMessageReq { role: "system".into(), content: SYSTEM_PROMPT.into() },
        ChatMessageReq { role: "user".into(), content: prompt.into() },
      ],
      temperature: 0.3,
    };

    let start = Instant::now();
    let res = self.client.post(&url)
      .header(USER_AGENT, "qa-hint-engine/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
      .json(&req).send().await.map_err(|e| ModelError::Transport(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      let message = extract_api_error(&body).unwrap_or(body);
      return Err(ModelError::Http { status, message });
    }

    let body: ChatCompletionResponse = res.json().await.map_err(|e| ModelError::Decode(e.to_string()))?;
    if let Some(usage) = &body.usage {
      info!(target: "model", prompt_tokens = ?usage.prompt_tokens, completion_tokens = ?usage.completion_tokens, total_tokens = ?usage.total_tokens, "Model usage");
    }
    let text = body.choices.into_iter().next()
      .and_then(|c| c.message.content)
      .unwrap_or_default();

    info!(target: "model", elapsed = ?start.elapsed(), reply_len = text.len(), "Model reply received");
    if text.trim().is_empty() {
      return Err(ModelError::EmptyResponse);
    }
    Ok(text)
  }
}

#[derive(Serialize)]
struct ChatCompletionRequest {
  model: String,
  messages: Vec<ChatMessageReq>,
  temperature: f32,
}
#[derive(Serialize)]
struct ChatMessageReq { role: String, content: String }

#[derive(Deserialize)]
struct ChatCompletionResponse {
  choices: Vec<ChatChoice>,
  #[serde(default)] usage: Option<Usage>,
}
#[derive(Deserialize)]
struct ChatChoice { message: ChatMessageResp }
#[derive(Deserialize)]
struct ChatMessageResp { content: Option<String> }
#[derive(Deserialize)]
struct Usage {
  #[serde(default)] prompt_tokens: Option<u32>,
  #[serde(default)] completion_tokens: Option<u32>,
  #[serde(default)] total_tokens: Option<u32>,
}

/// Pull `error.message` out of an OpenAI-style error body.
fn extract_api_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct Wrap { error: Detail }
  #[derive(Deserialize)]
  struct Detail { message: String }
  serde_json::from_str::<Wrap>(body).ok().map(|w| w.error.message)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn api_error_message_is_extracted() {
    let body = r#"{"error":{"message":"Rate limit reached","type":"requests"}}"#;
    assert_eq!(extract_api_error(body).as_deref(), Some("Rate limit reached"));
    assert_eq!(extract_api_error("<html>bad gateway</html>"), None);
  }

  #[test]
  fn response_without_usage_decodes() {
    let body = r#"{"choices":[{"message":{"content":"提示：想想边界。"}}]}"#;
    let r: ChatCompletionResponse = serde_json::from_str(body).unwrap();
    assert!(r.usage.is_none());
    assert_eq!(r.choices[0].message.content.as_deref(), Some("提示：想想边界。"));
  }

  #[test]
  fn errors_render_readably() {
    let e = ModelError::Http { status: 429, message: "slow down".into() };
    assert_eq!(e.to_string(), "model HTTP 429: slow down");
    assert_eq!(ModelError::Disabled.to_string(), "no model client configured");
  }
}
