use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::Serialize;

use crate::config::{self, AppConfig};
use crate::models::{ChatMessage, Role};

pub const TUTOR_PERSONA: &str =
  "You are StudyBuddy AI, a friendly and patient tutor helping students learn.";

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
  #[error("OpenRouter API key is missing")]
  MissingKey,
  #[error("OpenRouter API key has an unexpected format")]
  InvalidKeyFormat,
  #[error("OpenRouter rejected the API key")]
  Unauthorized,
  #[error("OpenRouter rate limit exceeded")]
  RateLimited,
  #[error("could not connect to OpenRouter: {0}")]
  Connect(String),
  #[error("request to OpenRouter timed out")]
  Timeout,
  #[error("OpenRouter error ({status}): {message}")]
  Upstream {
    status: u16,
    message: String,
    model_error: bool,
  },
  #[error("malformed response from OpenRouter: {0}")]
  Malformed(String),
  #[error("empty response from the model")]
  Empty,
}

impl LlmError {
  pub fn is_model_error(&self) -> bool {
    matches!(self, LlmError::Upstream { model_error: true, .. })
  }

  pub fn user_message(&self) -> String {
    match self {
      LlmError::MissingKey => {
        "No OpenRouter API key is configured. Set OPENROUTER_API_KEY and try again.".to_string()
      }
      LlmError::InvalidKeyFormat | LlmError::Unauthorized => {
        "Authentication failed. Please check your OpenRouter API key.".to_string()
      }
      LlmError::RateLimited => {
        "Rate limit exceeded. Please wait a moment and try again.".to_string()
      }
      _ => "Something went wrong while talking to the AI. Please try again.".to_string(),
    }
  }
}

#[derive(Clone, Debug, Default)]
pub struct CompletionRequest {
  pub system: String,
  pub history: Vec<ChatMessage>,
  pub prompt: String,
}

impl CompletionRequest {
  pub fn new(prompt: impl Into<String>) -> Self {
    Self {
      system: TUTOR_PERSONA.to_string(),
      history: Vec::new(),
      prompt: prompt.into(),
    }
  }

  pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
    self.history = history;
    self
  }
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
  async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError>;
}

pub enum KeySource {
  Fixed(String),
  Ambient,
}

impl KeySource {
  fn resolve(&self) -> Option<String> {
    match self {
      KeySource::Fixed(key) if key.trim().is_empty() => None,
      KeySource::Fixed(key) => Some(key.trim().to_string()),
      KeySource::Ambient => config::resolve_api_key(),
    }
  }
}

pub struct OpenRouterClient {
  client: reqwest::Client,
  url: String,
  models: Vec<String>,
  temperature: f32,
  max_tokens: u32,
  key: KeySource,
}

impl OpenRouterClient {
  pub fn from_config(config: &AppConfig, key: KeySource) -> anyhow::Result<Self> {
    let client = reqwest::Client::builder()
      .timeout(Duration::from_secs(config.llm_timeout_secs))
      .build()?;
    Ok(Self {
      client,
      url: config.openrouter_url.clone(),
      models: models_to_try(&config.default_model, &config.fallback_models),
      temperature: config.temperature,
      max_tokens: config.max_tokens,
      key,
    })
  }

  async fn complete_with(
    &self,
    model: &str,
    key: &str,
    messages: &[OpenRouterMessage],
  ) -> Result<String, LlmError> {
    let mut headers = HeaderMap::new();
    headers.insert(
      AUTHORIZATION,
      HeaderValue::from_str(&format!("Bearer {}", key)).map_err(|_| LlmError::InvalidKeyFormat)?,
    );
    headers.insert("HTTP-Referer", HeaderValue::from_static("http://localhost"));
    headers.insert("X-Title", HeaderValue::from_static("StudyBuddy AI"));

    let payload = OpenRouterChatRequest {
      model,
      messages,
      temperature: self.temperature,
      max_tokens: self.max_tokens,
    };

    let resp = self
      .client
      .post(&self.url)
      .headers(headers)
      .json(&payload)
      .send()
      .await
      .map_err(|err| {
        if err.is_timeout() {
          LlmError::Timeout
        } else {
          LlmError::Connect(err.to_string())
        }
      })?;

    if !resp.status().is_success() {
      let status = resp.status().as_u16();
      let text = resp.text().await.unwrap_or_default();
      return Err(classify_failure(status, &text));
    }

    let json_body = resp
      .json::<serde_json::Value>()
      .await
      .map_err(|err| LlmError::Malformed(err.to_string()))?;
    let content = json_body["choices"][0]["message"]["content"]
      .as_str()
      .unwrap_or("");
    if content.trim().is_empty() {
      return Err(LlmError::Empty);
    }
    Ok(ensure_markdown_headings(content))
  }
}

#[async_trait]
impl LanguageModel for OpenRouterClient {
  async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmError> {
    let key = self.key.resolve().ok_or(LlmError::MissingKey)?;
    if !config::key_format_ok(&key) {
      return Err(LlmError::InvalidKeyFormat);
    }

    let messages = to_openrouter_messages(request);
    let mut last_error = LlmError::Empty;
    for (idx, model) in self.models.iter().enumerate() {
      match self.complete_with(model, &key, &messages).await {
        Ok(text) => return Ok(text),
        Err(err) if err.is_model_error() && idx + 1 < self.models.len() => last_error = err,
        Err(err) => return Err(err),
      }
    }
    Err(last_error)
  }
}

#[derive(Serialize, Debug, PartialEq)]
struct OpenRouterMessage {
  role: &'static str,
  content: String,
}

#[derive(Serialize)]
struct OpenRouterChatRequest<'a> {
  model: &'a str,
  messages: &'a [OpenRouterMessage],
  temperature: f32,
  max_tokens: u32,
}

fn to_openrouter_messages(request: &CompletionRequest) -> Vec<OpenRouterMessage> {
  let mut result = Vec::with_capacity(request.history.len() + 2);
  if !request.system.trim().is_empty() {
    result.push(OpenRouterMessage {
      role: "system",
      content: request.system.clone(),
    });
  }
  for msg in request.history.iter().filter(|m| !m.content.trim().is_empty()) {
    let role = match msg.role {
      Role::User => "user",
      Role::Assistant => "assistant",
    };
    result.push(OpenRouterMessage {
      role,
      content: msg.content.clone(),
    });
  }
  result.push(OpenRouterMessage {
    role: "user",
    content: request.prompt.clone(),
  });
  result
}

pub fn models_to_try(primary: &str, fallbacks: &[String]) -> Vec<String> {
  let mut models: Vec<String> = Vec::new();
  for model in std::iter::once(primary).chain(fallbacks.iter().map(String::as_str)) {
    let model = model.trim();
    if !model.is_empty() && !models.iter().any(|m| m == model) {
      models.push(model.to_string());
    }
  }
  models
}

fn classify_failure(status: u16, body: &str) -> LlmError {
  match status {
    401 => return LlmError::Unauthorized,
    429 => return LlmError::RateLimited,
    _ => {}
  }

  let message = serde_json::from_str::<serde_json::Value>(body)
    .ok()
    .and_then(|v| {
      v["error"]["message"]
        .as_str()
        .or_else(|| v["message"].as_str())
        .map(str::to_string)
    })
    .filter(|m| !m.trim().is_empty())
    .unwrap_or_else(|| body.to_string());

  let lower = message.to_lowercase();
  let model_error =
    lower.contains("model") && (lower.contains("not found") || lower.contains("invalid"));
  LlmError::Upstream {
    status,
    message,
    model_error,
  }
}

pub fn ensure_markdown_headings(text: &str) -> String {
  if text.is_empty() || text.trim_start().starts_with('#') {
    text.to_string()
  } else {
    format!("### Answer\n\n{text}")
  }
}
