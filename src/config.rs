use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

pub const API_KEY_VAR: &str = "OPENROUTER_API_KEY";
const KEYRING_SERVICE: &str = "StudyBuddy";
const KEYRING_USER: &str = "openrouter";

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct AppConfig {
  pub listen_addr: String,
  pub default_model: String,
  pub fallback_models: Vec<String>,
  pub openrouter_url: String,
  pub temperature: f32,
  pub max_tokens: u32,
  pub llm_timeout_secs: u64,
  pub context_messages: usize,
  pub wikipedia_base_url: String,
  pub image_lookup_timeout_secs: u64,
  pub image_limit: usize,
  pub min_word_len: usize,
  pub search_fallback_titles: usize,
  pub tesseract_cmd: String,
  pub max_sessions: usize,
  pub session_idle_secs: u64,
}

impl Default for AppConfig {
  fn default() -> Self {
    Self {
      listen_addr: "127.0.0.1:8501".to_string(),
      default_model: "xiaomi/mimo-v2-flash:free".to_string(),
      fallback_models: vec![
        "xiaomi/mimo-v2-flash:free".to_string(),
        "mistralai/devstral-2-2512:free".to_string(),
        "tngtech/deepseek-r1t2-chimera:free".to_string(),
      ],
      openrouter_url: "https://openrouter.ai/api/v1/chat/completions".to_string(),
      temperature: 0.5,
      max_tokens: 700,
      llm_timeout_secs: 60,
      context_messages: 6,
      wikipedia_base_url: "https://en.wikipedia.org".to_string(),
      image_lookup_timeout_secs: 10,
      image_limit: 3,
      min_word_len: 3,
      search_fallback_titles: 5,
      tesseract_cmd: "tesseract".to_string(),
      max_sessions: 500,
      session_idle_secs: 6 * 60 * 60,
    }
  }
}

impl AppConfig {
  fn apply_env_overrides(&mut self) {
    if let Ok(cmd) = std::env::var("TESSERACT_CMD") {
      if !cmd.trim().is_empty() {
        self.tesseract_cmd = cmd.trim().to_string();
      }
    }
  }
}

pub fn data_dir() -> PathBuf {
  std::env::var("STUDYBUDDY_DATA_DIR")
    .ok()
    .filter(|dir| !dir.trim().is_empty())
    .map(PathBuf::from)
    .unwrap_or_else(|| PathBuf::from("data"))
}

pub fn load_or_init(path: &Path) -> anyhow::Result<AppConfig> {
  let mut config = if path.exists() {
    let data = std::fs::read_to_string(path)
      .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| format!("parsing {}", path.display()))?
  } else {
    let config = AppConfig::default();
    save_config(path, &config)?;
    config
  };
  config.apply_env_overrides();
  Ok(config)
}

pub fn save_config(path: &Path, config: &AppConfig) -> anyhow::Result<()> {
  let json = serde_json::to_string_pretty(config)?;
  std::fs::write(path, json)?;
  Ok(())
}

pub fn load_env_files(data_dir: &Path) {
  let _ = dotenv::from_path(".env");
  let _ = dotenv::from_path(data_dir.join(".env"));
}

pub fn resolve_api_key() -> Option<String> {
  if let Ok(key) = std::env::var(API_KEY_VAR) {
    if !key.trim().is_empty() {
      return Some(key.trim().to_string());
    }
  }

  keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER)
    .and_then(|e| e.get_password())
    .ok()
    .map(|key| key.trim().to_string())
    .filter(|key| !key.is_empty())
}

pub fn store_api_key(key: &str) -> anyhow::Result<()> {
  let entry = keyring::Entry::new(KEYRING_SERVICE, KEYRING_USER)?;
  entry.set_password(key.trim())?;
  Ok(())
}

pub fn has_api_key() -> bool {
  resolve_api_key().is_some()
}

pub fn key_format_ok(key: &str) -> bool {
  key.trim().starts_with("sk-")
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn creates_default_config_when_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let config = load_or_init(&path).unwrap();
    assert!(path.exists());
    assert_eq!(config.image_limit, 3);
    assert_eq!(config.image_lookup_timeout_secs, 10);
    assert_eq!(config.min_word_len, 3);
    assert_eq!(config.max_sessions, 500);
  }

  #[test]
  fn partial_config_keeps_defaults_for_missing_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let partial = r#"{ "image_limit": 2, "default_model": "openai/gpt-4o-mini" }"#;
    std::fs::write(&path, partial).unwrap();

    let config = load_or_init(&path).unwrap();
    assert_eq!(config.image_limit, 2);
    assert_eq!(config.default_model, "openai/gpt-4o-mini");
    assert_eq!(config.max_tokens, 700);
    assert_eq!(config.wikipedia_base_url, "https://en.wikipedia.org");
  }

  #[test]
  fn malformed_config_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    std::fs::write(&path, "{ not json").unwrap();
    assert!(load_or_init(&path).is_err());
  }

  #[test]
  fn save_then_load_preserves_values() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.json");
    let mut config = AppConfig::default();
    config.listen_addr = "0.0.0.0:9000".to_string();
    save_config(&path, &config).unwrap();
    assert_eq!(load_or_init(&path).unwrap().listen_addr, "0.0.0.0:9000");
  }

  #[test]
  fn key_format_requires_sk_prefix() {
    assert!(key_format_ok("sk-or-v1-abc"));
    assert!(key_format_ok("  sk-abc  "));
    assert!(!key_format_ok("or-v1-abc"));
    assert!(!key_format_ok(""));
  }
}
