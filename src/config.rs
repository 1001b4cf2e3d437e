//! Process configuration: environment variables resolved once at startup, plus
//! optional prompt overrides from a TOML file.
//!
//! See `AppConfig::from_env` for the variables and their defaults, and `QuizConfig`
//! for the TOML schema.

use std::{str::FromStr, time::Duration};

use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

pub const DEFAULT_PORT: u16 = 5000;
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_CONCURRENT_GENERATIONS: usize = 8;
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

#[derive(Error, Debug)]
pub enum ConfigError {
  #[error("OPENAI_API_KEY is not set; quiz generation cannot authenticate")]
  MissingApiKey,
}

/// Settings for the chat-completion upstream.
#[derive(Clone)]
pub struct UpstreamConfig {
  pub api_key: String,
  pub base_url: String,
  pub model: String,
  pub temperature: f32,
  pub timeout: Duration,
  pub max_concurrent: usize,
}

// Hand-written so the key never ends up in a log line.
impl std::fmt::Debug for UpstreamConfig {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("UpstreamConfig")
      .field("api_key", &"<redacted>")
      .field("base_url", &self.base_url)
      .field("model", &self.model)
      .field("temperature", &self.temperature)
      .field("timeout", &self.timeout)
      .field("max_concurrent", &self.max_concurrent)
      .finish()
  }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
  pub port: u16,
  pub max_upload_bytes: usize,
  pub upstream: UpstreamConfig,
  pub prompts: Prompts,
}

/// Optional TOML file pointed to by QUIZ_CONFIG_PATH.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct QuizConfig {
  #[serde(default)]
  pub prompts: Prompts,
}

/// Prompts sent to the model. `user_template` must contain `{text}`, which is
/// replaced by the (already truncated) document text.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Prompts {
  pub system: String,
  pub user_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      system: "You generate quiz questions.".into(),
      user_template: "Create 3 multiple-choice questions based on this text:\n\n{text}\n\nFormat: JSON [{\"question\": \"...\", \"options\": [\"A\", \"B\", \"C\", \"D\"], \"correctAnswer\": \"A\"}]".into(),
    }
  }
}

impl AppConfig {
  /// Resolve configuration from the process environment.
  pub fn from_env() -> Result<Self, ConfigError> {
    let prompts = load_quiz_config_from_env().map(|c| c.prompts).unwrap_or_default();
    Self::from_lookup(|k| std::env::var(k).ok(), prompts)
  }

  /// Same as `from_env`, over an arbitrary key lookup.
  pub fn from_lookup<F>(lookup: F, prompts: Prompts) -> Result<Self, ConfigError>
  where
    F: Fn(&str) -> Option<String>,
  {
    let api_key = lookup("OPENAI_API_KEY")
      .map(|k| k.trim().to_string())
      .filter(|k| !k.is_empty())
      .ok_or(ConfigError::MissingApiKey)?;

    let upstream = UpstreamConfig {
      api_key,
      base_url: lookup("OPENAI_BASE_URL")
        .map(|u| u.trim_end_matches('/').to_string())
        .unwrap_or_else(|| DEFAULT_BASE_URL.into()),
      model: lookup("OPENAI_MODEL").unwrap_or_else(|| DEFAULT_MODEL.into()),
      temperature: parse_var(&lookup, "OPENAI_TEMPERATURE").unwrap_or(DEFAULT_TEMPERATURE),
      timeout: Duration::from_secs(parse_var(&lookup, "OPENAI_TIMEOUT_SECS").unwrap_or(DEFAULT_TIMEOUT_SECS)),
      max_concurrent: parse_var(&lookup, "MAX_CONCURRENT_GENERATIONS")
        .filter(|n: &usize| *n > 0)
        .unwrap_or(DEFAULT_MAX_CONCURRENT_GENERATIONS),
    };

    Ok(Self {
      port: parse_var(&lookup, "PORT").unwrap_or(DEFAULT_PORT),
      max_upload_bytes: parse_var(&lookup, "MAX_UPLOAD_BYTES").unwrap_or(DEFAULT_MAX_UPLOAD_BYTES),
      upstream,
      prompts,
    })
  }
}

/// Unset or unparsable values read as None so the caller falls back to its default.
fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
  lookup(key).and_then(|v| v.trim().parse().ok())
}

/// Attempt to load `QuizConfig` from QUIZ_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_quiz_config_from_env() -> Option<QuizConfig> {
  let path = std::env::var("QUIZ_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<QuizConfig>(&s) {
      Ok(cfg) => {
        info!(target: "pdf_quiz_backend", %path, "Loaded quiz config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "pdf_quiz_backend", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "pdf_quiz_backend", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}
