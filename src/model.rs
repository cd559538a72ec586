use std::fmt::{self, Display};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use tiktoken_rs::CoreBPE;

use crate::config::AppConfig;
use crate::ollama::OllamaClient;
use crate::openai::OpenAIClient;

static TOKENIZER: Lazy<Option<CoreBPE>> = Lazy::new(|| tiktoken_rs::cl100k_base().ok());

/// Sampling options for one model call.
///
/// Later retry attempts use tighter profiles (lower temperature, fewer
/// output tokens, more stop sequences) to push the model towards brevity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationProfile {
  pub temperature:    f32,
  pub max_tokens:     u32,
  pub context_window: u32,
  pub top_p:          f32,
  pub repeat_penalty: f32,
  pub stop:           Vec<String>
}

impl Default for GenerationProfile {
  fn default() -> Self {
    Self {
      temperature:    0.3,
      max_tokens:     40,
      context_window: 2048,
      top_p:          0.85,
      repeat_penalty: 1.2,
      stop:           vec!["\n".to_string()]
    }
  }
}

impl GenerationProfile {
  pub fn new(temperature: f32, max_tokens: u32, stop: &[&str]) -> Self {
    Self {
      temperature,
      max_tokens,
      stop: stop.iter().map(|s| s.to_string()).collect(),
      ..Default::default()
    }
  }

  pub fn with_context_window(mut self, context_window: u32) -> Self {
    self.context_window = context_window;
    self
  }
}

/// The seam between the generator and whatever runs inference.
#[async_trait]
pub trait ModelClient: Send + Sync {
  /// Returns the raw completion for `prompt`, or an error when the model
  /// could not be reached or answered with something unusable.
  async fn generate(&self, model: &str, prompt: &str, profile: &GenerationProfile) -> Result<String>;

  /// Whether `model` can be served right now.
  async fn is_available(&self, _model: &str) -> bool {
    true
  }

  fn name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
  #[default]
  Ollama,
  OpenAI
}

impl FromStr for Provider {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_lowercase().as_str() {
      "ollama" | "local" => Ok(Provider::Ollama),
      "openai" | "remote" => Ok(Provider::OpenAI),
      other => bail!("Invalid provider: {}", other)
    }
  }
}

impl Display for Provider {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Provider::Ollama => write!(f, "ollama"),
      Provider::OpenAI => write!(f, "openai")
    }
  }
}

/// Builds the client selected by the configuration.
pub fn client_for(config: &AppConfig) -> Result<Box<dyn ModelClient>> {
  match config.provider {
    Provider::Ollama => Ok(Box::new(OllamaClient::new(&config.ollama_host)?)),
    Provider::OpenAI => {
      let key = config
        .openai_api_key
        .clone()
        .filter(|key| !key.trim().is_empty())
        .context("OpenAI API key not found. Set COMMIT_AI_OPENAI_API_KEY or openai_api_key in the config file")?;
      Ok(Box::new(OpenAIClient::new(key)))
    }
  }
}

/// Counts tokens with the cl100k tokenizer, or estimates them when the
/// tokenizer is unavailable.
pub fn count_tokens(text: &str) -> usize {
  match TOKENIZER.as_ref() {
    Some(bpe) => bpe.encode_with_special_tokens(text).len(),
    None => estimate_tokens(text)
  }
}

/// Character based estimate, roughly 3.5 characters per token.
pub fn estimate_tokens(text: &str) -> usize {
  (text.chars().count() as f64 / 3.5).ceil() as usize
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_profile_builder() {
    let profile = GenerationProfile::new(0.1, 24, &["\n", ". "]).with_context_window(1536);
    assert_eq!(profile.max_tokens, 24);
    assert_eq!(profile.stop, vec!["\n".to_string(), ". ".to_string()]);
    assert_eq!(profile.context_window, 1536);
    assert_eq!(profile.top_p, 0.85);
  }

  #[test]
  fn test_provider_parsing() {
    assert_eq!("Ollama".parse::<Provider>().unwrap(), Provider::Ollama);
    assert_eq!("openai".parse::<Provider>().unwrap(), Provider::OpenAI);
    assert!("bard".parse::<Provider>().is_err());
    assert_eq!(Provider::OpenAI.to_string(), "openai");
  }

  #[test]
  fn test_token_counting() {
    assert_eq!(count_tokens(""), 0);
    assert!(count_tokens("fn main() { println!(\"hello\"); }") > 5);
    assert_eq!(estimate_tokens("abcdefg"), 2);
  }

  #[test]
  fn test_openai_requires_key() {
    let config = AppConfig { provider: Provider::OpenAI, openai_api_key: None, ..AppConfig::default() };
    assert!(client_for(&config).is_err());
  }
}
