use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, FileFormat};
use serde::{Deserialize, Serialize};

use crate::generation::heuristic::MIN_MESSAGE_LENGTH;
use crate::generation::scoring::Thresholds;
use crate::model::{GenerationProfile, Provider};
use crate::prompt::Language;

// Defaults
const DEFAULT_OLLAMA_HOST: &str = "http://localhost:11434";
const DEFAULT_PRIMARY_MODEL: &str = "phi3:mini";
const DEFAULT_FALLBACK_MODEL: &str = "gemma2:2b";
const DEFAULT_README_MODEL: &str = "qwen2.5-coder";
const DEFAULT_MAX_COMMIT_LENGTH: usize = 72;
const DEFAULT_DIFF_BUDGET: usize = 4000;
const DEFAULT_PRIMARY_ATTEMPTS: usize = 3;
const DEFAULT_FALLBACK_ATTEMPTS: usize = 2;
const DEFAULT_CONTEXT_WINDOW: u32 = 2048;
const DEFAULT_README_CONTEXT_WINDOW: u32 = 16384;
const DEFAULT_README_MAX_FILE_SIZE: usize = 25000;
const DEFAULT_TIMEOUT: u64 = 120;

const ENV_PREFIX: &str = "COMMIT_AI";

/// Location of the optional INI file, `~/.config/git-commit-ai/config.ini`.
pub fn config_file() -> Option<PathBuf> {
  home::home_dir().map(|home| home.join(".config/git-commit-ai/config.ini"))
}

#[derive(Debug, Clone, Deserialize, PartialEq, Serialize)]
pub struct AppConfig {
  pub provider:              Provider,
  pub ollama_host:           String,
  pub openai_api_key:        Option<String>,
  pub primary_model:         String,
  pub fallback_model:        String,
  pub language:              Language,
  pub max_commit_length:     usize,
  pub diff_budget:           usize,
  pub primary_attempts:      usize,
  pub fallback_attempts:     usize,
  pub normal_threshold:      u8,
  pub strict_threshold:      u8,
  pub context_window:        u32,
  pub timeout:               u64,
  pub readme_model:          String,
  pub readme_context_window: u32,
  pub readme_max_file_size:  usize
}

impl Default for AppConfig {
  fn default() -> Self {
    let thresholds = Thresholds::default();

    Self {
      provider:              Provider::default(),
      ollama_host:           DEFAULT_OLLAMA_HOST.to_string(),
      openai_api_key:        None,
      primary_model:         DEFAULT_PRIMARY_MODEL.to_string(),
      fallback_model:        DEFAULT_FALLBACK_MODEL.to_string(),
      language:              Language::default(),
      max_commit_length:     DEFAULT_MAX_COMMIT_LENGTH,
      diff_budget:           DEFAULT_DIFF_BUDGET,
      primary_attempts:      DEFAULT_PRIMARY_ATTEMPTS,
      fallback_attempts:     DEFAULT_FALLBACK_ATTEMPTS,
      normal_threshold:      thresholds.normal,
      strict_threshold:      thresholds.strict,
      context_window:        DEFAULT_CONTEXT_WINDOW,
      timeout:               DEFAULT_TIMEOUT,
      readme_model:          DEFAULT_README_MODEL.to_string(),
      readme_context_window: DEFAULT_README_CONTEXT_WINDOW,
      readme_max_file_size:  DEFAULT_README_MAX_FILE_SIZE
    }
  }
}

impl AppConfig {
  /// Loads defaults, then the INI file, then `COMMIT_AI_*` variables
  /// (a `.env` file in the working directory counts as environment).
  pub fn load() -> Result<Self> {
    dotenv::dotenv().ok();

    let defaults = Self::default();
    let mut builder = Config::builder()
      .set_default("provider", defaults.provider.to_string())?
      .set_default("ollama_host", defaults.ollama_host)?
      .set_default("primary_model", defaults.primary_model)?
      .set_default("fallback_model", defaults.fallback_model)?
      .set_default("language", defaults.language.code())?
      .set_default("max_commit_length", defaults.max_commit_length as i64)?
      .set_default("diff_budget", defaults.diff_budget as i64)?
      .set_default("primary_attempts", defaults.primary_attempts as i64)?
      .set_default("fallback_attempts", defaults.fallback_attempts as i64)?
      .set_default("normal_threshold", defaults.normal_threshold as i64)?
      .set_default("strict_threshold", defaults.strict_threshold as i64)?
      .set_default("context_window", defaults.context_window as i64)?
      .set_default("timeout", defaults.timeout as i64)?
      .set_default("readme_model", defaults.readme_model)?
      .set_default("readme_context_window", defaults.readme_context_window as i64)?
      .set_default("readme_max_file_size", defaults.readme_max_file_size as i64)?;

    if let Some(path) = config_file() {
      log::debug!("Reading configuration from {}", path.display());
      builder = builder.add_source(config::File::new(path.to_string_lossy().as_ref(), FileFormat::Ini).required(false));
    }

    let config = builder
      .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
      .build()
      .context("Failed to build configuration")?;

    let app: Self = config
      .try_deserialize()
      .context("Failed to deserialize configuration. Check ~/.config/git-commit-ai/config.ini and COMMIT_AI_* variables")?;

    Ok(app.sanitized())
  }

  /// Clamps values that would make the generator unusable.
  fn sanitized(mut self) -> Self {
    self.max_commit_length = self.max_commit_length.max(MIN_MESSAGE_LENGTH);
    self.normal_threshold = self.normal_threshold.min(crate::generation::scoring::MAX_SCORE);
    self.strict_threshold = self.strict_threshold.clamp(self.normal_threshold, crate::generation::scoring::MAX_SCORE);
    self
  }

  pub fn thresholds(&self) -> Thresholds {
    Thresholds { normal: self.normal_threshold, strict: self.strict_threshold }
  }

  /// Builds the explicit configuration injected into the generator.
  ///
  /// `fast` swaps the two models: the small one answers first and the
  /// regular one becomes the escalation tier.
  pub fn generator_config(&self, strict: bool, fast: bool) -> GeneratorConfig {
    let (primary_model, fallback_model) = if fast {
      (&self.fallback_model, &self.primary_model)
    } else {
      (&self.primary_model, &self.fallback_model)
    };

    GeneratorConfig {
      tiers:      vec![
        TierConfig {
          name:     "primary".to_string(),
          model:    primary_model.clone(),
          profiles: profiles(&primary_profiles(), self.primary_attempts, self.context_window)
        },
        TierConfig {
          name:     "fallback".to_string(),
          model:    fallback_model.clone(),
          profiles: profiles(&fallback_profiles(), self.fallback_attempts, self.context_window)
        },
      ],
      threshold:  self.thresholds().for_mode(strict),
      max_length: self.max_commit_length,
      timeout:    Duration::from_secs(self.timeout)
    }
  }
}

/// Everything the message generator needs, fixed at construction.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorConfig {
  pub tiers:      Vec<TierConfig>,
  pub threshold:  u8,
  pub max_length: usize,
  pub timeout:    Duration
}

impl Default for GeneratorConfig {
  fn default() -> Self {
    AppConfig::default().generator_config(false, false)
  }
}

/// One model tier: a model id and one sampling profile per attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct TierConfig {
  pub name:     String,
  pub model:    String,
  pub profiles: Vec<GenerationProfile>
}

impl TierConfig {
  pub fn attempts(&self) -> usize {
    self.profiles.len()
  }
}

fn primary_profiles() -> [GenerationProfile; 3] {
  [
    GenerationProfile::new(0.3, 40, &["\n"]),
    GenerationProfile::new(0.2, 30, &["\n", "\r"]),
    GenerationProfile::new(0.1, 24, &["\n", "\r", ". "])
  ]
}

fn fallback_profiles() -> [GenerationProfile; 2] {
  [GenerationProfile::new(0.15, 24, &["\n", "\r", "\""]), GenerationProfile::new(0.05, 20, &["\n", "\r", "\""])]
}

/// Takes `count` profiles from `base`, repeating the tightest one when
/// more attempts are configured than there are base profiles.
fn profiles(base: &[GenerationProfile], count: usize, context_window: u32) -> Vec<GenerationProfile> {
  (0..count)
    .filter_map(|i| base.get(i).or(base.last()))
    .map(|profile| profile.clone().with_context_window(context_window))
    .collect()
}
