//! Tiered retry pipeline for commit messages.
//!
//! The generator walks an explicit state machine: every tier (primary
//! model, then fallback model) gets a bounded number of attempts, each
//! with its own sampling profile. When every tier is exhausted the
//! heuristic produces the message, so [`MessageGenerator::generate`]
//! cannot fail.

use std::time::Duration;

use crate::config::{GeneratorConfig, TierConfig};
use crate::error::is_connection_error;
use crate::generation::clean::{auto_correct, clean};
use crate::generation::heuristic::heuristic_message;
use crate::generation::scoring::{is_conventional, validate};
use crate::generation::types::{CandidateMessage, ChangeSet, ValidationResult};
use crate::model::ModelClient;
use crate::profiling::Profile;
use crate::prompt::PromptBuilder;

/// Position of the generator in its retry pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum State {
  /// `attempt` is 1-based within the tier.
  Attempting { tier: usize, attempt: usize },
  Succeeded { tier: usize, attempt: usize, message: String },
  /// Every attempt of `tier` was rejected.
  Exhausted { tier: usize },
  /// No model tier left; the heuristic answers.
  Done
}

/// Where the emitted message came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
  Model { tier: String, model: String, attempt: usize },
  Heuristic
}

/// Diagnostics for one model attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct AttemptReport {
  pub tier:       String,
  pub model:      String,
  pub attempt:    usize,
  pub candidate:  Option<CandidateMessage>,
  pub validation: Option<ValidationResult>,
  /// Set when the model call itself failed.
  pub error:      Option<String>,
  pub elapsed:    Duration
}

impl AttemptReport {
  pub fn accepted(&self) -> bool {
    self.validation.as_ref().is_some_and(|v| v.valid)
  }

  pub fn issues(&self) -> Vec<String> {
    match (&self.validation, &self.error) {
      (Some(validation), _) => validation.issues.clone(),
      (None, Some(error)) => vec![error.clone()],
      (None, None) => Vec::new()
    }
  }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
  pub message:  String,
  pub source:   Source,
  pub attempts: Vec<AttemptReport>
}

impl Outcome {
  pub fn used_heuristic(&self) -> bool {
    self.source == Source::Heuristic
  }
}

/// Cleans, auto-corrects and validates one raw completion.
///
/// Acceptance needs the threshold score, the conventional shape and a
/// length within `max_length`; over-long candidates are never truncated
/// into acceptance.
pub fn evaluate(raw: &str, attempt: usize, threshold: u8, max_length: usize) -> (CandidateMessage, ValidationResult) {
  let cleaned = auto_correct(&clean(raw));
  let mut validation = validate(&cleaned, threshold, max_length);

  if cleaned.is_empty() || cleaned.chars().count() > max_length || !is_conventional(&cleaned) {
    validation.valid = false;
  }

  let candidate = CandidateMessage {
    raw_text: raw.to_string(),
    cleaned_text: cleaned,
    score: validation.score,
    attempt_number: attempt
  };

  (candidate, validation)
}

pub struct MessageGenerator<'a> {
  client:     &'a dyn ModelClient,
  config:     GeneratorConfig,
  prompts:    PromptBuilder,
  guidelines: Option<String>
}

impl<'a> MessageGenerator<'a> {
  pub fn new(client: &'a dyn ModelClient, config: GeneratorConfig, prompts: PromptBuilder) -> Self {
    Self { client, config, prompts, guidelines: None }
  }

  pub fn with_guidelines(mut self, guidelines: Option<String>) -> Self {
    self.guidelines = guidelines;
    self
  }

  pub fn config(&self) -> &GeneratorConfig {
    &self.config
  }

  pub async fn generate(&self, changeset: &ChangeSet) -> Outcome {
    self.generate_with(changeset, |_| {}).await
  }

  /// Runs the pipeline, handing every attempt report to `observer` as soon
  /// as the attempt is scored.
  pub async fn generate_with<F>(&self, changeset: &ChangeSet, mut observer: F) -> Outcome
  where
    F: FnMut(&AttemptReport)
  {
    let mut attempts: Vec<AttemptReport> = Vec::new();
    let mut state = if changeset.is_empty() { State::Done } else { self.first_attempt_from(0) };

    loop {
      state = match state {
        State::Attempting { tier, attempt } => {
          let tier_config = &self.config.tiers[tier];
          let previous = attempts
            .last()
            .and_then(|report| report.validation.as_ref())
            .map(|validation| validation.issues.clone())
            .unwrap_or_default();

          let prompt = match self.prompt(changeset, &previous) {
            Ok(prompt) => prompt,
            Err(e) => {
              log::warn!("Could not build prompt, using heuristic: {:#}", e);
              break self.heuristic(changeset, attempts);
            }
          };

          let report = self.attempt(tier_config, attempt, &prompt).await;
          observer(&report);
          let accepted = report.accepted();
          let message = report.candidate.as_ref().map(|c| c.cleaned_text.clone());
          attempts.push(report);

          match message {
            Some(message) if accepted => State::Succeeded { tier, attempt, message },
            _ if attempt < tier_config.attempts() => State::Attempting { tier, attempt: attempt + 1 },
            _ => State::Exhausted { tier }
          }
        }

        State::Exhausted { tier } => {
          log::info!("{} model {} exhausted", self.config.tiers[tier].name, self.config.tiers[tier].model);
          self.first_attempt_from(tier + 1)
        }

        State::Succeeded { tier, attempt, message } => {
          let tier_config = &self.config.tiers[tier];
          log::debug!("Accepted attempt {} of {} tier: {}", attempt, tier_config.name, message);
          break Outcome {
            message,
            source: Source::Model { tier: tier_config.name.clone(), model: tier_config.model.clone(), attempt },
            attempts
          };
        }

        State::Done => break self.heuristic(changeset, attempts)
      }
    }
  }

  /// First attempt of the first tier at or after `tier` that has attempts.
  fn first_attempt_from(&self, tier: usize) -> State {
    (tier..self.config.tiers.len())
      .find(|&index| self.config.tiers[index].attempts() > 0)
      .map(|tier| State::Attempting { tier, attempt: 1 })
      .unwrap_or(State::Done)
  }

  fn prompt(&self, changeset: &ChangeSet, previous_issues: &[String]) -> anyhow::Result<String> {
    let guidelines = self.guidelines.as_deref();
    if previous_issues.is_empty() {
      self.prompts.build(changeset, guidelines)
    } else {
      self.prompts.build_retry(changeset, guidelines, previous_issues)
    }
  }

  async fn attempt(&self, tier: &TierConfig, attempt: usize, prompt: &str) -> AttemptReport {
    let profile = &tier.profiles[attempt - 1];
    let timer = Profile::new(format!("{} attempt {}", tier.name, attempt));
    log::debug!("Calling {} ({} tier, attempt {}/{})", tier.model, tier.name, attempt, tier.attempts());

    let result = tokio::time::timeout(self.config.timeout, self.client.generate(&tier.model, prompt, profile)).await;
    let elapsed = timer.elapsed();

    let mut report = AttemptReport {
      tier: tier.name.clone(),
      model: tier.model.clone(),
      attempt,
      candidate: None,
      validation: None,
      error: None,
      elapsed
    };

    match result {
      Ok(Ok(raw)) => {
        let (candidate, validation) = evaluate(&raw, attempt, self.config.threshold, self.config.max_length);
        log::debug!("Candidate {:?} scored {}/10", candidate.cleaned_text, validation.score);
        report.candidate = Some(candidate);
        report.validation = Some(validation);
      }
      Ok(Err(e)) if is_connection_error(&e) => {
        log::debug!("Model unreachable: {:#}", e);
        report.error = Some(format!("model unreachable: {:#}", e));
      }
      Ok(Err(e)) => {
        log::debug!("Model call failed: {:#}", e);
        report.error = Some(format!("{:#}", e));
      }
      Err(_) => {
        log::debug!("Model call timed out after {:?}", self.config.timeout);
        report.error = Some(format!("model call timed out after {:?}", self.config.timeout));
      }
    }

    report
  }

  fn heuristic(&self, changeset: &ChangeSet, attempts: Vec<AttemptReport>) -> Outcome {
    let message = heuristic_message(changeset, self.config.max_length);
    log::info!("Using heuristic message after {} model attempt(s)", attempts.len());
    Outcome { message, source: Source::Heuristic, attempts }
  }
}
