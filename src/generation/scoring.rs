//! Rubric scoring of cleaned commit messages.
//!
//! Every check is independent and additive; the total is always within
//! `0..=MAX_SCORE`. A message without the conventional shape never scores
//! above `NON_CONVENTIONAL_CAP`.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::generation::types::ValidationResult;

pub const MAX_SCORE: u8 = 10;
pub const MIN_LENGTH: usize = 10;
pub const MAX_LENGTH: usize = 72;
pub const PARTIAL_LENGTH: usize = 100;
pub const NON_CONVENTIONAL_CAP: u8 = 2;

pub const ALLOWED_TYPES: &[&str] =
  &["feat", "fix", "docs", "style", "refactor", "chore", "test", "perf", "build", "ci", "revert"];

/// Generic terms that make a description say nothing.
pub const FILLER_TERMS: &[&str] = &[
  "update",
  "change",
  "misc",
  "various",
  "stuff",
  "mise à jour",
  "modification",
  "cambio",
  "actualización",
  "änderung",
  "aktualisierung"
];

pub static CONVENTIONAL: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"^([a-z]+)(\([a-z0-9_-]+\))?: .+").expect("valid conventional commit regex"));

/// Scores a message with the default 72 character bound.
pub fn score(message: &str) -> (u8, Vec<String>) {
  score_with_max(message, MAX_LENGTH)
}

/// Scores a message against the rubric, with a configurable upper length bound.
pub fn score_with_max(message: &str, max_length: usize) -> (u8, Vec<String>) {
  let mut total = 0;
  let mut issues = Vec::new();
  let conventional = is_conventional(message);

  match CONVENTIONAL.captures(message) {
    Some(captures) if ALLOWED_TYPES.contains(&&captures[1]) => total += 4,
    Some(captures) => {
      total += 2;
      issues.push(format!("unknown commit type '{}'", &captures[1]));
    }
    None => issues.push("does not match the type(scope): description format".to_string())
  }

  let length = message.chars().count();
  if (MIN_LENGTH..=max_length).contains(&length) {
    total += 2;
  } else if (MIN_LENGTH..=PARTIAL_LENGTH.max(max_length)).contains(&length) {
    total += 1;
    issues.push(format!("too long ({length} > {max_length} characters)"));
  } else if length < MIN_LENGTH {
    issues.push(format!("too short ({length} < {MIN_LENGTH} characters)"));
  } else {
    issues.push(format!("far too long ({length} > {PARTIAL_LENGTH} characters)"));
  }

  let description = message.split_once(": ").map(|(_, description)| description);
  let description_text = description.unwrap_or_default();
  let description_length = description_text.chars().count();
  let filler = filler_term(description_text);

  match filler {
    None if description_length >= 15 => total += 2,
    Some(_) if description_length >= 20 => {
      total += 1;
      issues.push("description uses a generic term".to_string());
    }
    Some(term) => issues.push(format!("description is vague ('{term}')")),
    None => issues.push(format!("description too short ({description_length} < 15 characters)"))
  }

  match description.map(|description| description.chars().next()) {
    Some(Some(first)) if first.is_alphabetic() && !first.is_lowercase() => {
      issues.push("description should start with a lowercase letter".to_string());
    }
    Some(Some(_)) => total += 1,
    Some(None) => issues.push("empty description".to_string()),
    None => issues.push("missing ': ' separator".to_string())
  }

  if message.ends_with('.') {
    issues.push("ends with a period".to_string());
  } else {
    total += 1;
  }

  if !conventional {
    total = total.min(NON_CONVENTIONAL_CAP);
  }

  (total.min(MAX_SCORE), issues)
}

fn filler_term(description: &str) -> Option<&'static str> {
  let lower = description.to_lowercase();
  FILLER_TERMS.iter().copied().find(|term| lower.contains(term))
}

/// Scores and applies the acceptance threshold.
pub fn validate(message: &str, threshold: u8, max_length: usize) -> ValidationResult {
  let (score, issues) = score_with_max(message, max_length);
  ValidationResult { valid: score >= threshold, score, issues }
}

/// Threshold policy: strict mode trades retries for better messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Thresholds {
  pub normal: u8,
  pub strict: u8
}

impl Default for Thresholds {
  fn default() -> Self {
    Self { normal: 7, strict: 9 }
  }
}

impl Thresholds {
  pub fn for_mode(&self, strict: bool) -> u8 {
    if strict {
      self.strict
    } else {
      self.normal
    }
  }
}

/// True when the message has the shape `type[(scope)]: description`.
pub fn is_conventional(message: &str) -> bool {
  CONVENTIONAL.is_match(message)
}
