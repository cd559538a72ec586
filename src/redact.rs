//! Secret redaction for diff text.
//!
//! Rules run in a fixed order and are not mutually exclusive. This is a
//! best-effort filter applied before any text is sent to a model; it does
//! not guarantee that every secret is caught.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

pub const API_KEY_PLACEHOLDER: &str = "[REDACTED_API_KEY]";
pub const TOKEN_PLACEHOLDER: &str = "[REDACTED_TOKEN]";
pub const PASSWORD_PLACEHOLDER: &str = "[REDACTED_PASSWORD]";
pub const PRIVATE_KEY_PLACEHOLDER: &str = "[REDACTED_PRIVATE_KEY]";
pub const DB_URL_PLACEHOLDER: &str = "[REDACTED_DB_URL]";
pub const AWS_KEY_PLACEHOLDER: &str = "[REDACTED_AWS_KEY]";
pub const ENV_LINE_PLACEHOLDER: &str = "[REDACTED_ENV_LINE]";

/// Marker identifying environment files by path.
const ENV_FILE_MARKER: &str = ".env";

struct Rule {
  name:        &'static str,
  pattern:     Regex,
  placeholder: &'static str,
  /// Capture group kept in front of the placeholder, e.g. the `KEY=` part.
  keep_group:  Option<usize>
}

impl Rule {
  fn new(name: &'static str, pattern: &str, placeholder: &'static str, keep_group: Option<usize>) -> Self {
    let pattern = Regex::new(pattern).unwrap_or_else(|e| panic!("invalid redaction pattern {name}: {e}"));
    Self { name, pattern, placeholder, keep_group }
  }

  fn apply(&self, text: &str) -> (String, usize) {
    let mut count = 0;
    let replaced = self.pattern.replace_all(text, |caps: &Captures| {
      count += 1;
      let kept = self
        .keep_group
        .and_then(|group| caps.get(group))
        .map(|m| m.as_str())
        .unwrap_or_default();
      format!("{kept}{}", self.placeholder)
    });
    (replaced.into_owned(), count)
  }
}

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
  vec![
    Rule::new(
      "private-key",
      r"(?s)-----BEGIN [A-Z ]*PRIVATE KEY-----.*?(?:-----END [A-Z ]*PRIVATE KEY-----|\z)",
      PRIVATE_KEY_PLACEHOLDER,
      None
    ),
    Rule::new("aws-access-key", r"\b(?:AKIA|ASIA)[0-9A-Z]{16}\b", AWS_KEY_PLACEHOLDER, None),
    Rule::new(
      "api-key-assignment",
      r#"(?i)((?:api[_-]?key|apikey|secret[_-]?key|access[_-]?token|client[_-]?secret)["']?\s*[:=]\s*["']?)[^\s"',;]+"#,
      API_KEY_PLACEHOLDER,
      Some(1)
    ),
    Rule::new(
      "api-key-literal",
      r"\b(?:sk-[A-Za-z0-9_-]{8,}|ghp_[A-Za-z0-9]{20,}|gho_[A-Za-z0-9]{20,}|xox[bpas]-[A-Za-z0-9-]{10,})",
      API_KEY_PLACEHOLDER,
      None
    ),
    Rule::new("bearer-token", r"(?i)(bearer\s+)[A-Za-z0-9\-._~+/]+=*", TOKEN_PLACEHOLDER, Some(1)),
    Rule::new(
      "password-assignment",
      r#"(?i)((?:password|passwd|pwd)["']?\s*[:=]\s*["']?)[^\s"',;]+"#,
      PASSWORD_PLACEHOLDER,
      Some(1)
    ),
    Rule::new(
      "database-url",
      r"(?i)\b(?:postgres(?:ql)?|mysql|mariadb|mongodb(?:\+srv)?|redis|rediss|amqps?|mssql)://[^\s:@/]+:[^\s@/]+@[^\s]+",
      DB_URL_PLACEHOLDER,
      None
    ),
  ]
});

/// Replaces credential-like substrings with placeholders.
///
/// Returns the redacted text and the total number of replacements.
pub fn redact(text: &str) -> (String, usize) {
  let (mut redacted, mut total) = redact_env_files(text);

  for rule in RULES.iter() {
    let (next, count) = rule.apply(&redacted);
    if count > 0 {
      log::debug!("Redaction rule {} matched {} time(s)", rule.name, count);
    }
    redacted = next;
    total += count;
  }

  (redacted, total)
}

/// Blanks every assignment line added or removed in an environment file hunk.
fn redact_env_files(text: &str) -> (String, usize) {
  let mut in_env_file = false;
  let mut count = 0;

  let lines: Vec<String> = text
    .split('\n')
    .map(|line| {
      if line.starts_with("diff --git ") {
        in_env_file = line.contains(ENV_FILE_MARKER);
        return line.to_string();
      }

      if line.starts_with("+++ ") || line.starts_with("--- ") {
        in_env_file |= line.contains(ENV_FILE_MARKER);
        return line.to_string();
      }

      if in_env_file && (line.starts_with('+') || line.starts_with('-')) && line.contains('=') {
        count += 1;
        return format!("{}{ENV_LINE_PLACEHOLDER}", &line[..1]);
      }

      line.to_string()
    })
    .collect();

  (lines.join("\n"), count)
}
