//! Cleanup of raw model output.
//!
//! Cleaning is an ordered list of small named rules, each a pure
//! `&str -> String` transform. `clean` applies them in sequence and is
//! idempotent: running it twice yields the same text as running it once.

use once_cell::sync::Lazy;
use regex::Regex;

/// Boilerplate line prefixes models like to echo back, longest first.
pub const BOILERPLATE_PREFIXES: &[&str] =
  &["commit message:", "message:", "commit:", "output:", "result:", "- ", "* ", "> "];

const QUOTE_CHARS: &[char] = &['"', '\'', '`'];

static ACRONYM: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z][A-Z0-9]+\b").expect("valid acronym regex"));

/// A named, independently testable cleanup step.
#[derive(Clone, Copy)]
pub struct Rule {
  pub name:  &'static str,
  pub apply: fn(&str) -> String
}

impl std::fmt::Debug for Rule {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Rule").field("name", &self.name).finish()
  }
}

pub const RULES: &[Rule] = &[
  Rule { name: "trim", apply: trim },
  Rule { name: "strip-quotes", apply: strip_quotes },
  Rule { name: "trim", apply: trim },
  Rule { name: "strip-prefix", apply: strip_prefix },
  Rule { name: "single-line", apply: single_line },
  Rule { name: "trim", apply: trim }
];

/// Applies every rule of [`RULES`] in order.
pub fn clean(raw: &str) -> String {
  RULES
    .iter()
    .fold(raw.to_string(), |text, rule| (rule.apply)(&text))
}

pub fn trim(text: &str) -> String {
  text.trim().to_string()
}

pub fn strip_quotes(text: &str) -> String {
  text.chars().filter(|c| !QUOTE_CHARS.contains(c)).collect()
}

pub fn single_line(text: &str) -> String {
  text.split('\n').next().unwrap_or_default().to_string()
}

/// Strips a single boilerplate prefix, case-insensitively.
///
/// The prefix stays in place when removing it would leave an empty first
/// line or expose another boilerplate prefix, so the rule never needs a
/// second pass.
pub fn strip_prefix(text: &str) -> String {
  let Some(prefix) = matching_prefix(text) else {
    return text.to_string();
  };

  let rest = text[prefix.len()..].trim_start();
  let first_line = single_line(rest);
  let first_line = first_line.trim();

  if first_line.is_empty() || matching_prefix(first_line).is_some() {
    return text.to_string();
  }

  rest.to_string()
}

fn matching_prefix(text: &str) -> Option<&'static str> {
  BOILERPLATE_PREFIXES.iter().copied().find(|prefix| {
    text.len() >= prefix.len() && text.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
  })
}

/// Conventional-commit touch-ups applied after [`clean`].
pub fn auto_correct(text: &str) -> String {
  let text = text.strip_suffix('.').unwrap_or(text);

  let Some(index) = text.find(": ") else {
    return text.to_string();
  };

  let (head, description) = text.split_at(index + 2);
  let mut chars = description.chars();

  match chars.next() {
    Some(first) if first.is_uppercase() && !ACRONYM.is_match(description) => {
      format!("{}{}{}", head, first.to_lowercase(), chars.as_str())
    }
    _ => text.to_string()
  }
}
