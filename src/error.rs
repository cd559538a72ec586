//! Error types for the commit message pipeline.
//!
//! Only environment failures surface as errors: a missing repository, an
//! empty working tree or an unreadable index. Model failures never reach
//! the user because the generator always degrades to the heuristic.

use anyhow::Error;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CommitError {
  #[error("Not a git repository (or any of the parent directories)")]
  NotARepository,

  #[error("No changes to commit")]
  NoChanges,

  #[error("Git error: {0}")]
  Git(#[from] git2::Error),

  #[error("IO error: {0}")]
  Io(#[from] std::io::Error),

  #[error("Model {model} is unavailable: {reason}")]
  ModelUnavailable { model: String, reason: String },

  #[error(transparent)]
  Anyhow(#[from] anyhow::Error)
}

pub type Result<T, E = CommitError> = std::result::Result<T, E>;

/// Checks if an error means the model server could not be reached at all,
/// as opposed to answering badly.
///
/// ```
/// use anyhow::anyhow;
/// use ai::error::is_connection_error;
///
/// let error = anyhow!("error sending request: Connection refused (os error 111)");
/// assert!(is_connection_error(&error));
/// ```
pub fn is_connection_error(error: &Error) -> bool {
  let msg = format!("{:#}", error).to_lowercase();

  msg.contains("connection refused") ||
  msg.contains("error sending request") ||
  msg.contains("failed to connect") ||
  msg.contains("dns error") ||
  msg.contains("timed out") ||
  msg.contains("deadline has elapsed")
}

#[cfg(test)]
mod tests {
  use super::*;
  use anyhow::anyhow;

  #[test]
  fn test_detects_refused_connection() {
    let error = anyhow!("Connection refused (os error 111)");
    assert!(is_connection_error(&error));
  }

  #[test]
  fn test_detects_timeout_in_context_chain() {
    let error = anyhow!("deadline has elapsed").context("Ollama request failed");
    assert!(is_connection_error(&error));
  }

  #[test]
  fn test_ignores_model_errors() {
    let error = anyhow!("model 'phi3:mini' not found, try pulling it first");
    assert!(!is_connection_error(&error));
  }

  #[test]
  fn test_messages() {
    assert_eq!(CommitError::NoChanges.to_string(), "No changes to commit");
    let error = CommitError::ModelUnavailable { model: "qwen2.5-coder".into(), reason: "not pulled".into() };
    assert_eq!(error.to_string(), "Model qwen2.5-coder is unavailable: not pulled");
  }
}
