use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Status of a single path as reported by the working tree.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum StatusCode {
  Modified,
  Added,
  Deleted,
  Renamed,
  Unmerged,
  Unknown
}

impl StatusCode {
  /// One-letter code, as printed by `git status --short`.
  pub fn short(&self) -> char {
    match self {
      StatusCode::Modified => 'M',
      StatusCode::Added => 'A',
      StatusCode::Deleted => 'D',
      StatusCode::Renamed => 'R',
      StatusCode::Unmerged => 'U',
      StatusCode::Unknown => '?'
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      StatusCode::Modified => "modified",
      StatusCode::Added => "added",
      StatusCode::Deleted => "deleted",
      StatusCode::Renamed => "renamed",
      StatusCode::Unmerged => "unmerged",
      StatusCode::Unknown => "unknown"
    }
  }
}

impl From<char> for StatusCode {
  fn from(c: char) -> Self {
    match c {
      'M' | 'T' => StatusCode::Modified,
      'A' => StatusCode::Added,
      'D' => StatusCode::Deleted,
      'R' => StatusCode::Renamed,
      'U' => StatusCode::Unmerged,
      _ => StatusCode::Unknown
    }
  }
}

impl Display for StatusCode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FileChange {
  pub status: StatusCode,
  pub path:   String
}

impl FileChange {
  pub fn new(status: StatusCode, path: impl Into<String>) -> Self {
    Self { status, path: path.into() }
  }

  /// Lowercased extension of the path, without the dot.
  pub fn extension(&self) -> Option<String> {
    let name = self.path.rsplit('/').next().unwrap_or(&self.path);
    name
      .rsplit_once('.')
      .filter(|(stem, ext)| !stem.is_empty() && !ext.is_empty())
      .map(|(_, ext)| ext.to_lowercase())
  }

  /// First path component when the file lives below a directory.
  pub fn top_level_dir(&self) -> Option<&str> {
    self
      .path
      .split_once('/')
      .map(|(dir, _)| dir)
      .filter(|dir| !dir.is_empty())
  }
}

/// The unit of work for one invocation: changed files plus a bounded diff.
///
/// Built once by the collector and never mutated afterwards.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChangeSet {
  pub files:     Vec<FileChange>,
  pub diff_text: String,
  pub stats:     Option<String>
}

impl ChangeSet {
  pub fn new(files: Vec<FileChange>, diff_text: impl Into<String>) -> Self {
    Self { files, diff_text: diff_text.into(), stats: None }
  }

  pub fn with_stats(mut self, stats: impl Into<String>) -> Self {
    self.stats = Some(stats.into());
    self
  }

  pub fn is_empty(&self) -> bool {
    self.files.is_empty()
  }

  pub fn len(&self) -> usize {
    self.files.len()
  }
}

/// Outcome of scoring one cleaned candidate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
  pub valid:  bool,
  pub score:  u8,
  pub issues: Vec<String>
}

/// One attempt at a commit message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateMessage {
  pub raw_text:       String,
  pub cleaned_text:   String,
  pub score:          u8,
  pub attempt_number: usize
}
