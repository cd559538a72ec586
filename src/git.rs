//! Change collector: reads the working tree into a [`ChangeSet`].

use std::path::Path;

use git2::{DiffFormat, DiffOptions, Repository, Status, StatusOptions, StatusShow};
use log::debug;

use crate::error::{CommitError, Result};
use crate::generation::types::{ChangeSet, FileChange, StatusCode};
use crate::profile;

pub trait Utf8String {
  fn to_utf8(&self) -> String;
}

impl Utf8String for [u8] {
  fn to_utf8(&self) -> String {
    String::from_utf8_lossy(self).into_owned()
  }
}

pub struct Repo {
  repo: Repository
}

impl Repo {
  /// Finds the repository containing the current directory.
  pub fn discover() -> Result<Self> {
    Self::discover_from(".")
  }

  pub fn discover_from(path: impl AsRef<Path>) -> Result<Self> {
    Repository::discover(path.as_ref())
      .map(|repo| Self { repo })
      .map_err(|e| {
        debug!("Repository discovery from {} failed: {}", path.as_ref().display(), e);
        CommitError::NotARepository
      })
  }

  /// Root of the working tree; `None` for bare repositories.
  pub fn workdir(&self) -> Option<&Path> {
    self.repo.workdir()
  }

  /// Changed paths, in the order git reports them. Ignored files are
  /// never listed; untracked ones only outside of `staged` mode.
  pub fn statuses(&self, staged: bool) -> Result<Vec<FileChange>> {
    profile!("Git status");
    let mut opts = StatusOptions::new();
    opts
      .show(if staged { StatusShow::Index } else { StatusShow::IndexAndWorkdir })
      .include_untracked(!staged)
      .recurse_untracked_dirs(true)
      .include_ignored(false)
      .exclude_submodules(true)
      .renames_head_to_index(true);

    let statuses = self.repo.statuses(Some(&mut opts))?;
    let files = statuses
      .iter()
      .filter_map(|entry| {
        let status = entry.status();
        let code = status_code(status)?;
        let renamed = entry
          .head_to_index()
          .filter(|_| status.contains(Status::INDEX_RENAMED))
          .and_then(|delta| delta.new_file().path().map(|p| p.to_string_lossy().into_owned()));

        match renamed.or_else(|| entry.path().map(str::to_string)) {
          Some(path) => Some(FileChange::new(code, path)),
          None => {
            debug!("Skipping status entry with a non UTF-8 path");
            None
          }
        }
      })
      .collect::<Vec<_>>();

    debug!("Collected {} changed file(s)", files.len());
    Ok(files)
  }

  /// Zero-context patch text bounded to `budget` characters, plus a
  /// diffstat summary line.
  pub fn diff(&self, staged: bool, budget: usize) -> Result<(String, Option<String>)> {
    self.diff_with(staged, budget, |patch| patch)
  }

  /// Like [`Repo::diff`], but hands the whole lines read so far to `scrub`
  /// before cutting them to `budget`.
  pub fn diff_with<F>(&self, staged: bool, budget: usize, scrub: F) -> Result<(String, Option<String>)>
  where
    F: FnOnce(String) -> String
  {
    profile!("Git diff");
    let tree = self.repo.head().ok().and_then(|head| head.peel_to_tree().ok());
    let mut opts = diff_options(staged);

    let diff = if staged {
      self.repo.diff_tree_to_index(tree.as_ref(), None, Some(&mut opts))?
    } else {
      self.repo.diff_tree_to_workdir_with_index(tree.as_ref(), Some(&mut opts))?
    };

    let stats = diff.stats().ok().map(|stats| {
      format!(
        "{} files changed, {} insertions(+), {} deletions(-)",
        stats.files_changed(),
        stats.insertions(),
        stats.deletions()
      )
    });

    // Each char is at most four bytes, so stop once the budget is surely reached
    let byte_limit = budget.saturating_mul(4);
    let mut patch = Vec::new();
    diff
      .print(DiffFormat::Patch, |_delta, _hunk, line| {
        if matches!(line.origin(), '+' | '-' | ' ') {
          patch.push(line.origin() as u8);
        }
        patch.extend_from_slice(line.content());
        patch.len() <= byte_limit
      })
      .ok();

    let text = truncate_chars(&scrub(patch.to_utf8()), budget);
    debug!("Diff text: {} characters (budget {})", text.chars().count(), budget);
    Ok((text, stats))
  }

  /// Statuses plus bounded diff. An empty status list is an error.
  pub fn collect(&self, staged: bool, budget: usize) -> Result<ChangeSet> {
    self.collect_with(staged, budget, |patch| patch)
  }

  /// [`Repo::collect`] with the patch rewritten by `scrub` before the cut.
  pub fn collect_with<F>(&self, staged: bool, budget: usize, scrub: F) -> Result<ChangeSet>
  where
    F: FnOnce(String) -> String
  {
    let files = self.statuses(staged)?;
    if files.is_empty() {
      return Err(CommitError::NoChanges);
    }

    let (diff, stats) = self.diff_with(staged, budget, scrub)?;
    let changeset = ChangeSet::new(files, diff);
    Ok(match stats {
      Some(stats) => changeset.with_stats(stats),
      None => changeset
    })
  }
}

fn diff_options(staged: bool) -> DiffOptions {
  let mut opts = DiffOptions::new();
  opts
    .include_untracked(!staged)
    .recurse_untracked_dirs(!staged)
    .show_untracked_content(!staged)
    .include_ignored(false)
    .ignore_submodules(true)
    .interhunk_lines(0)
    .context_lines(0);
  opts
}

fn status_code(status: Status) -> Option<StatusCode> {
  if status.is_empty() || status.contains(Status::IGNORED) {
    return None;
  }

  let code = if status.is_conflicted() {
    StatusCode::Unmerged
  } else if status.intersects(Status::INDEX_RENAMED | Status::WT_RENAMED) {
    StatusCode::Renamed
  } else if status.intersects(Status::INDEX_DELETED | Status::WT_DELETED) {
    StatusCode::Deleted
  } else if status.intersects(Status::INDEX_NEW | Status::WT_NEW) {
    StatusCode::Added
  } else if status.intersects(Status::INDEX_MODIFIED | Status::WT_MODIFIED | Status::INDEX_TYPECHANGE | Status::WT_TYPECHANGE) {
    StatusCode::Modified
  } else {
    StatusCode::Unknown
  };

  Some(code)
}

/// Keeps at most `max` characters, cutting on a char boundary.
pub fn truncate_chars(text: &str, max: usize) -> String {
  match text.char_indices().nth(max) {
    Some((index, _)) => text[..index].to_string(),
    None => text.to_string()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_status_mapping() {
    assert_eq!(status_code(Status::CURRENT), None);
    assert_eq!(status_code(Status::IGNORED), None);
    assert_eq!(status_code(Status::WT_NEW), Some(StatusCode::Added));
    assert_eq!(status_code(Status::INDEX_NEW | Status::WT_MODIFIED), Some(StatusCode::Added));
    assert_eq!(status_code(Status::WT_TYPECHANGE), Some(StatusCode::Modified));
    assert_eq!(status_code(Status::INDEX_DELETED), Some(StatusCode::Deleted));
    assert_eq!(status_code(Status::INDEX_RENAMED), Some(StatusCode::Renamed));
    assert_eq!(status_code(Status::CONFLICTED | Status::WT_MODIFIED), Some(StatusCode::Unmerged));
  }

  #[test]
  fn test_truncate_on_char_boundary() {
    assert_eq!(truncate_chars("héllo", 2), "hé");
    assert_eq!(truncate_chars("abc", 10), "abc");
    assert_eq!(truncate_chars("", 0), "");
  }

  #[test]
  fn test_lossy_decoding() {
    let bytes: &[u8] = &[b'o', b'k', 0xff];
    assert_eq!(bytes.to_utf8(), "ok\u{fffd}");
  }
}
