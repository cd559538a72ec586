use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::profile;

/// Name of the optional project style guide for commit messages.
pub const GUIDELINE_FILE: &str = "COMMIT_MESSAGE.md";

/// Directories, relative to the repository root, searched in order.
pub const GUIDELINE_DIRS: &[&str] = &["", ".github", "docs"];

/// Represents a file in the filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct File {
  path: PathBuf
}

impl File {
  pub fn new(path: impl Into<PathBuf>) -> Self {
    Self { path: path.into() }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  pub fn exists(&self) -> bool {
    self.path.is_file()
  }

  pub fn read(&self) -> Result<String> {
    profile!("Read file");
    let bytes = fs::read(&self.path).with_context(|| format!("Failed to read {}", self))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
  }

  pub fn write(&self, contents: &str) -> Result<()> {
    profile!("Write file");
    log::debug!("Writing {} bytes to {}", contents.len(), self);
    fs::write(&self.path, contents).with_context(|| format!("Failed to write {}", self))
  }

  /// Path of the backup copy, `<name>.bak` next to the file.
  pub fn backup_path(&self) -> PathBuf {
    let mut name = self.path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".bak");
    self.path.with_file_name(name)
  }

  /// Copies the file to its backup path. Returns `None` when there was
  /// nothing to back up.
  pub fn backup(&self) -> Result<Option<File>> {
    if !self.exists() {
      return Ok(None);
    }

    let backup = File::new(self.backup_path());
    fs::copy(&self.path, &backup.path).with_context(|| format!("Failed to back up {} to {}", self, backup))?;
    log::debug!("Backed up {} to {}", self, backup);
    Ok(Some(backup))
  }
}

impl fmt::Display for File {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.path.display())
  }
}

/// First `COMMIT_MESSAGE.md` found under `root`.
pub fn find_guidelines(root: &Path) -> Option<File> {
  GUIDELINE_DIRS
    .iter()
    .map(|dir| File::new(root.join(dir).join(GUIDELINE_FILE)))
    .find(File::exists)
}

/// Text of the project guidelines, if any. Absence and unreadable files are
/// not errors; an empty file counts as absent.
pub fn read_guidelines(root: &Path) -> Option<String> {
  let file = find_guidelines(root)?;

  match file.read() {
    Ok(text) if !text.trim().is_empty() => {
      log::debug!("Using commit guidelines from {}", file);
      Some(text)
    }
    Ok(_) => None,
    Err(e) => {
      log::warn!("Ignoring commit guidelines: {:#}", e);
      None
    }
  }
}
