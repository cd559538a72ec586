//! Project scanning for README drafting.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use ignore::WalkBuilder;
use rayon::prelude::*;

use crate::profile;

/// Directories never scanned, on top of the gitignore rules.
pub const DEFAULT_EXCLUDES: &[&str] =
  &[".git", "node_modules", "venv", "__pycache__", "dist", "build", ".idea", ".vscode", ".next", "target"];

pub const EXTENSIONS: &[&str] = &[
  "py", "js", "ts", "tsx", "jsx", "html", "css", "scss", "java", "c", "cpp", "h", "cs", "php", "rb", "go", "rs", "vue",
  "svelte", "kt", "swift", "dart", "json", "xml", "yaml", "yml", "toml", "ini", "sql", "prisma", "graphql",
  "dockerfile", "sh", "bat", "ps1"
];

/// Extensionless files worth reading.
pub const SPECIAL_NAMES: &[&str] = &["Dockerfile", "Makefile", "Gemfile"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
  /// Path relative to the scan root, `/`-separated.
  pub path:    String,
  /// `None` when the file is above the size limit.
  pub content: Option<String>,
  pub size:    usize
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Todo {
  pub file: String,
  pub text: String
}

impl std::fmt::Display for Todo {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    write!(f, "- [{}] {}", self.file, self.text)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Scan {
  pub files: Vec<SourceFile>,
  pub todos: Vec<Todo>
}

impl Scan {
  pub fn included(&self) -> impl Iterator<Item = &SourceFile> {
    self.files.iter().filter(|file| file.content.is_some())
  }

  pub fn oversized(&self) -> impl Iterator<Item = &SourceFile> {
    self.files.iter().filter(|file| file.content.is_none())
  }
}

pub fn is_candidate(name: &str) -> bool {
  if SPECIAL_NAMES.contains(&name) {
    return true;
  }

  name
    .rsplit_once('.')
    .is_some_and(|(_, ext)| EXTENSIONS.contains(&ext.to_lowercase().as_str()))
}

/// Walks `root`, honouring `.gitignore` files and [`DEFAULT_EXCLUDES`].
/// `output` (relative to `root`) is skipped so a previous draft never feeds
/// the next one. Files are returned in path order.
pub fn scan(root: &Path, output: &Path, max_file_size: usize) -> Result<Scan> {
  profile!("Scan project");
  if !root.is_dir() {
    bail!("Not a directory: {}", root.display());
  }

  let paths = walk(root, output);
  log::debug!("{} candidate file(s) under {}", paths.len(), root.display());

  let mut files: Vec<(SourceFile, Vec<Todo>)> = paths
    .par_iter()
    .filter_map(|path| read(root, path, max_file_size))
    .collect();
  files.sort_by(|(a, _), (b, _)| a.path.cmp(&b.path));

  let mut scan = Scan::default();
  for (file, todos) in files {
    scan.files.push(file);
    scan.todos.extend(todos);
  }

  Ok(scan)
}

fn walk(root: &Path, output: &Path) -> Vec<PathBuf> {
  let skip = root.join(output);

  WalkBuilder::new(root)
    .hidden(false)
    .require_git(false)
    .filter_entry(|entry| {
      entry.depth() == 0 ||
        entry
          .file_name()
          .to_str()
          .map_or(true, |name| !DEFAULT_EXCLUDES.contains(&name))
    })
    .build()
    .filter_map(|entry| match entry {
      Ok(entry) => Some(entry),
      Err(e) => {
        log::debug!("Skipping unreadable entry: {}", e);
        None
      }
    })
    .filter(|entry| entry.file_type().is_some_and(|kind| kind.is_file()))
    .filter(|entry| entry.file_name().to_str().is_some_and(is_candidate))
    .map(|entry| entry.into_path())
    .filter(|path| *path != skip)
    .collect()
}

fn read(root: &Path, path: &Path, max_file_size: usize) -> Option<(SourceFile, Vec<Todo>)> {
  let content = match fs::read_to_string(path) {
    Ok(content) => content,
    Err(e) => {
      log::debug!("Skipping {}: {}", path.display(), e);
      return None;
    }
  };

  let relative = path.strip_prefix(root).unwrap_or(path);
  let relative = relative
    .components()
    .map(|c| c.as_os_str().to_string_lossy())
    .collect::<Vec<_>>()
    .join("/");
  let name = path
    .file_name()
    .map(|n| n.to_string_lossy().into_owned())
    .unwrap_or_else(|| relative.clone());

  let todos = todos(&name, &content);
  let size = content.chars().count();
  let content = (size < max_file_size).then_some(content);
  if content.is_none() {
    log::warn!("Too large (> {} characters): {}", max_file_size, relative);
  }

  Some((SourceFile { path: relative, content, size }, todos))
}

/// Lines mentioning `TODO` or `FIXME`, stripped of comment markers.
pub fn todos(file: &str, content: &str) -> Vec<Todo> {
  content
    .lines()
    .filter(|line| line.contains("TODO") || line.contains("FIXME"))
    .map(|line| Todo { file: file.to_string(), text: line.trim().replace("//", "").replace('#', "").trim().to_string() })
    .collect()
}
