//! Model-free commit message derived from file extensions.
//!
//! This is the last line of defense of the generator: it is total and
//! cannot fail.

use crate::generation::types::{ChangeSet, FileChange};

pub const EMPTY_CHANGESET_MESSAGE: &str = "chore: update repository";

/// Smallest maximum length every heuristic message fits in.
pub const MIN_MESSAGE_LENGTH: usize = EMPTY_CHANGESET_MESSAGE.len();

const CODE_EXTENSIONS: &[&str] = &[
  "py", "js", "mjs", "cjs", "ts", "tsx", "jsx", "rs", "go", "java", "kt", "kts", "swift", "dart", "c", "h", "cc",
  "cpp", "hpp", "cs", "php", "rb", "vue", "svelte", "html", "css", "scss", "sass", "less", "sql", "sh", "bash",
  "ps1", "bat", "lua", "scala", "ex", "exs", "hs", "ml", "graphql", "prisma"
];
const DOCS_EXTENSIONS: &[&str] = &["md", "markdown", "rst", "txt", "adoc", "org"];
const CONFIG_EXTENSIONS: &[&str] =
  &["json", "yaml", "yml", "toml", "ini", "cfg", "conf", "env", "lock", "xml", "properties", "editorconfig"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
  Code,
  Docs,
  Config
}

/// Buckets a file by its extension. Unknown extensions count as code.
pub fn classify(file: &FileChange) -> Bucket {
  match file.extension().as_deref() {
    Some(ext) if DOCS_EXTENSIONS.contains(&ext) => Bucket::Docs,
    Some(ext) if CONFIG_EXTENSIONS.contains(&ext) => Bucket::Config,
    Some(ext) if CODE_EXTENSIONS.contains(&ext) => Bucket::Code,
    _ if is_dotenv(&file.path) => Bucket::Config,
    _ => Bucket::Code
  }
}

fn is_dotenv(path: &str) -> bool {
  path.rsplit('/').next().is_some_and(|name| name.starts_with(".env"))
}

/// Derives the commit type from the buckets of all files.
pub fn commit_type(files: &[FileChange]) -> &'static str {
  let buckets: Vec<Bucket> = files.iter().map(classify).collect();

  if !buckets.is_empty() && buckets.iter().all(|b| *b == Bucket::Docs) {
    "docs"
  } else if !buckets.is_empty() && buckets.iter().all(|b| *b == Bucket::Config) {
    "chore"
  } else {
    "feat"
  }
}

/// Most frequent top-level directory; ties go to the first one seen.
pub fn scope(files: &[FileChange]) -> Option<String> {
  let mut counts: Vec<(&str, usize)> = Vec::new();

  for dir in files.iter().filter_map(FileChange::top_level_dir) {
    match counts.iter_mut().find(|(seen, _)| *seen == dir) {
      Some((_, count)) => *count += 1,
      None => counts.push((dir, 1))
    }
  }

  // max_by_key keeps the last maximum, so walk in reverse to favour the first
  counts
    .iter()
    .rev()
    .max_by_key(|(_, count)| *count)
    .map(|(dir, _)| sanitize_scope(dir))
    .filter(|scope| !scope.is_empty())
}

fn sanitize_scope(dir: &str) -> String {
  dir
    .to_lowercase()
    .chars()
    .map(|c| {
      if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' || c == '-' {
        c
      } else {
        '-'
      }
    })
    .collect::<String>()
    .trim_matches('-')
    .to_string()
}

/// Builds `type(scope): update N files`, shortening it until it fits
/// `max_length`: the scope goes first, then the file count.
///
/// Every `max_length` of at least [`MIN_MESSAGE_LENGTH`] is honored.
pub fn heuristic_message(changeset: &ChangeSet, max_length: usize) -> String {
  if changeset.is_empty() {
    return EMPTY_CHANGESET_MESSAGE.to_string();
  }

  let kind = commit_type(&changeset.files);
  let count = changeset.len();

  let mut candidates = Vec::with_capacity(4);
  if let Some(scope) = scope(&changeset.files) {
    candidates.push(format!("{kind}({scope}): update {count} files"));
  }
  candidates.push(format!("{kind}: update {count} files"));
  candidates.push(format!("{kind}: update files"));

  candidates
    .into_iter()
    .find(|message| message.chars().count() <= max_length)
    .unwrap_or_else(|| format!("{kind}: update files"))
}

/// [`heuristic_message`] with the default 72 character bound.
pub fn heuristic_fallback(changeset: &ChangeSet) -> String {
  heuristic_message(changeset, crate::generation::scoring::MAX_LENGTH)
}
