mod common;

use ai::error::CommitError;
use ai::generation::StatusCode;
use ai::git::Repo;
use common::TestRepo;
use tempfile::TempDir;

const BUDGET: usize = 4000;

fn statuses(repo: &Repo, staged: bool) -> Vec<(StatusCode, String)> {
  repo
    .statuses(staged)
    .unwrap()
    .into_iter()
    .map(|file| (file.status, file.path))
    .collect()
}

#[test]
fn test_outside_repository() {
  let dir = TempDir::new().unwrap();
  assert!(matches!(Repo::discover_from(dir.path()), Err(CommitError::NotARepository)));
}

#[test]
fn test_clean_tree_has_no_changes() {
  let test_repo = TestRepo::default();
  test_repo.write("a.txt", "hello\n").unwrap();
  test_repo.stage("a.txt").unwrap();
  test_repo.commit("Initial commit").unwrap();

  let repo = Repo::discover_from(test_repo.path()).unwrap();
  assert!(matches!(repo.collect(false, BUDGET), Err(CommitError::NoChanges)));
}

#[test]
fn test_untracked_file_in_fresh_repo() {
  let test_repo = TestRepo::default();
  test_repo.write("src/main.rs", "fn main() {}\n").unwrap();

  let repo = Repo::discover_from(test_repo.path()).unwrap();
  let changeset = repo.collect(false, BUDGET).unwrap();

  assert_eq!(changeset.files.len(), 1);
  assert_eq!(changeset.files[0].status, StatusCode::Added);
  assert_eq!(changeset.files[0].path, "src/main.rs");
  assert!(changeset.diff_text.contains("+fn main() {}"), "{}", changeset.diff_text);
  assert!(changeset.stats.as_deref().is_some_and(|stats| stats.contains("files changed")));
}

#[test]
fn test_modified_and_deleted_files() {
  let test_repo = TestRepo::default();
  test_repo.write("keep.txt", "one\n").unwrap();
  test_repo.write("gone.txt", "bye\n").unwrap();
  test_repo.stage("keep.txt").unwrap();
  test_repo.stage("gone.txt").unwrap();
  test_repo.commit("Initial commit").unwrap();

  test_repo.write("keep.txt", "one\ntwo\n").unwrap();
  test_repo.remove("gone.txt").unwrap();

  let repo = Repo::discover_from(test_repo.path()).unwrap();
  assert_eq!(statuses(&repo, false), vec![
    (StatusCode::Deleted, "gone.txt".to_string()),
    (StatusCode::Modified, "keep.txt".to_string())
  ]);

  let (diff, _) = repo.diff(false, BUDGET).unwrap();
  assert!(diff.contains("+two"));
  assert!(diff.contains("-bye"));
}

#[test]
fn test_staged_mode_ignores_worktree_changes() {
  let test_repo = TestRepo::default();
  test_repo.write("a.txt", "one\n").unwrap();
  test_repo.stage("a.txt").unwrap();
  test_repo.commit("Initial commit").unwrap();

  test_repo.write("a.txt", "one\ntwo\n").unwrap();
  test_repo.write("untracked.txt", "new\n").unwrap();

  let repo = Repo::discover_from(test_repo.path()).unwrap();
  assert!(matches!(repo.collect(true, BUDGET), Err(CommitError::NoChanges)));

  test_repo.stage("a.txt").unwrap();
  let repo = Repo::discover_from(test_repo.path()).unwrap();
  let changeset = repo.collect(true, BUDGET).unwrap();
  assert_eq!(changeset.files.len(), 1);
  assert_eq!(changeset.files[0].status, StatusCode::Modified);
  assert!(!changeset.diff_text.contains("untracked"));
}

#[test]
fn test_staged_rename() {
  let test_repo = TestRepo::default();
  test_repo.write("old.txt", "a line long enough to be detected as the same file\n").unwrap();
  test_repo.stage("old.txt").unwrap();
  test_repo.commit("Initial commit").unwrap();

  std::fs::rename(test_repo.path().join("old.txt"), test_repo.path().join("new.txt")).unwrap();
  test_repo.stage("old.txt").unwrap();
  test_repo.stage("new.txt").unwrap();

  let repo = Repo::discover_from(test_repo.path()).unwrap();
  assert_eq!(statuses(&repo, true), vec![(StatusCode::Renamed, "new.txt".to_string())]);
}

#[test]
fn test_ignored_files_are_skipped() {
  let test_repo = TestRepo::default();
  test_repo.write(".gitignore", "*.log\n").unwrap();
  test_repo.write("debug.log", "noise\n").unwrap();

  let repo = Repo::discover_from(test_repo.path()).unwrap();
  assert_eq!(statuses(&repo, false), vec![(StatusCode::Added, ".gitignore".to_string())]);
}

#[test]
fn test_diff_budget() {
  let test_repo = TestRepo::default();
  test_repo.write("big.txt", &"é line of text\n".repeat(500)).unwrap();

  let repo = Repo::discover_from(test_repo.path()).unwrap();
  let changeset = repo.collect(false, 120).unwrap();
  assert_eq!(changeset.diff_text.chars().count(), 120);
}
