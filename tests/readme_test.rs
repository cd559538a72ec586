use std::fs;
use std::path::Path;

use ai::readme::prompt::{render, ReadmeRequest};
use ai::readme::scan::scan;
use tempfile::TempDir;

fn write(root: &Path, name: &str, content: &str) {
  let path = root.join(name);
  fs::create_dir_all(path.parent().unwrap()).unwrap();
  fs::write(path, content).unwrap();
}

fn project() -> TempDir {
  let dir = TempDir::new().unwrap();
  let root = dir.path();

  write(root, "src/main.rs", "fn main() {}\n// TODO: parse flags\n");
  write(root, "Dockerfile", "FROM rust:1\n");
  write(root, "README.md", "# Old readme\n");
  write(root, "logo.png", "not really a png");
  write(root, "node_modules/pkg/index.js", "module.exports = {}\n");
  write(root, "target/debug/build.rs", "fn main() {}\n");
  write(root, "generated/schema.json", "{}\n");
  write(root, ".gitignore", "generated/\n");
  write(root, "data/huge.json", &"x".repeat(500));
  dir
}

#[test]
fn test_scan_filters_and_orders_files() {
  let dir = project();
  let scan = scan(dir.path(), Path::new("README.md"), 100).unwrap();

  let paths: Vec<&str> = scan.files.iter().map(|file| file.path.as_str()).collect();
  assert_eq!(paths, vec!["Dockerfile", "data/huge.json", "src/main.rs"]);

  let oversized: Vec<&str> = scan.oversized().map(|file| file.path.as_str()).collect();
  assert_eq!(oversized, vec!["data/huge.json"]);
  assert_eq!(scan.included().count(), 2);

  assert_eq!(scan.todos.len(), 1);
  assert_eq!(scan.todos[0].to_string(), "- [main.rs] TODO: parse flags");
}

#[test]
fn test_scan_skips_output_file() {
  let dir = project();
  write(dir.path(), "docs/index.html", "<h1>Docs</h1>\n");

  let all = scan(dir.path(), Path::new("README.md"), 25000).unwrap();
  assert!(all.files.iter().any(|file| file.path == "docs/index.html"));

  let skipped = scan(dir.path(), Path::new("docs/index.html"), 25000).unwrap();
  assert!(skipped.files.iter().all(|file| file.path != "docs/index.html"));
}

#[test]
fn test_prompt_from_scan() {
  let dir = project();
  let scan = scan(dir.path(), Path::new("README.md"), 100).unwrap();
  let request = ReadmeRequest { output: "README.md".into(), project: "demo".into(), ..Default::default() };

  let prompt = render(&scan, &request).unwrap();
  assert!(prompt.contains("in French"));
  assert!(prompt.contains("--- FILE: Dockerfile ---\nFROM rust:1"));
  assert!(prompt.contains("too large (500 characters)"));
  assert!(!prompt.contains("module.exports"));
}
