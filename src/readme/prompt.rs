use anyhow::{anyhow, Result};
use serde::Serialize;

use crate::prompt::Language;
use crate::readme::scan::Scan;

const TEMPLATE: &str = "ROLE: You are an expert technical writer.
GOAL: Write the file {{{output}}} in {{{language}}}.

1. Do not talk. Never say \"Here is the file\" or \"Sure\".
2. Do not wrap the answer in a global code block (no ```markdown at the start or the end).
3. The first character of your answer must be \"#\" (the H1 title).

Follow the plan below strictly, in order, without skipping a step.

--- DOCUMENT PLAN ---

1. TITLE & DESCRIPTION
   - An H1 title (#) with a representative emoji.
   - A short description (2-3 sentences): what is this project for?

2. TABLE OF CONTENTS
   - A bullet list of clickable links to the following sections, `[Section name](#section-name)`.

3. INSTALLATION & GETTING STARTED
   - Only the essential commands, in a code block.

4. ARCHITECTURE
   - The file tree as an ASCII tree in a code block, rooted at \"{{{project}}}\".
   - Short comments after the key files explaining their role.

5. TECH STACK
   - A concise bullet list (technology + usage).
{{#has_todos}}

6. ROADMAP / DETECTED TODOS
{{#todos}}{{{line}}}
{{/todos}}{{/has_todos}}

--- END OF PLAN ---
{{#has_note}}

SPECIAL INSTRUCTION: {{{note}}}
{{/has_note}}
{{#has_previous}}

CONTEXT: Take inspiration from the style of the previous README below, but update the technical content from the new code.
PREVIOUS README:
{{{previous}}}
{{/has_previous}}

SOURCE CODE TO ANALYSE:
{{#files}}

--- FILE: {{{path}}} ---
{{{body}}}
{{/files}}";

#[derive(Serialize)]
struct Line {
  line: String
}

#[derive(Serialize)]
struct FileBlock {
  path: String,
  body: String
}

#[derive(Serialize)]
struct ReadmeData {
  output:       String,
  language:     String,
  project:      String,
  has_todos:    bool,
  todos:        Vec<Line>,
  has_note:     bool,
  note:         String,
  has_previous: bool,
  previous:     String,
  files:        Vec<FileBlock>
}

/// Inputs of the README prompt besides the scan itself.
#[derive(Debug, Clone, Default)]
pub struct ReadmeRequest {
  pub output:   String,
  pub project:  String,
  pub language: Language,
  pub note:     Option<String>,
  pub previous: Option<String>
}

pub fn render(scan: &Scan, request: &ReadmeRequest) -> Result<String> {
  let note = request.note.as_deref().map(str::trim).filter(|n| !n.is_empty());
  let previous = request.previous.as_deref().filter(|p| !p.trim().is_empty());

  let data = ReadmeData {
    output:       request.output.clone(),
    language:     request.language.name().to_string(),
    project:      request.project.clone(),
    has_todos:    !scan.todos.is_empty(),
    todos:        scan.todos.iter().map(|todo| Line { line: todo.to_string() }).collect(),
    has_note:     note.is_some(),
    note:         note.unwrap_or_default().to_string(),
    has_previous: previous.is_some(),
    previous:     previous.unwrap_or_default().to_string(),
    files:        scan
      .files
      .iter()
      .map(|file| FileBlock {
        path: file.path.clone(),
        body: match &file.content {
          Some(content) => content.clone(),
          None => format!("// [INFO] File skipped because it is too large ({} characters).", file.size)
        }
      })
      .collect()
  };

  let template = mustache::compile_str(TEMPLATE).map_err(|e| anyhow!("Failed to compile README template: {:?}", e))?;
  let mut out = Vec::new();
  template
    .render(&mut out, &data)
    .map_err(|e| anyhow!("Failed to render README template: {:?}", e))?;

  String::from_utf8(out).map_err(Into::into)
}

/// Removes a code fence wrapping the whole answer, which models add
/// despite being told not to.
pub fn strip_outer_fence(text: &str) -> &str {
  let trimmed = text.trim();
  let Some(rest) = trimmed.strip_prefix("```") else {
    return text;
  };

  match (rest.split_once('\n'), rest.strip_suffix("```")) {
    (Some((info, _)), Some(inner)) if !info.contains('`') => inner[info.len()..].trim_matches('\n'),
    _ => text
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::readme::scan::{SourceFile, Todo};

  fn scan() -> Scan {
    Scan {
      files: vec![
        SourceFile { path: "src/main.rs".into(), content: Some("fn main() {}".into()), size: 12 },
        SourceFile { path: "data/big.json".into(), content: None, size: 90000 },
      ],
      todos: vec![Todo { file: "main.rs".into(), text: "TODO: add flags".into() }]
    }
  }

  #[test]
  fn test_render_sections() {
    let request = ReadmeRequest {
      output: "README.md".into(),
      project: "demo".into(),
      language: Language::En,
      note: Some(" Focus Docker ".into()),
      previous: None
    };
    let prompt = render(&scan(), &request).unwrap();

    assert!(prompt.contains("Write the file README.md in English"));
    assert!(prompt.contains("rooted at \"demo\""));
    assert!(prompt.contains("- [main.rs] TODO: add flags"));
    assert!(prompt.contains("SPECIAL INSTRUCTION: Focus Docker"));
    assert!(prompt.contains("--- FILE: src/main.rs ---\nfn main() {}"));
    assert!(prompt.contains("too large (90000 characters)"));
    assert!(!prompt.contains("PREVIOUS README"));
  }

  #[test]
  fn test_render_without_todos_or_note() {
    let request = ReadmeRequest { previous: Some("# Old".into()), ..Default::default() };
    let prompt = render(&Scan::default(), &request).unwrap();
    assert!(!prompt.contains("ROADMAP"));
    assert!(!prompt.contains("SPECIAL INSTRUCTION"));
    assert!(prompt.contains("PREVIOUS README:\n# Old"));
  }

  #[test]
  fn test_strip_outer_fence() {
    assert_eq!(strip_outer_fence("```markdown\n# Title\n\nBody\n```"), "# Title\n\nBody");
    assert_eq!(strip_outer_fence("# Title\n```sh\nls\n```"), "# Title\n```sh\nls\n```");
  }
}
