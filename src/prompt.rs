//! Prompt rendering for commit message generation.
//!
//! The builder is a pure function of its inputs: the same change set,
//! guidelines and language always render to the same bytes.

use std::fmt::{self, Display};
use std::str::FromStr;

use anyhow::{anyhow, bail, Result};
use serde::{Deserialize, Serialize};

use crate::generation::scoring::ALLOWED_TYPES;
use crate::generation::types::{ChangeSet, StatusCode};

const TEMPLATE: &str = "Generate ONE git commit message for the changes below.

Legend: {{{legend}}}

Files:
{{#files}}{{{code}}} {{{path}}}
{{/files}}
{{#has_stats}}Stats: {{{stats}}}

{{/has_stats}}Changes:
{{{diff}}}

{{#has_guidelines}}Project guidelines:
{{{guidelines}}}

{{/has_guidelines}}Rules:
{{#rules}}{{{line}}}
{{/rules}}
Examples:
{{#examples}}{{{line}}}
{{/examples}}
{{#has_retry}}Your previous answer was rejected ({{{retry_issues}}}). Reply with the commit message only.

{{/has_retry}}Commit message:";

const NO_DIFF: &str = "(no textual diff available)";

/// Target language of the generated description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
  #[default]
  Fr,
  En,
  Es,
  De
}

impl Language {
  pub const ALL: [Language; 4] = [Language::Fr, Language::En, Language::Es, Language::De];

  pub fn code(&self) -> &'static str {
    match self {
      Language::Fr => "fr",
      Language::En => "en",
      Language::Es => "es",
      Language::De => "de"
    }
  }

  /// English name of the language, as used in the rules block.
  pub fn name(&self) -> &'static str {
    match self {
      Language::Fr => "French",
      Language::En => "English",
      Language::Es => "Spanish",
      Language::De => "German"
    }
  }

  pub fn status_label(&self, status: StatusCode) -> &'static str {
    use StatusCode::*;

    match (self, status) {
      (Language::Fr, Modified) => "modifié",
      (Language::Fr, Added) => "ajouté",
      (Language::Fr, Deleted) => "supprimé",
      (Language::Fr, Renamed) => "renommé",
      (Language::Fr, Unmerged) => "en conflit",
      (Language::Fr, Unknown) => "non suivi",
      (Language::En, Modified) => "modified",
      (Language::En, Added) => "added",
      (Language::En, Deleted) => "deleted",
      (Language::En, Renamed) => "renamed",
      (Language::En, Unmerged) => "unmerged",
      (Language::En, Unknown) => "untracked",
      (Language::Es, Modified) => "modificado",
      (Language::Es, Added) => "añadido",
      (Language::Es, Deleted) => "eliminado",
      (Language::Es, Renamed) => "renombrado",
      (Language::Es, Unmerged) => "en conflicto",
      (Language::Es, Unknown) => "sin seguimiento",
      (Language::De, Modified) => "geändert",
      (Language::De, Added) => "hinzugefügt",
      (Language::De, Deleted) => "gelöscht",
      (Language::De, Renamed) => "umbenannt",
      (Language::De, Unmerged) => "konflikt",
      (Language::De, Unknown) => "nicht verfolgt"
    }
  }

  pub fn examples(&self) -> [&'static str; 3] {
    match self {
      Language::Fr => [
        "feat(auth): ajouter la connexion par jeton",
        "fix(api): corriger le délai d'attente des requêtes",
        "docs(readme): documenter l'installation locale"
      ],
      Language::En => [
        "feat(auth): add token based login",
        "fix(api): handle request timeouts on retry",
        "docs(readme): document the local setup"
      ],
      Language::Es => [
        "feat(auth): agregar inicio de sesión con token",
        "fix(api): corregir el tiempo de espera de peticiones",
        "docs(readme): documentar la instalación local"
      ],
      Language::De => [
        "feat(auth): token-basierte anmeldung hinzufügen",
        "fix(api): zeitüberschreitung bei anfragen beheben",
        "docs(readme): lokale installation dokumentieren"
      ]
    }
  }
}

impl FromStr for Language {
  type Err = anyhow::Error;

  fn from_str(s: &str) -> Result<Self> {
    match s.trim().to_lowercase().as_str() {
      "fr" | "french" | "français" => Ok(Language::Fr),
      "en" | "english" => Ok(Language::En),
      "es" | "spanish" | "español" => Ok(Language::Es),
      "de" | "german" | "deutsch" => Ok(Language::De),
      other => bail!("Unsupported language: {} (expected one of fr, en, es, de)", other)
    }
  }
}

impl Display for Language {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.code())
  }
}

#[derive(Serialize)]
struct FileLine {
  code: String,
  path: String
}

#[derive(Serialize)]
struct Line {
  line: String
}

#[derive(Serialize)]
struct PromptData {
  legend:         String,
  files:          Vec<FileLine>,
  has_stats:      bool,
  stats:          String,
  diff:           String,
  has_guidelines: bool,
  guidelines:     String,
  rules:          Vec<Line>,
  examples:       Vec<Line>,
  has_retry:      bool,
  retry_issues:   String
}

/// Renders the instruction text sent to the model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptBuilder {
  pub language:   Language,
  pub max_length: usize
}

impl PromptBuilder {
  pub fn new(language: Language, max_length: usize) -> Self {
    Self { language, max_length }
  }

  pub fn build(&self, changeset: &ChangeSet, guidelines: Option<&str>) -> Result<String> {
    self.render(changeset, guidelines, &[])
  }

  /// Same prompt plus a reminder listing why the previous answer was rejected.
  pub fn build_retry(&self, changeset: &ChangeSet, guidelines: Option<&str>, issues: &[String]) -> Result<String> {
    self.render(changeset, guidelines, issues)
  }

  fn legend(&self) -> String {
    [
      StatusCode::Modified,
      StatusCode::Added,
      StatusCode::Deleted,
      StatusCode::Renamed,
      StatusCode::Unmerged,
      StatusCode::Unknown
    ]
    .iter()
    .map(|status| format!("{} = {}", status.short(), self.language.status_label(*status)))
    .collect::<Vec<_>>()
    .join(", ")
  }

  fn rules(&self) -> Vec<Line> {
    [
      "Format: type(scope): description".to_string(),
      format!("Allowed types: {}", ALLOWED_TYPES.join(", ")),
      format!("Between 10 and {} characters in total", self.max_length),
      "The description starts with a lowercase letter and has no final period".to_string(),
      format!("Write the description in {}", self.language.name()),
      "One single line, no quotes, no explanation, no extra text".to_string()
    ]
    .into_iter()
    .enumerate()
    .map(|(i, rule)| Line { line: format!("{}. {}", i + 1, rule) })
    .collect()
  }

  fn render(&self, changeset: &ChangeSet, guidelines: Option<&str>, issues: &[String]) -> Result<String> {
    let guidelines = guidelines.filter(|g| !g.trim().is_empty());
    let diff = changeset.diff_text.trim_end();

    let data = PromptData {
      legend:         self.legend(),
      files:          changeset
        .files
        .iter()
        .map(|file| FileLine { code: file.status.short().to_string(), path: file.path.clone() })
        .collect(),
      has_stats:      changeset.stats.is_some(),
      stats:          changeset.stats.clone().unwrap_or_default(),
      diff:           if diff.is_empty() { NO_DIFF.to_string() } else { diff.to_string() },
      has_guidelines: guidelines.is_some(),
      guidelines:     guidelines.unwrap_or_default().to_string(),
      rules:          self.rules(),
      examples:       self
        .language
        .examples()
        .iter()
        .map(|example| Line { line: example.to_string() })
        .collect(),
      has_retry:      !issues.is_empty(),
      retry_issues:   issues.join("; ")
    };

    let template = mustache::compile_str(TEMPLATE).map_err(|e| anyhow!("Failed to compile prompt template: {:?}", e))?;
    let mut out = Vec::with_capacity(TEMPLATE.len() + data.diff.len());
    template
      .render(&mut out, &data)
      .map_err(|e| anyhow!("Failed to render prompt template: {:?}", e))?;

    String::from_utf8(out).map_err(Into::into)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::generation::types::FileChange;

  fn changeset() -> ChangeSet {
    ChangeSet::new(
      vec![FileChange::new(StatusCode::Modified, "src/api.py"), FileChange::new(StatusCode::Added, "src/<new>.py")],
      "+def hello():\n+    return 'a & b'\n"
    )
  }

  #[test]
  fn test_prompt_is_deterministic() {
    let builder = PromptBuilder::new(Language::Fr, 72);
    let first = builder.build(&changeset(), Some("Use imperative mood")).unwrap();
    let second = builder.build(&changeset(), Some("Use imperative mood")).unwrap();
    assert_eq!(first, second);
  }

  #[test]
  fn test_prompt_contents() {
    let prompt = PromptBuilder::new(Language::Fr, 72).build(&changeset(), None).unwrap();

    assert!(prompt.contains("M = modifié"));
    assert!(prompt.contains("M src/api.py"));
    assert!(prompt.contains("A src/<new>.py"), "paths must not be html-escaped");
    assert!(prompt.contains("return 'a & b'"));
    assert!(prompt.contains("Write the description in French"));
    assert!(prompt.contains("Between 10 and 72 characters"));
    assert!(prompt.contains("feat(auth): ajouter la connexion par jeton"));
    assert!(!prompt.contains("Project guidelines"));
    assert!(!prompt.contains("rejected"));
  }

  #[test]
  fn test_prompt_with_guidelines_and_retry() {
    let builder = PromptBuilder::new(Language::De, 50);
    let prompt = builder
      .build_retry(&changeset(), Some("  Scope is mandatory.\n"), &["too long".to_string()])
      .unwrap();

    assert!(prompt.contains("Project guidelines:\n  Scope is mandatory.\n"));
    assert!(prompt.contains("rejected (too long)"));
    assert!(prompt.contains("D = gelöscht"));
    assert!(prompt.contains("Between 10 and 50 characters"));
  }

  #[test]
  fn test_guidelines_are_kept_verbatim() {
    let builder = PromptBuilder::new(Language::En, 72);
    let guidelines = "# Commits\n\n- scope = crate name\n    indented note\n";
    let prompt = builder.build(&changeset(), Some(guidelines)).unwrap();
    assert!(prompt.contains(guidelines));

    let blank = builder.build(&changeset(), Some(" \n\t\n")).unwrap();
    assert!(!blank.contains("Project guidelines"));
  }

  #[test]
  fn test_empty_diff_placeholder() {
    let changeset = ChangeSet::new(vec![FileChange::new(StatusCode::Modified, "README.md")], "");
    let prompt = PromptBuilder::new(Language::En, 72).build(&changeset, None).unwrap();
    assert!(prompt.contains(NO_DIFF));
  }

  #[test]
  fn test_language_parsing() {
    assert_eq!("FR".parse::<Language>().unwrap(), Language::Fr);
    assert_eq!("english".parse::<Language>().unwrap(), Language::En);
    assert!("it".parse::<Language>().is_err());
    assert_eq!(Language::Es.to_string(), "es");
  }

  #[test]
  fn test_every_language_has_valid_examples() {
    for language in Language::ALL {
      for example in language.examples() {
        assert!(crate::generation::scoring::is_conventional(example), "{example}");
      }
    }
  }
}
