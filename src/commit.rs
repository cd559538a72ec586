//! The commit message pipeline: collect, redact, prompt, generate.

use std::path::Path;

use structopt::StructOpt;

use crate::config::AppConfig;
use crate::error::Result;
use crate::filesystem::read_guidelines;
use crate::generation::{AttemptReport, ChangeSet, MessageGenerator, Outcome};
use crate::git::Repo;
use crate::model::ModelClient;
use crate::prompt::{Language, PromptBuilder};
use crate::redact::redact;

#[derive(StructOpt, Debug, Default, Clone)]
#[structopt(name = "git-commit-ai", about = "Prints a conventional commit message for the current changes.")]
pub struct Args {
  /// Print the score and issues of every attempt on stderr
  #[structopt(short, long)]
  pub verbose: bool,

  /// Only accept messages scoring 9 or more
  #[structopt(long)]
  pub strict: bool,

  /// Language of the description: fr, en, es or de
  #[structopt(long)]
  pub language: Option<Language>,

  /// Only look at staged changes
  #[structopt(long)]
  pub staged: bool,

  /// Use the smaller, faster model as primary
  #[structopt(short, long)]
  pub fast: bool
}

/// Everything the generator needs, gathered from the working tree.
#[derive(Debug, Clone)]
pub struct Prepared {
  pub changeset:  ChangeSet,
  pub guidelines: Option<String>,
  pub redactions: usize
}

/// Collects the changes and scrubs secrets from the diff before any of it
/// can reach a model. Redaction runs before the diff budget cut.
pub fn prepare(repo: &Repo, args: &Args, config: &AppConfig) -> Result<Prepared> {
  let mut redactions = 0;
  let changeset = repo.collect_with(args.staged, config.diff_budget, |patch| {
    let (redacted, count) = redact(&patch);
    redactions = count;
    redacted
  })?;
  if redactions > 0 {
    log::info!("Redacted {} secret(s) from the diff", redactions);
  }

  let guidelines = repo.workdir().and_then(read_guidelines);
  Ok(Prepared { changeset, guidelines, redactions })
}

pub fn language(args: &Args, config: &AppConfig) -> Language {
  args.language.unwrap_or(config.language)
}

/// Runs the tiered generator. Never fails: model trouble ends in the
/// heuristic message.
pub async fn generate<F>(args: &Args, config: &AppConfig, client: &dyn ModelClient, prepared: &Prepared, observer: F) -> Outcome
where
  F: FnMut(&AttemptReport)
{
  let prompts = PromptBuilder::new(language(args, config), config.max_commit_length);
  MessageGenerator::new(client, config.generator_config(args.strict, args.fast), prompts)
    .with_guidelines(prepared.guidelines.clone())
    .generate_with(&prepared.changeset, observer)
    .await
}

/// Discovers the repository at `path` and prepares its changes.
pub fn prepare_at(path: impl AsRef<Path>, args: &Args, config: &AppConfig) -> Result<Prepared> {
  let repo = Repo::discover_from(path)?;
  prepare(&repo, args, config)
}
