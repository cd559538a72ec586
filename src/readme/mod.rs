//! README drafting: scans the project, asks a local model for a README and
//! streams the answer to stdout while writing it to disk.

pub mod prompt;
pub mod scan;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use structopt::StructOpt;

use crate::config::AppConfig;
use crate::error::CommitError;
use crate::filesystem::File;
use crate::model::{count_tokens, GenerationProfile, ModelClient};
use crate::ollama::OllamaClient;
use crate::prompt::Language;
use crate::readme::prompt::{render, strip_outer_fence, ReadmeRequest};

const TEMPERATURE: f32 = 0.3;
const REPEAT_PENALTY: f32 = 1.1;
const MAX_OUTPUT_TOKENS: u32 = 8192;

#[derive(StructOpt, Debug)]
#[structopt(name = "git-readme-ai", about = "Drafts a README.md for the current project with a local model")]
pub struct Args {
  /// Language of the README
  #[structopt(long, default_value = "fr")]
  pub language: Language,

  /// Special instruction for the writer, e.g. "focus on Docker"
  #[structopt(long)]
  pub note: Option<String>,

  /// Use the existing README as style input
  #[structopt(long)]
  pub reuse_existing: bool,

  /// Model to use instead of the configured one
  #[structopt(long)]
  pub model: Option<String>,

  #[structopt(long, parse(from_os_str), default_value = "README.md")]
  pub output: PathBuf,

  #[structopt(short, long)]
  pub verbose: bool
}

/// Share of the context window a prompt of `tokens` would take, in percent.
pub fn fill_ratio(tokens: usize, context_window: u32) -> f64 {
  if context_window == 0 {
    return f64::INFINITY;
  }
  tokens as f64 / context_window as f64 * 100.0
}

pub async fn run(args: &Args, config: &AppConfig) -> Result<()> {
  let root = std::env::current_dir().context("Failed to get current directory")?;
  let project = root
    .file_name()
    .map(|name| name.to_string_lossy().into_owned())
    .unwrap_or_else(|| "project".to_string());
  eprintln!("{} {}", "Directory:".bold(), root.display());

  let output = File::new(root.join(&args.output));
  let previous = if args.reuse_existing && output.exists() { Some(output.read()?) } else { None };

  let scan = scan::scan(&root, &args.output, config.readme_max_file_size)?;
  let oversized = scan.oversized().count();
  eprintln!("--> {} file(s) analysed", scan.included().count());
  if oversized > 0 {
    eprintln!("--> {} file(s) too large, listed without content", oversized);
  }

  let request = ReadmeRequest {
    output: args.output.to_string_lossy().into_owned(),
    project,
    language: args.language,
    note: args.note.clone(),
    previous
  };
  let prompt = render(&scan, &request)?;

  let tokens = count_tokens(&prompt);
  let ratio = fill_ratio(tokens, config.readme_context_window);
  eprintln!("{} ~{} tokens ({:.1}% of {})", "Context fill:".bold(), tokens, ratio, config.readme_context_window);
  if ratio > 100.0 {
    eprintln!("{}", "Warning: the project is larger than the context window, parts of it will be forgotten".yellow());
  }

  let model = args.model.clone().unwrap_or_else(|| config.readme_model.clone());
  let client = OllamaClient::new(&config.ollama_host)?;
  if !client.is_available(&model).await {
    return Err(
      CommitError::ModelUnavailable { model: model.clone(), reason: format!("not served by {}", config.ollama_host) }.into()
    );
  }

  if let Some(backup) = output.backup()? {
    eprintln!("{} {}", "Backup:".bold(), backup);
  }

  eprintln!("\nGenerating with {} (Ctrl+C to cancel)\n{}", model.cyan(), "-".repeat(40));
  let profile = GenerationProfile {
    temperature:    TEMPERATURE,
    max_tokens:     MAX_OUTPUT_TOKENS,
    context_window: config.readme_context_window,
    repeat_penalty: REPEAT_PENALTY,
    stop:           Vec::new(),
    ..GenerationProfile::default()
  };

  let mut stdout = std::io::stdout();
  let text = client
    .stream(&model, &prompt, &profile, |chunk| {
      print!("{}", chunk);
      stdout.flush().ok();
    })
    .await?;
  eprintln!("\n{}", "-".repeat(40));

  output.write(strip_outer_fence(&text))?;
  eprintln!("{} {}", "Done:".green().bold(), output);
  Ok(())
}
