use std::process::ExitCode;
use std::time::Duration;

use ai::commit::{self, Args};
use ai::config::AppConfig;
use ai::generation::{heuristic, AttemptReport, Outcome, Source};
use ai::git::Repo;
use ai::model;
use anyhow::{Context, Result};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use structopt::StructOpt;

fn init_logger(verbose: bool) {
  let level = if verbose { log::LevelFilter::Debug } else { log::LevelFilter::Warn };
  env_logger::Builder::new()
    .filter_level(level)
    .format_target(false)
    .parse_default_env()
    .try_init()
    .ok();
}

fn spinner() -> Result<ProgressBar> {
  let style = ProgressStyle::default_spinner()
    .tick_strings(&["-", "\\", "|", "/", "-"])
    .template("{spinner:.blue} {msg}")
    .context("Failed to create progress bar style")?;

  let pb = ProgressBar::new_spinner();
  pb.set_style(style);
  pb.set_message("Generating commit message...");
  pb.enable_steady_tick(Duration::from_millis(150));
  Ok(pb)
}

fn print_report(report: &AttemptReport) {
  let header = format!("[{} {}] {}", report.tier, report.attempt, report.model);

  match (&report.candidate, &report.validation) {
    (Some(candidate), Some(validation)) => {
      let verdict = if validation.valid { "accepted".green() } else { "rejected".red() };
      eprintln!(
        "{} {} {}/10 {:?} ({:.2?})",
        header.blue(),
        verdict,
        validation.score,
        candidate.cleaned_text,
        report.elapsed
      );
      for issue in &validation.issues {
        eprintln!("    - {}", issue.dimmed());
      }
    }
    _ => {
      let error = report.error.as_deref().unwrap_or("no answer");
      eprintln!("{} {} {} ({:.2?})", header.blue(), "failed".red(), error.dimmed(), report.elapsed);
    }
  }
}

fn print_summary(outcome: &Outcome) {
  match &outcome.source {
    Source::Model { tier, model, attempt } => {
      eprintln!("{} {} tier, {}, attempt {}", "Source:".bold(), tier, model, attempt);
    }
    Source::Heuristic => {
      eprintln!("{} heuristic after {} model attempt(s)", "Source:".bold(), outcome.attempts.len());
    }
  }
}

async fn run(args: &Args) -> Result<String> {
  let config = AppConfig::load()?;
  let repo = Repo::discover()?;
  let prepared = commit::prepare(&repo, args, &config)?;
  if args.verbose && prepared.redactions > 0 {
    eprintln!("{} {} secret(s) redacted from the diff", "Note:".yellow(), prepared.redactions);
  }

  let client = match model::client_for(&config) {
    Ok(client) => client,
    Err(e) => {
      log::warn!("No model client, using heuristic: {:#}", e);
      return Ok(heuristic::heuristic_message(&prepared.changeset, config.max_commit_length));
    }
  };

  let pb = spinner()?;
  let outcome = commit::generate(args, &config, client.as_ref(), &prepared, |report| {
    if args.verbose {
      pb.suspend(|| print_report(report));
    }
  })
  .await;
  pb.finish_and_clear();

  if args.verbose {
    print_summary(&outcome);
  }

  Ok(outcome.message)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
  let args = Args::from_args();
  init_logger(args.verbose);

  match run(&args).await {
    Ok(message) => {
      println!("{}", message);
      ExitCode::SUCCESS
    }
    Err(e) => {
      eprintln!("{} {:#}", "error:".bold().bright_red(), e);
      ExitCode::FAILURE
    }
  }
}
