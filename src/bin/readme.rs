use std::process::ExitCode;

use ai::config::AppConfig;
use ai::readme::{self, Args};
use colored::Colorize;
use structopt::StructOpt;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
  let args = Args::from_args();
  let level = if args.verbose { log::LevelFilter::Debug } else { log::LevelFilter::Warn };
  env_logger::Builder::new()
    .filter_level(level)
    .format_target(false)
    .parse_default_env()
    .try_init()
    .ok();

  // A cancelled draft is not a failure
  if let Err(e) = ctrlc::set_handler(|| {
    eprintln!("\n\n{}", "Cancelled by user.".yellow());
    std::process::exit(0);
  }) {
    log::warn!("Could not install the Ctrl+C handler: {}", e);
  }

  let result = match AppConfig::load() {
    Ok(config) => readme::run(&args, &config).await,
    Err(e) => Err(e)
  };

  match result {
    Ok(()) => ExitCode::SUCCESS,
    Err(e) => {
      eprintln!("{} {:#}", "error:".bold().bright_red(), e);
      ExitCode::FAILURE
    }
  }
}
