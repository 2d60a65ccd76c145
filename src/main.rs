use anyhow::{Context, Result};
use clap::Parser;
use skillmaster::cli::{self, Cli};
use skillmaster::config::Settings;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Cli::parse();
    skillmaster::logging::init(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Cli) -> Result<()> {
    // First run writes the default settings file; failure here is not fatal.
    if let Err(e) = Settings::initialize() {
        tracing::warn!("could not create default settings: {e}");
    }
    let settings = Settings::load().context("failed to load settings")?;
    let cwd = std::env::current_dir().context("failed to get current directory")?;
    cli::run(args, &settings, &cwd)
}
