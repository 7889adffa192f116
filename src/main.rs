// ABOUTME: Entry point for the foundry-deploy CLI application.
// ABOUTME: Parses arguments, sets up logging, and dispatches to command handlers.

mod cli;
mod commands;

use clap::Parser;
use cli::{Cli, Commands};
use foundry_deploy::config::Config;
use foundry_deploy::driver::{self, RunIdentity};
use foundry_deploy::error::Result;
use foundry_deploy::output::{Output, OutputMode};
use std::env;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("foundry_deploy=debug")
        } else {
            EnvFilter::new("foundry_deploy=info")
        }
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mode = if cli.json {
        OutputMode::Json
    } else if cli.quiet {
        OutputMode::Quiet
    } else {
        OutputMode::Normal
    };
    let mut output = Output::new(mode);

    let result = run(cli, &mut output).await;
    if let Err(e) = &result {
        output.error(&e.to_string());
    }
    std::process::exit(driver::exit_code(&result));
}

async fn run(cli: Cli, output: &mut Output) -> Result<()> {
    let cwd = env::current_dir()?;
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::discover(&cwd)?,
    };

    match cli.command {
        Commands::Deploy { run, cf } => {
            if let Some(cf) = cf {
                config.cli.binary = cf;
            }
            let identity = RunIdentity::new(run.environment, run.revision, run.timestamp);
            commands::deploy(&config, &identity, &cwd, output).await
        }
        Commands::Plan { run } => {
            let identity = RunIdentity::new(run.environment, run.revision, run.timestamp);
            commands::plan(&config, &identity, output)
        }
    }
}
