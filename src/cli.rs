// ABOUTME: Command-line interface definition using clap derive macros.
// ABOUTME: Defines all subcommands and their arguments.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "foundry-deploy")]
#[command(about = "Blue-green application deployment across Cloud Foundry foundries")]
#[command(version)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to the configuration file (default: discovered in the current directory)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Minimal output for CI
    #[arg(short, long, global = true, conflicts_with = "json")]
    pub quiet: bool,

    /// JSON lines output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Deploy a new app version to every location of an environment
    Deploy {
        #[command(flatten)]
        run: RunArgs,

        /// Path to the cf binary (overrides the configuration)
        #[arg(long, env = "CF_CMD")]
        cf: Option<PathBuf>,
    },

    /// Show the resolved plan without running any command
    Plan {
        #[command(flatten)]
        run: RunArgs,
    },
}

#[derive(Args)]
pub struct RunArgs {
    /// Environment to deploy (defined in config)
    pub environment: String,

    /// Source revision included in the app name
    #[arg(long, env = "DEPLOY_REVISION")]
    pub revision: String,

    /// Run timestamp in seconds since the epoch (default: now)
    #[arg(long)]
    pub timestamp: Option<i64>,
}
