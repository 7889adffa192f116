// ABOUTME: Platform error types with SNAFU pattern.
// ABOUTME: Separates process-level command failures from operation-level failures.

use snafu::Snafu;
use std::path::PathBuf;
use std::time::Duration;

use super::executor::CommandLine;
use super::ops::Operation;
use crate::types::AppName;

/// Failure running one CLI command.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum CommandError {
    #[snafu(display("failed to launch {}: {source}", binary.display()))]
    Spawn {
        binary: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("failed to read output of \"{command}\": {source}"))]
    Io {
        command: CommandLine,
        source: std::io::Error,
    },

    #[snafu(display("\"{command}\" timed out after {}s", timeout.as_secs()))]
    Timeout {
        command: CommandLine,
        timeout: Duration,
    },

    #[snafu(display(
        "\"{command}\" failed with exit code {}",
        exit_code.map_or_else(|| "unknown".to_string(), |code| code.to_string())
    ))]
    Failed {
        command: CommandLine,
        exit_code: Option<i32>,
    },
}

impl CommandError {
    /// Exit code of the command, when it ran to completion.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            CommandError::Failed { exit_code, .. } => *exit_code,
            _ => None,
        }
    }

    /// The command line involved, when one was built.
    pub fn command(&self) -> Option<&CommandLine> {
        match self {
            CommandError::Spawn { .. } => None,
            CommandError::Io { command, .. }
            | CommandError::Timeout { command, .. }
            | CommandError::Failed { command, .. } => Some(command),
        }
    }
}

/// Failure of a lifecycle operation against a target.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum PlatformError {
    #[snafu(display("{op} failed: {source}"))]
    Command { op: Operation, source: CommandError },

    #[snafu(display("app {app} is not running"))]
    NotRunning { app: AppName },
}

