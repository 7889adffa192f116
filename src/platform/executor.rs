// ABOUTME: Command execution against an isolated CLI session.
// ABOUTME: Runs the platform CLI as a child process, echoing output unless muted.

use async_trait::async_trait;
use snafu::{ResultExt, ensure};
use std::fmt;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::error::{CommandError, FailedSnafu, IoSnafu, SpawnSnafu, TimeoutSnafu};
use crate::types::Location;

/// Default bound on a single CLI invocation.
pub const DEFAULT_COMMAND_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// Session scope of a command: the location it runs for and its CLI home.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    pub location: Location,
    /// Credential/session directory exported as `CF_HOME`.
    pub home: PathBuf,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExecOptions {
    /// Suppress echoing of arguments and output (secret-bearing commands).
    pub mute: bool,
}

impl ExecOptions {
    pub fn muted() -> Self {
        Self { mute: true }
    }
}

/// Argument vector of one invocation.
///
/// Formatting a muted command line shows only the subcommand.
#[derive(Clone, PartialEq, Eq)]
pub struct CommandLine {
    args: Vec<String>,
    muted: bool,
}

impl CommandLine {
    pub fn new(args: Vec<String>, muted: bool) -> Self {
        Self { args, muted }
    }

    /// The literal arguments, secrets included.
    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn subcommand(&self) -> Option<&str> {
        self.args.first().map(String::as_str)
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("cf")?;
        if self.muted {
            if let Some(subcommand) = self.subcommand() {
                write!(f, " {subcommand}")?;
            }
            if self.args.len() > 1 {
                f.write_str(" [arguments redacted]")?;
            }
            return Ok(());
        }
        for arg in &self.args {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

impl fmt::Debug for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("CommandLine").field(&self.to_string()).finish()
    }
}

/// Seam between lifecycle operations and the process that performs them.
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run one CLI command in the given session and return its stdout.
    async fn execute(
        &self,
        context: &SessionContext,
        args: &[String],
        options: ExecOptions,
    ) -> Result<String, CommandError>;
}

/// Executes commands with the real `cf` binary.
#[derive(Debug, Clone)]
pub struct CfCli {
    binary: PathBuf,
    working_dir: PathBuf,
    timeout: Duration,
}

impl CfCli {
    pub fn new(binary: impl Into<PathBuf>, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            working_dir: working_dir.into(),
            timeout: DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn command(&self, context: &SessionContext, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.binary);
        cmd.args(args)
            .current_dir(&self.working_dir)
            .env_clear()
            .env("CF_HOME", &context.home)
            .env("CF_COLOR", "false")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(path) = std::env::var_os("PATH") {
            cmd.env("PATH", path);
        }

        cmd
    }
}

#[async_trait]
impl CommandExecutor for CfCli {
    async fn execute(
        &self,
        context: &SessionContext,
        args: &[String],
        options: ExecOptions,
    ) -> Result<String, CommandError> {
        let command = CommandLine::new(args.to_vec(), options.mute);
        let location = &context.location;
        debug!(%location, "running {}", command);

        let mut child = self
            .command(context, args)
            .spawn()
            .context(SpawnSnafu {
                binary: self.binary.clone(),
            })?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let read_stdout = async {
            let mut captured = String::new();
            if let Some(stdout) = stdout {
                let mut lines = BufReader::new(stdout).lines();
                while let Some(line) = lines.next_line().await? {
                    if !options.mute {
                        info!(target: "foundry_deploy::cf", %location, "{line}");
                    }
                    captured.push_str(&line);
                    captured.push('\n');
                }
            }
            Ok::<_, std::io::Error>(captured)
        };

        let read_stderr = async {
            if let Some(stderr) = stderr {
                let mut lines = BufReader::new(stderr).lines();
                while let Some(line) = lines.next_line().await? {
                    warn!(target: "foundry_deploy::cf", %location, "{line}");
                }
            }
            Ok::<_, std::io::Error>(())
        };

        let run = async {
            let (captured, (), status) = tokio::try_join!(read_stdout, read_stderr, child.wait())?;
            Ok::<_, std::io::Error>((captured, status))
        };

        let outcome = tokio::time::timeout(self.timeout, run).await;
        let (captured, status) = match outcome {
            Ok(result) => result.context(IoSnafu {
                command: command.clone(),
            })?,
            Err(_) => {
                let _ = child.kill().await;
                return TimeoutSnafu {
                    command,
                    timeout: self.timeout,
                }
                .fail();
            }
        };

        ensure!(
            status.success(),
            FailedSnafu {
                command,
                exit_code: status.code(),
            }
        );

        Ok(captured)
    }
}
