// ABOUTME: Authenticated session bound to one location's foundry account.
// ABOUTME: Carries the resolved target and routes every command through the executor.

use snafu::ResultExt;
use std::path::PathBuf;
use std::sync::Arc;

use super::error::{CommandSnafu, PlatformError};
use super::executor::{CommandExecutor, ExecOptions, SessionContext};
use super::ops::Operation;
use crate::types::{Location, Secret};

/// Resolved foundry account for one location.
#[derive(Debug, Clone)]
pub struct Target {
    pub api: String,
    pub home: PathBuf,
    pub username: String,
    pub password: Secret,
    pub org: String,
    /// Space selected by the environment's profile.
    pub space: String,
    pub domain: String,
}

/// Session for one (location, environment) pair.
///
/// The CLI home in the context is exclusive to this location, so sessions of
/// different locations never share credentials.
pub struct TargetSession<E> {
    executor: Arc<E>,
    context: SessionContext,
    target: Target,
}

impl<E> std::fmt::Debug for TargetSession<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TargetSession")
            .field("context", &self.context)
            .field("target", &self.target)
            .finish()
    }
}

impl<E: CommandExecutor> TargetSession<E> {
    pub fn new(executor: Arc<E>, location: Location, target: Target) -> Self {
        let context = SessionContext {
            location,
            home: target.home.clone(),
        };
        Self {
            executor,
            context,
            target,
        }
    }

    pub fn location(&self) -> &Location {
        &self.context.location
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn context(&self) -> &SessionContext {
        &self.context
    }

    /// Run a command with output echoed to the log.
    pub(crate) async fn cf(&self, op: Operation, args: &[&str]) -> Result<String, PlatformError> {
        self.run(op, args, ExecOptions::default()).await
    }

    /// Run a command whose arguments or output carry secrets.
    pub(crate) async fn cf_muted(
        &self,
        op: Operation,
        args: &[&str],
    ) -> Result<String, PlatformError> {
        self.run(op, args, ExecOptions::muted()).await
    }

    async fn run(
        &self,
        op: Operation,
        args: &[&str],
        options: ExecOptions,
    ) -> Result<String, PlatformError> {
        let args: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
        self.executor
            .execute(&self.context, &args, options)
            .await
            .context(CommandSnafu { op })
    }
}
