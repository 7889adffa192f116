// ABOUTME: Deployment driver: fixes the run identity and runs an environment.
// ABOUTME: The new app name is computed once per run and shared by every location.

use chrono::Utc;
use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::deploy::{self, DeploymentReport, EnvironmentPlan};
use crate::error::{Error, Result};
use crate::platform::{CfCli, CommandExecutor};
use crate::types::AppName;

/// Inputs that name one deployment run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunIdentity {
    pub environment: String,
    pub revision: String,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
}

impl RunIdentity {
    /// Build an identity, taking the current time when no timestamp is given.
    pub fn new(
        environment: impl Into<String>,
        revision: impl Into<String>,
        timestamp: Option<i64>,
    ) -> Self {
        Self {
            environment: environment.into(),
            revision: revision.into(),
            timestamp: timestamp.unwrap_or_else(|| Utc::now().timestamp()),
        }
    }

    /// Name of the app this run deploys.
    pub fn app_name(&self, base: &AppName) -> Result<AppName> {
        AppName::compose(
            base.as_str(),
            &self.environment,
            &self.revision,
            self.timestamp,
        )
        .map_err(|e| Error::InvalidConfig(format!("cannot derive app name: {}", e)))
    }
}

/// Runs one environment with a fixed plan and executor.
pub struct Driver<E> {
    plan: EnvironmentPlan,
    executor: Arc<E>,
}

impl Driver<CfCli> {
    /// Driver using the real CLI configured in `config`.
    pub fn with_cli(config: &Config, identity: &RunIdentity, project_root: &Path) -> Result<Self> {
        let cli = CfCli::new(&config.cli.binary, project_root).timeout(config.cli.command_timeout);
        Self::prepare(config, identity, Arc::new(cli))
    }
}

impl<E: CommandExecutor> Driver<E> {
    /// Resolve the plan. No command runs until `run`.
    pub fn prepare(config: &Config, identity: &RunIdentity, executor: Arc<E>) -> Result<Self> {
        let new_app = identity.app_name(&config.app.name)?;
        let plan = EnvironmentPlan::resolve(config, &identity.environment, new_app)?;
        Ok(Self { plan, executor })
    }

    pub fn plan(&self) -> &EnvironmentPlan {
        &self.plan
    }

    /// Deploy every location.
    ///
    /// # Errors
    ///
    /// Returns `Error::Deploy` with the full report if any location failed.
    pub async fn run(&self) -> Result<DeploymentReport> {
        let report = deploy::deploy(&self.plan, Arc::clone(&self.executor)).await?;
        Ok(report)
    }
}

/// Process exit status for a run result.
pub fn exit_code<T>(result: &Result<T>) -> i32 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}
