// ABOUTME: Per-location orchestration driving one deployment through its states.
// ABOUTME: Any fatal error rolls the location back; the outcome is always reported.

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use super::Deployment;
use super::error::DeployError;
use super::plan::LocationPlan;
use super::state::Phase;
use crate::diagnostics::BestEffortFailure;
use crate::platform::{CommandExecutor, TargetSession};
use crate::types::{AppName, Location};

/// Final result of one location's run.
#[derive(Debug)]
pub struct LocationOutcome {
    pub location: Location,
    pub new_app: AppName,
    pub old_app: Option<AppName>,
    /// `Done` or `Failed`.
    pub phase: Phase,
    /// Phase in which the fatal error happened.
    pub failed_during: Option<Phase>,
    pub error: Option<DeployError>,
    /// Best-effort failures, including those recorded during rollback.
    pub warnings: Vec<BestEffortFailure>,
}

impl LocationOutcome {
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }

    /// Serializable view of this outcome.
    pub fn summary(&self) -> OutcomeSummary {
        OutcomeSummary {
            location: self.location.to_string(),
            new_app: self.new_app.to_string(),
            old_app: self.old_app.as_ref().map(ToString::to_string),
            phase: self.phase,
            failed_during: self.failed_during,
            error: self.error.as_ref().map(ToString::to_string),
            warnings: self.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct OutcomeSummary {
    pub location: String,
    pub new_app: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_app: Option<String>,
    pub phase: Phase,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_during: Option<Phase>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Run one location from `Idle` to `Done`, or roll it back to `Failed`.
pub async fn run_location<E: CommandExecutor>(
    session: &TargetSession<E>,
    plan: Arc<LocationPlan>,
) -> LocationOutcome {
    let deployment = Deployment::new(plan);

    let provisioned = match deployment.provision(session).await {
        Ok(d) => d,
        Err((d, e)) => return d.rollback(session, e).await.finish(),
    };

    let configured = provisioned.configure(session).await;

    let started = match configured.start(session).await {
        Ok(d) => d,
        Err((d, e)) => return d.rollback(session, e).await.finish(),
    };

    let healthy = match started.verify(session).await {
        Ok(d) => d,
        Err((d, e)) => return d.rollback(session, e).await.finish(),
    };
    info!(app = %healthy.new_app(), "new app is running");

    let cut_over = match healthy.cutover(session).await {
        Ok(d) => d,
        Err((d, e)) => return d.rollback(session, e).await.finish(),
    };

    let outcome = cut_over.retire(session).await.finish();
    info!(app = %outcome.new_app, "location deployed");
    outcome
}
