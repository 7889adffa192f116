// ABOUTME: Environment orchestration across every configured location.
// ABOUTME: Runs locations concurrently and aggregates their outcomes without cross-location undo.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{Instrument, error, info, info_span};

use super::error::DeploymentFailure;
use super::location::{LocationOutcome, run_location};
use super::plan::EnvironmentPlan;
use crate::platform::{CommandExecutor, TargetSession};
use crate::types::AppName;

/// Outcomes of one run, in the configured location order.
#[derive(Debug)]
pub struct DeploymentReport {
    pub environment: String,
    pub new_app: AppName,
    pub outcomes: Vec<LocationOutcome>,
}

impl DeploymentReport {
    pub fn succeeded(&self) -> bool {
        self.outcomes.iter().all(LocationOutcome::succeeded)
    }

    pub fn failures(&self) -> impl Iterator<Item = &LocationOutcome> {
        self.outcomes.iter().filter(|o| !o.succeeded())
    }

    /// Process exit status for this report.
    pub fn exit_code(&self) -> i32 {
        if self.succeeded() { 0 } else { 1 }
    }
}

/// Deploy every location of the plan concurrently.
///
/// A failed location never cancels or undoes its siblings.
///
/// # Errors
///
/// Returns `DeploymentFailure`, carrying the full report, if any location failed.
pub async fn deploy<E: CommandExecutor>(
    plan: &EnvironmentPlan,
    executor: Arc<E>,
) -> Result<DeploymentReport, DeploymentFailure> {
    info!(
        environment = %plan.environment,
        app = %plan.new_app,
        "deploying to {} location(s)",
        plan.locations.len()
    );

    let runs = plan.locations.iter().map(|location_plan| {
        let session = TargetSession::new(
            Arc::clone(&executor),
            location_plan.location.clone(),
            location_plan.target.clone(),
        );
        let location_plan = Arc::clone(location_plan);
        let span = info_span!("location", location = %location_plan.location);
        async move { run_location(&session, location_plan).await }.instrument(span)
    });

    let report = DeploymentReport {
        environment: plan.environment.clone(),
        new_app: plan.new_app.clone(),
        outcomes: join_all(runs).await,
    };

    if report.succeeded() {
        return Ok(report);
    }

    for outcome in report.failures() {
        if let Some(e) = &outcome.error {
            error!(location = %outcome.location, "deployment failed: {}", e);
        }
    }
    Err(DeploymentFailure { report })
}
