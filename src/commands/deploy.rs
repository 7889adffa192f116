// ABOUTME: Deploy command implementation.
// ABOUTME: Resolves the run, deploys every location, and reports per-location results.

use foundry_deploy::config::Config;
use foundry_deploy::driver::{Driver, RunIdentity};
use foundry_deploy::error::{Error, Result};
use foundry_deploy::output::Output;
use std::path::Path;

/// Deploy one environment to all of its locations.
pub async fn deploy(
    config: &Config,
    identity: &RunIdentity,
    project_root: &Path,
    output: &mut Output,
) -> Result<()> {
    output.start_timer();

    let driver = Driver::with_cli(config, identity, project_root)?;
    let plan = driver.plan();

    output.progress(&format!(
        "Deploying {} to {} location(s) of {}",
        plan.new_app,
        plan.locations.len(),
        plan.environment
    ));

    match driver.run().await {
        Ok(report) => {
            output.report(&report);
            output.success("Deployment complete!");
            Ok(())
        }
        Err(Error::Deploy(failure)) => {
            output.report(&failure.report);
            Err(Error::Deploy(failure))
        }
        Err(e) => Err(e),
    }
}
