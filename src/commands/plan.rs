// ABOUTME: Plan command implementation.
// ABOUTME: Prints the resolved deployment plan without contacting any foundry.

use foundry_deploy::config::Config;
use foundry_deploy::driver::{Driver, RunIdentity};
use foundry_deploy::error::Result;
use foundry_deploy::output::Output;
use std::env;

pub fn plan(config: &Config, identity: &RunIdentity, output: &Output) -> Result<()> {
    let driver = Driver::with_cli(config, identity, &env::current_dir()?)?;
    output.plan(driver.plan());
    Ok(())
}
