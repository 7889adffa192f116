// ABOUTME: Deployment orchestration using the type state pattern.
// ABOUTME: Per-location state machine, environment fan-out, and their results.

mod deployment;
mod environment;
mod error;
mod location;
mod plan;
mod state;
mod strategy;
mod transitions;

pub use deployment::Deployment;
pub use environment::{DeploymentReport, deploy};
pub use error::{DeployError, DeployErrorKind, DeploymentFailure};
pub use location::{LocationOutcome, OutcomeSummary, run_location};
pub use plan::{EnvironmentPlan, LocationPlan};
pub use state::{
    Configured, CutOver, Done, Failed, Healthy, Idle, PartiallyCutOver, Phase, Provisioned,
    Revertible, RouteBinding, Started,
};
pub use strategy::CutoverStrategy;
pub use transitions::TransitionResult;
