// ABOUTME: Platform boundary: the Cloud Foundry CLI and the operations built on it.
// ABOUTME: Exposes the executor seam, per-target sessions, and lifecycle operations.

mod error;
mod executor;
mod manifest;
mod ops;
mod parse;
mod session;

pub use error::{CommandError, PlatformError};
pub use executor::{CfCli, CommandExecutor, CommandLine, ExecOptions, SessionContext};
pub use manifest::{EnvVar, PushSpec};
pub use ops::Operation;
pub use parse::{apps_on_route, instance_states, is_running};
pub use session::{Target, TargetSession};
