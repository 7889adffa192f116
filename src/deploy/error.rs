// ABOUTME: Error types for deployment operations.
// ABOUTME: Covers fatal per-location failures and the aggregate environment failure.

use std::fmt;

use super::environment::DeploymentReport;
use crate::platform::{CommandError, PlatformError};

/// Fatal failure of one location's deployment.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    /// A platform operation failed or the new app did not come up.
    #[error(transparent)]
    Platform(#[from] PlatformError),

    /// At least one route could not be switched to the new app.
    #[error("cutover failed for {failed} of {total} route(s): {source}")]
    Cutover {
        failed: usize,
        total: usize,
        #[source]
        source: PlatformError,
    },
}

/// Error kind for programmatic handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployErrorKind {
    /// An external command exited non-zero, timed out, or could not run.
    CommandFailure,
    /// The new app failed health verification.
    NotRunning,
}

impl DeployError {
    pub fn kind(&self) -> DeployErrorKind {
        match self {
            DeployError::Platform(PlatformError::NotRunning { .. }) => DeployErrorKind::NotRunning,
            DeployError::Platform(PlatformError::Command { .. })
            | DeployError::Cutover { .. } => DeployErrorKind::CommandFailure,
        }
    }

    /// The underlying command failure, if any.
    pub fn command_error(&self) -> Option<&CommandError> {
        match self {
            DeployError::Platform(PlatformError::Command { source, .. })
            | DeployError::Cutover {
                source: PlatformError::Command { source, .. },
                ..
            } => Some(source),
            DeployError::Platform(PlatformError::NotRunning { .. })
            | DeployError::Cutover { .. } => None,
        }
    }
}

/// Deployment failed in at least one location.
///
/// Carries the full report, including locations that succeeded.
#[derive(Debug)]
pub struct DeploymentFailure {
    pub report: DeploymentReport,
}

impl fmt::Display for DeploymentFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failed: Vec<_> = self.report.failures().collect();
        write!(
            f,
            "deployment of {} failed in {} of {} location(s)",
            self.report.new_app,
            failed.len(),
            self.report.outcomes.len()
        )?;
        for outcome in failed {
            write!(f, "; {}", outcome.location)?;
            if let Some(error) = &outcome.error {
                write!(f, ": {}", error)?;
            }
        }
        Ok(())
    }
}

impl std::error::Error for DeploymentFailure {}
