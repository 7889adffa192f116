// ABOUTME: Diagnostics accumulator for best-effort steps during deployment.
// ABOUTME: Records failures that are logged but never fail a location's deployment.

use std::fmt;

/// Collects best-effort failures for one location.
#[derive(Debug, Default)]
pub struct Diagnostics {
    failures: Vec<BestEffortFailure>,
}

impl Diagnostics {
    /// Record a failure, auto-logging it via tracing.
    pub fn record(&mut self, failure: BestEffortFailure) {
        tracing::warn!(step = %failure.step, "ignoring failure: {}", failure.message);
        self.failures.push(failure);
    }

    /// Keep the value of a best-effort step, or record its error and carry on.
    pub fn absorb<T, E: fmt::Display>(
        &mut self,
        step: BestEffortStep,
        result: Result<T, E>,
    ) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(e) => {
                self.record(BestEffortFailure::new(step, e.to_string()));
                None
            }
        }
    }

    pub fn failures(&self) -> &[BestEffortFailure] {
        &self.failures
    }

    pub fn into_failures(self) -> Vec<BestEffortFailure> {
        self.failures
    }
}

/// A failure in a step whose outcome never decides the deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BestEffortFailure {
    pub step: BestEffortStep,
    pub message: String,
}

impl BestEffortFailure {
    pub fn new(step: BestEffortStep, message: impl Into<String>) -> Self {
        Self {
            step,
            message: message.into(),
        }
    }

    /// Stable routes answered with different apps. Only the first is retired.
    pub fn ambiguous_discovery(retired: &str, other: &str) -> Self {
        Self::new(
            BestEffortStep::RouteDiscovery,
            format!("routes point at different apps: retiring {retired}, only unmapping {other}"),
        )
    }
}

impl fmt::Display for BestEffortFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.step, self.message)
    }
}

/// Steps whose failures are tolerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BestEffortStep {
    /// Optional platform capability (plugin repo, plugin, plugin command).
    CapabilitySetup,
    /// Recent log fetch for diagnostics.
    LogFetch,
    /// App deletion.
    Decommission,
    /// Re-mapping routes back to the old app during rollback.
    RouteRestore,
    /// Conflicting answers while discovering the old app.
    RouteDiscovery,
}

impl fmt::Display for BestEffortStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BestEffortStep::CapabilitySetup => "capability setup",
            BestEffortStep::LogFetch => "log fetch",
            BestEffortStep::Decommission => "decommission",
            BestEffortStep::RouteRestore => "route restore",
            BestEffortStep::RouteDiscovery => "route discovery",
        };
        f.write_str(name)
    }
}
