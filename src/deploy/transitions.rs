// ABOUTME: State transition methods for deployment orchestration.
// ABOUTME: Each method consumes self and returns the next state on success.

use futures::future::join_all;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::Deployment;
use super::error::DeployError;
use super::location::LocationOutcome;
use super::state::{
    Configured, CutOver, Done, Failed, Healthy, Idle, PartiallyCutOver, Phase, Provisioned,
    Revertible, RouteBinding, Started,
};
use super::strategy::CutoverStrategy;
use crate::diagnostics::{BestEffortFailure, BestEffortStep};
use crate::platform::{CommandExecutor, PlatformError, TargetSession};
use crate::types::{AppName, Route};

/// Result type for transitions that may need rollback on failure.
pub type TransitionResult<T, S> = Result<Deployment<T>, (Deployment<S>, DeployError)>;

// =============================================================================
// Internal Helpers
// =============================================================================

impl<S> Deployment<S> {
    /// Move to a new state, carrying the run state along.
    fn transition<T>(self, state: T, phase: Phase) -> Deployment<T> {
        Deployment {
            plan: self.plan,
            old_app: self.old_app,
            phase,
            diagnostics: self.diagnostics,
            state,
        }
    }

    /// Advance on success, or hand self back with the error for rollback.
    fn settle<T>(
        self,
        result: Result<(), PlatformError>,
        state: T,
        phase: Phase,
    ) -> TransitionResult<T, S> {
        match result {
            Ok(()) => Ok(self.transition(state, phase)),
            Err(e) => Err((self, e.into())),
        }
    }
}

/// Apps found on the stable routes before cutover.
#[derive(Debug, Default)]
struct Discovery {
    /// App retired once cutover succeeds.
    old_app: Option<AppName>,
    /// Every app seen on a queried route.
    owners: Vec<RouteBinding>,
    queried: Vec<Route>,
}

impl Discovery {
    /// Apps that must lose `route` once the new app has it.
    ///
    /// Queried routes are taken from whatever was found on them. Other routes
    /// are assumed to belong to the old app.
    fn owners_of(&self, route: &Route) -> Vec<RouteBinding> {
        if self.queried.contains(route) {
            self.owners
                .iter()
                .filter(|binding| binding.route == *route)
                .cloned()
                .collect()
        } else {
            self.old_app
                .iter()
                .map(|app| RouteBinding::new(route.clone(), app.clone()))
                .collect()
        }
    }
}

/// Outcome of switching a set of routes.
#[derive(Debug, Default)]
struct RouteSwitch {
    /// Routes taken from the apps that served them.
    unmapped: Vec<RouteBinding>,
    failures: Vec<PlatformError>,
}

impl RouteSwitch {
    fn merge(&mut self, other: RouteSwitch) {
        self.unmapped.extend(other.unmapped);
        self.failures.extend(other.failures);
    }
}

/// Map one route to the new app, then take it from its previous owners.
async fn switch_route<E: CommandExecutor>(
    session: &TargetSession<E>,
    new_app: &AppName,
    route: &Route,
    owners: Vec<RouteBinding>,
) -> RouteSwitch {
    let mut switch = RouteSwitch::default();
    if let Err(e) = session.map_route(new_app, route).await {
        switch.failures.push(e);
        return switch;
    }
    for owner in owners {
        match session.unmap_route(&owner.app, &owner.route).await {
            Ok(()) => switch.unmapped.push(owner),
            Err(e) => {
                switch.failures.push(e);
                break;
            }
        }
    }
    switch
}

async fn switch_interleaved<E: CommandExecutor>(
    session: &TargetSession<E>,
    new_app: &AppName,
    discovery: &Discovery,
    routes: &[Route],
) -> RouteSwitch {
    let switches = join_all(
        routes
            .iter()
            .map(|route| switch_route(session, new_app, route, discovery.owners_of(route))),
    )
    .await;

    let mut switch = RouteSwitch::default();
    for one in switches {
        switch.merge(one);
    }
    switch
}

async fn switch_two_phase<E: CommandExecutor>(
    session: &TargetSession<E>,
    new_app: &AppName,
    discovery: &Discovery,
    routes: &[Route],
) -> RouteSwitch {
    let mapped = join_all(routes.iter().map(|route| session.map_route(new_app, route))).await;
    let failures: Vec<_> = mapped.into_iter().filter_map(Result::err).collect();
    if !failures.is_empty() {
        return RouteSwitch {
            unmapped: Vec::new(),
            failures,
        };
    }

    let owners: Vec<RouteBinding> = routes
        .iter()
        .flat_map(|route| discovery.owners_of(route))
        .collect();
    let results = join_all(
        owners
            .iter()
            .map(|owner| session.unmap_route(&owner.app, &owner.route)),
    )
    .await;

    let mut switch = RouteSwitch::default();
    for (owner, result) in owners.into_iter().zip(results) {
        match result {
            Ok(()) => switch.unmapped.push(owner),
            Err(e) => switch.failures.push(e),
        }
    }
    switch
}

// =============================================================================
// Idle -> Provisioned
// =============================================================================

impl Deployment<Idle> {
    /// Open a fresh session and push the new app without starting it.
    ///
    /// # Errors
    ///
    /// Returns `(self, error)` if any command fails, so the caller can roll back.
    #[must_use = "deployment state must be used"]
    pub async fn provision<E: CommandExecutor>(
        mut self,
        session: &TargetSession<E>,
    ) -> TransitionResult<Provisioned, Idle> {
        self.phase = Phase::Provisioning;
        let plan = Arc::clone(&self.plan);

        let result = async {
            let version = session.version().await?;
            debug!(version = version.trim(), "platform cli");
            session.authenticate().await?;
            info!(app = %plan.new_app, space = %session.target().space, "provisioning");
            session.provision(&plan.new_app, &plan.push).await
        }
        .await;

        self.settle(result, Provisioned, Phase::Provisioning)
    }
}

// =============================================================================
// Provisioned -> Configured
// =============================================================================

impl Deployment<Provisioned> {
    /// Set up optional platform capabilities. Failures are recorded, never fatal.
    #[must_use = "deployment state must be used"]
    pub async fn configure<E: CommandExecutor>(
        mut self,
        session: &TargetSession<E>,
    ) -> Deployment<Configured> {
        self.phase = Phase::Configuring;
        let plan = Arc::clone(&self.plan);

        for capability in &plan.capabilities {
            if let Some(repo) = &capability.repo {
                let result = session.add_plugin_repo(&repo.name, &repo.url).await;
                self.diagnostics
                    .absorb(BestEffortStep::CapabilitySetup, result);
            }
            if let Some(plugin) = &capability.plugin {
                let repo = capability.repo.as_ref().map(|r| r.name.as_str());
                let result = session.install_plugin(plugin, repo).await;
                self.diagnostics
                    .absorb(BestEffortStep::CapabilitySetup, result);
            }
            if let Some(command) = &capability.command {
                let result = session.run_plugin_command(command, &plan.new_app).await;
                self.diagnostics
                    .absorb(BestEffortStep::CapabilitySetup, result);
            }
        }

        self.transition(Configured, Phase::Configuring)
    }
}

// =============================================================================
// Configured -> Started
// =============================================================================

impl Deployment<Configured> {
    /// Apply variables, bind services, then start the app.
    ///
    /// # Errors
    ///
    /// Returns `(self, error)` on the first failed command.
    #[must_use = "deployment state must be used"]
    pub async fn start<E: CommandExecutor>(
        mut self,
        session: &TargetSession<E>,
    ) -> TransitionResult<Started, Configured> {
        self.phase = Phase::Starting;
        let plan = Arc::clone(&self.plan);

        let result = async {
            session
                .configure_environment(&plan.new_app, &plan.variables)
                .await?;
            session.bind_services(&plan.new_app, &plan.services).await?;
            session.start(&plan.new_app).await
        }
        .await;

        self.settle(result, Started, Phase::Starting)
    }
}

// =============================================================================
// Started -> Healthy
// =============================================================================

impl Deployment<Started> {
    /// Query the app once and require a running instance.
    ///
    /// # Errors
    ///
    /// Returns `(self, error)` if the query fails or nothing is running.
    #[must_use = "deployment state must be used"]
    pub async fn verify<E: CommandExecutor>(
        mut self,
        session: &TargetSession<E>,
    ) -> TransitionResult<Healthy, Started> {
        self.phase = Phase::Verifying;
        let result = session.verify_running(&self.plan.new_app).await;
        self.settle(result, Healthy, Phase::Healthy)
    }
}

// =============================================================================
// Healthy -> CutOver
// =============================================================================

impl Deployment<Healthy> {
    /// Find the apps currently on the stable routes, ignoring the new one.
    ///
    /// Routes are queried in priority order and the first app found becomes
    /// the old app. Any other app found is recorded as a diagnostic and only
    /// loses the route it was found on.
    async fn discover_old_app<E: CommandExecutor>(
        &mut self,
        session: &TargetSession<E>,
    ) -> Result<Discovery, PlatformError> {
        let plan = Arc::clone(&self.plan);
        let mut discovery = Discovery::default();

        for route in &plan.discovery_routes {
            let apps = session.discover_current_apps(route, &plan.new_app).await?;
            discovery.queried.push(route.clone());

            for app in apps {
                let kept = discovery.old_app.get_or_insert_with(|| app.clone());
                if *kept != app {
                    self.diagnostics.record(BestEffortFailure::ambiguous_discovery(
                        kept.as_str(),
                        app.as_str(),
                    ));
                }
                discovery.owners.push(RouteBinding::new(route.clone(), app));
            }
        }

        Ok(discovery)
    }

    /// Move every route from the apps serving it to the new one.
    ///
    /// # Errors
    ///
    /// On any failed map or unmap, returns a partially cut over deployment
    /// that remembers which routes were already taken and from whom.
    #[must_use = "deployment state must be used"]
    pub async fn cutover<E: CommandExecutor>(
        mut self,
        session: &TargetSession<E>,
    ) -> TransitionResult<CutOver, PartiallyCutOver> {
        self.phase = Phase::CuttingOver;
        let plan = Arc::clone(&self.plan);

        let discovery = match self.discover_old_app(session).await {
            Ok(discovery) => discovery,
            Err(e) => {
                let partial = self.transition(PartiallyCutOver::default(), Phase::CuttingOver);
                return Err((partial, e.into()));
            }
        };
        self.old_app = discovery.old_app.clone();

        match &discovery.old_app {
            Some(old_app) => info!(
                old_app = %old_app,
                strategy = %plan.cutover,
                "switching {} route(s)",
                plan.routes.len()
            ),
            None => info!("no current app, mapping {} route(s)", plan.routes.len()),
        }

        let switch = match plan.cutover {
            CutoverStrategy::Interleaved => {
                switch_interleaved(session, &plan.new_app, &discovery, &plan.routes).await
            }
            CutoverStrategy::TwoPhase => {
                switch_two_phase(session, &plan.new_app, &discovery, &plan.routes).await
            }
        };

        let RouteSwitch {
            unmapped,
            mut failures,
        } = switch;

        if failures.is_empty() {
            return Ok(self.transition(CutOver, Phase::CuttingOver));
        }

        let error = DeployError::Cutover {
            failed: failures.len(),
            total: plan.routes.len(),
            source: failures.swap_remove(0),
        };
        let partial = self.transition(PartiallyCutOver { restore: unmapped }, Phase::CuttingOver);
        Err((partial, error))
    }
}

// =============================================================================
// Rollback (any state before cutover completes)
// =============================================================================

impl<S: Revertible> Deployment<S> {
    /// Give routes back to their apps, collect logs, and delete the new app.
    ///
    /// Every step is best-effort; the original error is kept as the cause.
    #[must_use = "deployment state must be used"]
    pub async fn rollback<E: CommandExecutor>(
        mut self,
        session: &TargetSession<E>,
        cause: DeployError,
    ) -> Deployment<Failed> {
        let during = self.phase;
        self.phase = Phase::RollingBack;
        let plan = Arc::clone(&self.plan);
        warn!(app = %plan.new_app, phase = %during, error = %cause, "rolling back");

        for binding in self.state.routes_to_restore() {
            info!(route = %binding.route, app = %binding.app, "restoring route");
            let result = session.map_route(&binding.app, &binding.route).await;
            self.diagnostics.absorb(BestEffortStep::RouteRestore, result);
        }

        let logs = session.fetch_recent_logs(&plan.new_app).await;
        self.diagnostics.absorb(BestEffortStep::LogFetch, logs);

        let deleted = session.decommission(&plan.new_app).await;
        self.diagnostics.absorb(BestEffortStep::Decommission, deleted);

        self.transition(Failed { cause, during }, Phase::Failed)
    }
}

// =============================================================================
// CutOver -> Done
// =============================================================================

impl Deployment<CutOver> {
    /// Delete the old app, if there was one. Failure is recorded, never fatal.
    #[must_use = "deployment state must be used"]
    pub async fn retire<E: CommandExecutor>(mut self, session: &TargetSession<E>) -> Deployment<Done> {
        self.phase = Phase::Decommissioning;

        if let Some(old_app) = self.old_app.clone() {
            info!(app = %old_app, "decommissioning previous app");
            let result = session.decommission(&old_app).await;
            self.diagnostics.absorb(BestEffortStep::Decommission, result);
        }

        self.transition(Done, Phase::Done)
    }
}

// =============================================================================
// Terminal States
// =============================================================================

impl Deployment<Done> {
    /// Consume the deployment and report its outcome.
    pub fn finish(self) -> LocationOutcome {
        LocationOutcome {
            location: self.plan.location.clone(),
            new_app: self.plan.new_app.clone(),
            old_app: self.old_app,
            phase: self.phase,
            failed_during: None,
            error: None,
            warnings: self.diagnostics.into_failures(),
        }
    }
}

impl Deployment<Failed> {
    /// Consume the deployment and report its outcome.
    pub fn finish(self) -> LocationOutcome {
        LocationOutcome {
            location: self.plan.location.clone(),
            new_app: self.plan.new_app.clone(),
            old_app: self.old_app,
            phase: self.phase,
            failed_during: Some(self.state.during),
            error: Some(self.state.cause),
            warnings: self.diagnostics.into_failures(),
        }
    }
}
