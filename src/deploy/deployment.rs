// ABOUTME: Generic deployment struct parameterized by state marker.
// ABOUTME: Holds one location's run state: plan, discovered old app, phase, and diagnostics.

use std::sync::Arc;

use super::plan::LocationPlan;
use super::state::{Idle, Phase};
use crate::diagnostics::Diagnostics;
use crate::types::{AppName, Location};

/// A location's deployment in progress, parameterized by its current state.
///
/// The old app is discovered at cutover and only ever differs from the new app.
#[derive(Debug)]
pub struct Deployment<S> {
    pub(crate) plan: Arc<LocationPlan>,
    pub(crate) old_app: Option<AppName>,
    pub(crate) phase: Phase,
    pub(crate) diagnostics: Diagnostics,
    pub(crate) state: S,
}

impl Deployment<Idle> {
    pub fn new(plan: Arc<LocationPlan>) -> Self {
        Deployment {
            plan,
            old_app: None,
            phase: Phase::Idle,
            diagnostics: Diagnostics::default(),
            state: Idle,
        }
    }
}

impl<S> Deployment<S> {
    pub fn location(&self) -> &Location {
        &self.plan.location
    }

    pub fn new_app(&self) -> &AppName {
        &self.plan.new_app
    }

    /// App that served the stable routes before this run (None until discovered).
    pub fn old_app(&self) -> Option<&AppName> {
        self.old_app.as_ref()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn plan(&self) -> &LocationPlan {
        &self.plan
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn state(&self) -> &S {
        &self.state
    }
}
