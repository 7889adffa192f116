// ABOUTME: Deployment state marker types for the type state pattern.
// ABOUTME: Markers enforce valid transitions at compile time; Phase names them at runtime.

use serde::Serialize;
use std::fmt;

use super::error::DeployError;
use crate::types::{AppName, Route};

/// Initial state: nothing created yet.
/// Available actions: `provision()`, `rollback()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Idle;

/// Provisioned: new app pushed, stopped.
/// Available actions: `configure()`, `rollback()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Provisioned;

/// Configured: optional capabilities set up.
/// Available actions: `start()`, `rollback()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Configured;

/// Started: variables applied, services bound, app started.
/// Available actions: `verify()`, `rollback()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Started;

/// Healthy: new app verified running.
/// Available actions: `cutover()`, `rollback()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Healthy;

/// A route and the app it was taken from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteBinding {
    pub route: Route,
    pub app: AppName,
}

impl RouteBinding {
    pub fn new(route: Route, app: AppName) -> Self {
        Self { route, app }
    }
}

/// Cutover failed midway. Holds the routes already taken from their apps.
/// Available actions: `rollback()`
#[derive(Debug, Clone, Default)]
pub struct PartiallyCutOver {
    pub(crate) restore: Vec<RouteBinding>,
}

impl PartiallyCutOver {
    /// Routes that must be given back, each to the app that lost it.
    pub fn routes_to_restore(&self) -> &[RouteBinding] {
        &self.restore
    }
}

/// Cut over: every route serves the new app.
/// Available actions: `retire()`
#[derive(Debug, Clone, Copy, Default)]
pub struct CutOver;

/// Done: old app retired.
/// Available actions: `finish()`
#[derive(Debug, Clone, Copy, Default)]
pub struct Done;

/// Failed: rolled back after a fatal error.
/// Available actions: `finish()`
#[derive(Debug)]
pub struct Failed {
    pub(crate) cause: DeployError,
    pub(crate) during: Phase,
}

impl Failed {
    pub fn cause(&self) -> &DeployError {
        &self.cause
    }

    /// Phase that was running when the fatal error happened.
    pub fn during(&self) -> Phase {
        self.during
    }
}

pub(crate) mod sealed {
    pub trait Sealed {}

    impl Sealed for super::Idle {}
    impl Sealed for super::Provisioned {}
    impl Sealed for super::Configured {}
    impl Sealed for super::Started {}
    impl Sealed for super::Healthy {}
    impl Sealed for super::PartiallyCutOver {}
}

/// States from which the new app can still be rolled back.
///
/// Sealed: `CutOver` and `Done` never implement it.
pub trait Revertible: sealed::Sealed {
    /// Routes to re-map before the new app is removed.
    fn routes_to_restore(&self) -> &[RouteBinding] {
        &[]
    }
}

impl Revertible for Idle {}
impl Revertible for Provisioned {}
impl Revertible for Configured {}
impl Revertible for Started {}
impl Revertible for Healthy {}

impl Revertible for PartiallyCutOver {
    fn routes_to_restore(&self) -> &[RouteBinding] {
        &self.restore
    }
}

/// Runtime phase marker of a location's deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Phase {
    Idle,
    Provisioning,
    Configuring,
    Starting,
    Verifying,
    Healthy,
    CuttingOver,
    Decommissioning,
    Done,
    RollingBack,
    Failed,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Provisioning => "provisioning",
            Phase::Configuring => "configuring",
            Phase::Starting => "starting",
            Phase::Verifying => "verifying",
            Phase::Healthy => "healthy",
            Phase::CuttingOver => "cutting-over",
            Phase::Decommissioning => "decommissioning",
            Phase::Done => "done",
            Phase::RollingBack => "rolling-back",
            Phase::Failed => "failed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
