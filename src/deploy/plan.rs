// ABOUTME: Resolved deployment plan for one environment and its locations.
// ABOUTME: All configuration values and secrets are resolved once, before any command runs.

use std::sync::Arc;

use super::strategy::CutoverStrategy;
use crate::config::{CapabilityConfig, Config, EnvironmentConfig, TargetConfig};
use crate::error::{Error, Result};
use crate::platform::{EnvVar, PushSpec, Target};
use crate::types::{AppName, Location, Route, Secret};

/// Everything one location needs to run its deployment.
#[derive(Debug, Clone)]
pub struct LocationPlan {
    pub location: Location,
    pub target: Target,
    pub new_app: AppName,
    pub push: PushSpec,
    /// Configured variables in name order. The location variable is added by the session.
    pub variables: Vec<EnvVar>,
    pub services: Vec<String>,
    pub capabilities: Vec<CapabilityConfig>,
    /// Routes queried for the current app, in priority order.
    pub discovery_routes: Vec<Route>,
    /// Routes switched to the new app, without duplicates.
    pub routes: Vec<Route>,
    pub cutover: CutoverStrategy,
}

/// Plan for one run across every location of an environment.
#[derive(Debug, Clone)]
pub struct EnvironmentPlan {
    pub environment: String,
    pub new_app: AppName,
    pub locations: Vec<Arc<LocationPlan>>,
}

impl EnvironmentPlan {
    /// Resolve an environment of `config` into per-location plans.
    pub fn resolve(config: &Config, environment: &str, new_app: AppName) -> Result<Self> {
        let env_config = config.environment(environment)?;
        let profile = env_config.profile(environment);

        let variables = env_config
            .variables
            .iter()
            .map(|(name, value)| value.resolve().map(|v| EnvVar::new(name.clone(), v)))
            .collect::<Result<Vec<_>>>()?;

        let push = PushSpec {
            instances: env_config.instances,
            memory: env_config.memory.clone(),
            disk: env_config.disk.clone(),
            start_command: env_config.start_command.clone(),
            buildpack: env_config.buildpack.clone(),
        };

        let mut locations = Vec::with_capacity(env_config.locations.len());
        for location in env_config.locations.iter() {
            let target = resolve_target(config.target(location)?, location, profile)?;
            let (discovery_routes, routes) = route_set(env_config, &target.domain);

            locations.push(Arc::new(LocationPlan {
                location: location.clone(),
                target,
                new_app: new_app.clone(),
                push: push.clone(),
                variables: variables.clone(),
                services: env_config.services.clone(),
                capabilities: config.capabilities.clone(),
                discovery_routes,
                routes,
                cutover: env_config.cutover,
            }));
        }

        Ok(EnvironmentPlan {
            environment: environment.to_string(),
            new_app,
            locations,
        })
    }
}

fn resolve_target(target: &TargetConfig, location: &Location, profile: &str) -> Result<Target> {
    let space = target.spaces.get(profile).ok_or_else(|| {
        Error::InvalidConfig(format!(
            "target '{}' has no space for profile '{}'",
            location, profile
        ))
    })?;

    Ok(Target {
        api: target.api.clone(),
        home: target.home.clone(),
        username: target.username.clone(),
        password: Secret::new(target.password.resolve()?),
        org: target.org.clone(),
        space: space.clone(),
        domain: target.domain.clone(),
    })
}

/// Discovery routes and the full switch set for one location's domain.
fn route_set(env: &EnvironmentConfig, target_domain: &str) -> (Vec<Route>, Vec<Route>) {
    let endpoint = Route::new(target_domain, env.endpoint.as_str());
    let base = if env.route.bare {
        Route::bare(format!("{}.{}", env.route.host, env.route.domain))
    } else {
        Route::new(env.route.domain.as_str(), env.route.host.as_str())
    };

    let mut discovery = vec![endpoint.clone()];
    if base != endpoint {
        discovery.push(base.clone());
    }

    let mut routes: Vec<Route> = Vec::new();
    let candidates = [endpoint, base]
        .into_iter()
        .chain(env.custom_domains.iter().map(|d| Route::bare(d.as_str())));
    for route in candidates {
        if !routes.contains(&route) {
            routes.push(route);
        }
    }

    (discovery, routes)
}
