// ABOUTME: Application lifecycle operations on a target session.
// ABOUTME: Push, configure, bind, start, verify, route mapping, discovery, and deletion.

use futures::future::join_all;
use snafu::ensure;
use std::fmt;
use tracing::{debug, info};

use super::error::{NotRunningSnafu, PlatformError};
use super::executor::CommandExecutor;
use super::manifest::{EnvVar, PushSpec};
use super::parse;
use super::session::TargetSession;
use crate::types::{AppName, Route};

/// Variable through which a running app learns its location.
pub const LOCATION_VARIABLE: &str = "FOUNDRY_LOCATION";

/// Named platform operations, used to label failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Version,
    Logout,
    SelectEndpoint,
    Login,
    Push,
    SetEnv,
    BindService,
    Start,
    QueryState,
    ListApps,
    MapRoute,
    UnmapRoute,
    RecentLogs,
    Delete,
    AddPluginRepo,
    InstallPlugin,
    PluginCommand,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Version => "version",
            Operation::Logout => "logout",
            Operation::SelectEndpoint => "api",
            Operation::Login => "login",
            Operation::Push => "push",
            Operation::SetEnv => "set-env",
            Operation::BindService => "bind-service",
            Operation::Start => "start",
            Operation::QueryState => "app",
            Operation::ListApps => "apps",
            Operation::MapRoute => "map-route",
            Operation::UnmapRoute => "unmap-route",
            Operation::RecentLogs => "logs",
            Operation::Delete => "delete",
            Operation::AddPluginRepo => "add-plugin-repo",
            Operation::InstallPlugin => "install-plugin",
            Operation::PluginCommand => "plugin command",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<E: CommandExecutor> TargetSession<E> {
    /// Report the CLI version into the log.
    pub async fn version(&self) -> Result<String, PlatformError> {
        self.cf(Operation::Version, &["-v"]).await
    }

    /// Point the session at the target's API endpoint.
    pub async fn select_endpoint(&self) -> Result<(), PlatformError> {
        let api = self.target().api.clone();
        self.cf(Operation::SelectEndpoint, &["api", api.as_str()]).await?;
        Ok(())
    }

    /// Drop any previous session.
    pub async fn logout(&self) -> Result<(), PlatformError> {
        self.cf(Operation::Logout, &["logout"]).await?;
        Ok(())
    }

    /// Log in to the target's org and space.
    pub async fn login(&self) -> Result<(), PlatformError> {
        let target = self.target();
        self.cf_muted(
            Operation::Login,
            &[
                "login",
                "-u",
                target.username.as_str(),
                "-p",
                target.password.expose(),
                "-o",
                target.org.as_str(),
                "-s",
                target.space.as_str(),
            ],
        )
        .await?;
        Ok(())
    }

    /// Establish a fresh session: logout, select the endpoint, then login.
    pub async fn authenticate(&self) -> Result<(), PlatformError> {
        self.logout().await?;
        self.select_endpoint().await?;
        self.login().await
    }

    /// Create the app without starting it.
    pub async fn provision(&self, app: &AppName, spec: &PushSpec) -> Result<(), PlatformError> {
        let instances = spec.instances.to_string();
        let mut args = vec![
            "push",
            app.as_str(),
            "-i",
            instances.as_str(),
            "-m",
            spec.memory.as_str(),
            "-k",
            spec.disk.as_str(),
        ];
        if let Some(command) = &spec.start_command {
            args.extend(["-c", command.as_str()]);
        }
        if let Some(buildpack) = &spec.buildpack {
            args.extend(["-b", buildpack.as_str()]);
        }
        args.push("--no-start");

        self.cf(Operation::Push, &args).await?;
        Ok(())
    }

    /// Set one environment variable, muted when it is sensitive.
    pub async fn set_env(&self, app: &AppName, var: &EnvVar) -> Result<(), PlatformError> {
        let args = ["set-env", app.as_str(), var.name.as_str(), var.value.expose()];
        if var.sensitive {
            debug!(app = %app, variable = %var.name, "setting sensitive variable");
            self.cf_muted(Operation::SetEnv, &args).await?;
        } else {
            self.cf(Operation::SetEnv, &args).await?;
        }
        Ok(())
    }

    /// Apply variables in order, then the location variable.
    pub async fn configure_environment(
        &self,
        app: &AppName,
        variables: &[EnvVar],
    ) -> Result<(), PlatformError> {
        for var in variables {
            self.set_env(app, var).await?;
        }
        let location = EnvVar::new(LOCATION_VARIABLE, self.location().as_str());
        self.set_env(app, &location).await
    }

    pub async fn bind_service(&self, app: &AppName, service: &str) -> Result<(), PlatformError> {
        self.cf(Operation::BindService, &["bind-service", app.as_str(), service])
            .await?;
        Ok(())
    }

    /// Bind every service concurrently. The first failure is returned after all finish.
    pub async fn bind_services(
        &self,
        app: &AppName,
        services: &[String],
    ) -> Result<(), PlatformError> {
        join_all(services.iter().map(|service| self.bind_service(app, service)))
            .await
            .into_iter()
            .collect()
    }

    pub async fn start(&self, app: &AppName) -> Result<(), PlatformError> {
        self.cf(Operation::Start, &["start", app.as_str()]).await?;
        Ok(())
    }

    /// Query the app once and fail unless an instance is running.
    pub async fn verify_running(&self, app: &AppName) -> Result<(), PlatformError> {
        let output = self.cf(Operation::QueryState, &["app", app.as_str()]).await?;
        ensure!(parse::is_running(&output), NotRunningSnafu { app: app.clone() });
        Ok(())
    }

    /// Fetch recent logs of an app for diagnostics.
    pub async fn fetch_recent_logs(&self, app: &AppName) -> Result<String, PlatformError> {
        self.cf(Operation::RecentLogs, &["logs", app.as_str(), "--recent"])
            .await
    }

    /// Find the apps currently answering on `route`, ignoring `exclude`.
    ///
    /// Apps are returned in listing order, so the first one is the answer
    /// for the route.
    pub async fn discover_current_apps(
        &self,
        route: &Route,
        exclude: &AppName,
    ) -> Result<Vec<AppName>, PlatformError> {
        let output = self.cf(Operation::ListApps, &["apps"]).await?;
        let hostname = route.hostname();
        let found: Vec<AppName> = parse::apps_on_route(&output, &hostname)
            .into_iter()
            .filter(|name| *name != exclude.as_str())
            .map(AppName::discovered)
            .collect();

        match found.as_slice() {
            [] => debug!(route = %hostname, "no app on route"),
            apps => {
                for app in apps {
                    info!(route = %hostname, app = %app, "found app on route");
                }
            }
        }
        Ok(found)
    }

    pub async fn map_route(&self, app: &AppName, route: &Route) -> Result<(), PlatformError> {
        let args = route_args("map-route", app, route);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.cf(Operation::MapRoute, &args).await?;
        Ok(())
    }

    pub async fn unmap_route(&self, app: &AppName, route: &Route) -> Result<(), PlatformError> {
        let args = route_args("unmap-route", app, route);
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.cf(Operation::UnmapRoute, &args).await?;
        Ok(())
    }

    /// Delete an app. Mapped routes are released but left in place.
    pub async fn decommission(&self, app: &AppName) -> Result<(), PlatformError> {
        self.cf(Operation::Delete, &["delete", "-f", app.as_str()])
            .await?;
        Ok(())
    }

    pub async fn add_plugin_repo(&self, name: &str, url: &str) -> Result<(), PlatformError> {
        self.cf(Operation::AddPluginRepo, &["add-plugin-repo", name, url])
            .await?;
        Ok(())
    }

    pub async fn install_plugin(
        &self,
        plugin: &str,
        repo: Option<&str>,
    ) -> Result<(), PlatformError> {
        let mut args = vec!["install-plugin", plugin];
        if let Some(repo) = repo {
            args.extend(["-r", repo]);
        }
        args.push("-f");
        self.cf(Operation::InstallPlugin, &args).await?;
        Ok(())
    }

    /// Run an app-scoped plugin command such as `enable-diego <app>`.
    pub async fn run_plugin_command(
        &self,
        command: &str,
        app: &AppName,
    ) -> Result<(), PlatformError> {
        self.cf(Operation::PluginCommand, &[command, app.as_str()])
            .await?;
        Ok(())
    }
}

fn route_args(subcommand: &str, app: &AppName, route: &Route) -> Vec<String> {
    let mut args = vec![
        subcommand.to_string(),
        app.to_string(),
        route.domain.clone(),
    ];
    if let Some(host) = &route.host {
        args.push("-n".to_string());
        args.push(host.clone());
    }
    args
}
