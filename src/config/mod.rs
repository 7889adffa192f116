// ABOUTME: Configuration types and parsing for foundry.yml.
// ABOUTME: Describes foundry targets, environments, and optional platform capabilities.

mod deserialize;
mod env_value;

pub use env_value::{EnvValue, is_sensitive};

use crate::deploy::CutoverStrategy;
use crate::error::{Error, Result};
use crate::types::{AppName, Location};
use deserialize::{deserialize_base_name, deserialize_locations};
use nonempty::NonEmpty;
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILENAME: &str = "foundry.yml";
pub const CONFIG_FILENAME_ALT: &str = "foundry.yaml";
pub const CONFIG_FILENAME_DIR: &str = ".foundry/config.yml";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,

    #[serde(default)]
    pub cli: CliConfig,

    #[serde(default)]
    pub capabilities: Vec<CapabilityConfig>,

    pub targets: HashMap<String, TargetConfig>,

    pub environments: HashMap<String, EnvironmentConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Base name every deployed app name starts with.
    #[serde(deserialize_with = "deserialize_base_name")]
    pub name: AppName,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    #[serde(default = "default_binary")]
    pub binary: PathBuf,

    #[serde(default = "default_command_timeout", with = "humantime_serde")]
    pub command_timeout: Duration,
}

impl Default for CliConfig {
    fn default() -> Self {
        CliConfig {
            binary: default_binary(),
            command_timeout: default_command_timeout(),
        }
    }
}

fn default_binary() -> PathBuf {
    PathBuf::from("cf")
}

fn default_command_timeout() -> Duration {
    Duration::from_secs(15 * 60)
}

/// An optional platform feature enabled on each new app, best-effort.
#[derive(Debug, Clone, Deserialize)]
pub struct CapabilityConfig {
    #[serde(default)]
    pub repo: Option<PluginRepoConfig>,

    #[serde(default)]
    pub plugin: Option<String>,

    /// Plugin command run as `<command> <new app>`.
    #[serde(default)]
    pub command: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PluginRepoConfig {
    pub name: String,
    pub url: String,
}

/// One foundry account a location deploys into.
#[derive(Debug, Clone, Deserialize)]
pub struct TargetConfig {
    pub api: String,

    /// Directory holding this target's isolated CLI session (`CF_HOME`).
    pub home: PathBuf,

    pub username: String,

    pub password: EnvValue,

    pub org: String,

    /// Profile name -> space on this foundry.
    #[serde(default)]
    pub spaces: HashMap<String, String>,

    /// Routing domain shared by apps on this foundry.
    pub domain: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EnvironmentConfig {
    /// Profile used to pick the space on each target. Defaults to the environment name.
    #[serde(default)]
    pub profile: Option<String>,

    #[serde(default)]
    pub variables: BTreeMap<String, EnvValue>,

    /// Hostname registered on each target's own domain.
    pub endpoint: String,

    pub route: StableRouteConfig,

    #[serde(deserialize_with = "deserialize_locations")]
    pub locations: NonEmpty<Location>,

    #[serde(default = "default_instances")]
    pub instances: u32,

    #[serde(default = "default_memory")]
    pub memory: String,

    #[serde(default = "default_disk")]
    pub disk: String,

    #[serde(default)]
    pub start_command: Option<String>,

    #[serde(default)]
    pub buildpack: Option<String>,

    #[serde(default)]
    pub services: Vec<String>,

    #[serde(default)]
    pub custom_domains: Vec<String>,

    #[serde(default)]
    pub cutover: CutoverStrategy,
}

/// The externally visible route that always points at the current app.
#[derive(Debug, Clone, Deserialize)]
pub struct StableRouteConfig {
    pub host: String,
    pub domain: String,

    /// Map `host.domain` as a bare domain instead of a hostname on `domain`.
    #[serde(default)]
    pub bare: bool,
}

fn default_instances() -> u32 {
    1
}

fn default_memory() -> String {
    "512M".to_string()
}

fn default_disk() -> String {
    "1G".to_string()
}

impl EnvironmentConfig {
    pub fn profile<'a>(&'a self, environment: &'a str) -> &'a str {
        self.profile.as_deref().unwrap_or(environment)
    }
}

impl Config {
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn discover(dir: &Path) -> Result<Self> {
        let candidates = [
            dir.join(CONFIG_FILENAME),
            dir.join(CONFIG_FILENAME_ALT),
            dir.join(CONFIG_FILENAME_DIR),
        ];

        for path in &candidates {
            if path.exists() {
                return Self::load(path);
            }
        }

        Err(Error::ConfigNotFound(dir.to_path_buf()))
    }

    /// Check cross references between environments and targets.
    pub fn validate(&self) -> Result<()> {
        let mut names: Vec<_> = self.environments.keys().collect();
        names.sort();

        for name in names {
            let environment = &self.environments[name];
            let profile = environment.profile(name);

            let mut homes: HashMap<&Path, &Location> = HashMap::new();

            for location in environment.locations.iter() {
                let target = self.targets.get(location.as_str()).ok_or_else(|| {
                    Error::InvalidConfig(format!(
                        "environment '{}' deploys to unknown location '{}'",
                        name, location
                    ))
                })?;

                // Concurrent locations each need their own CLI session home.
                if let Some(other) = homes.insert(target.home.as_path(), location) {
                    return Err(Error::InvalidConfig(if other == location {
                        format!(
                            "environment '{}' lists location '{}' more than once",
                            name, location
                        )
                    } else {
                        format!(
                            "locations '{}' and '{}' share home '{}'",
                            other,
                            location,
                            target.home.display()
                        )
                    }));
                }

                if !target.spaces.contains_key(profile) {
                    return Err(Error::InvalidConfig(format!(
                        "target '{}' has no space for profile '{}'",
                        location, profile
                    )));
                }
            }

            if environment.instances == 0 {
                return Err(Error::InvalidConfig(format!(
                    "environment '{}' must run at least one instance",
                    name
                )));
            }
        }

        Ok(())
    }

    pub fn environment(&self, name: &str) -> Result<&EnvironmentConfig> {
        self.environments
            .get(name)
            .ok_or_else(|| Error::UnknownEnvironment(name.to_string()))
    }

    pub fn target(&self, location: &Location) -> Result<&TargetConfig> {
        self.targets.get(location.as_str()).ok_or_else(|| {
            Error::InvalidConfig(format!("no target configured for location '{}'", location))
        })
    }
}
