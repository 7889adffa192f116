// ABOUTME: Resolved app settings handed to push and set-env.
// ABOUTME: Sizing, start command, buildpack, and environment variables.

use crate::types::Secret;

/// Settings for creating a new app with `push`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushSpec {
    pub instances: u32,
    pub memory: String,
    pub disk: String,
    pub start_command: Option<String>,
    pub buildpack: Option<String>,
}

/// One resolved environment variable for the new app.
#[derive(Debug, Clone)]
pub struct EnvVar {
    pub name: String,
    pub value: Secret,
    /// Applied with output muted.
    pub sensitive: bool,
}

impl EnvVar {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        let name = name.into();
        let sensitive = crate::config::is_sensitive(&name);
        Self {
            name,
            value: Secret::new(value),
            sensitive,
        }
    }
}
