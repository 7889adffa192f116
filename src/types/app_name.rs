// ABOUTME: Application name validation and per-run name composition.
// ABOUTME: New app names combine base name, environment, revision, and timestamp.

use std::fmt;
use thiserror::Error;

/// Longest application name accepted by the platform.
const MAX_LEN: usize = 128;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AppNameError {
    #[error("app name cannot be empty")]
    Empty,

    #[error("app name exceeds maximum length of {MAX_LEN} characters")]
    TooLong,

    #[error("app name cannot start with a hyphen")]
    StartsWithHyphen,

    #[error("app name cannot end with a hyphen")]
    EndsWithHyphen,

    #[error("invalid character in app name: '{0}'")]
    InvalidChar(char),
}

/// Name of an application instance on a foundry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AppName(String);

impl AppName {
    pub fn new(value: &str) -> Result<Self, AppNameError> {
        if value.is_empty() {
            return Err(AppNameError::Empty);
        }

        if value.len() > MAX_LEN {
            return Err(AppNameError::TooLong);
        }

        if value.starts_with('-') {
            return Err(AppNameError::StartsWithHyphen);
        }

        if value.ends_with('-') {
            return Err(AppNameError::EndsWithHyphen);
        }

        if let Some(c) = value
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '-' && *c != '_' && *c != '.')
        {
            return Err(AppNameError::InvalidChar(c));
        }

        Ok(Self(value.to_string()))
    }

    /// Wrap a name reported by a foundry without validating it.
    ///
    /// Apps found on a route may predate this tool and carry names it would
    /// never produce; they still have to be unmapped and retired.
    pub fn discovered(value: &str) -> Self {
        Self(value.to_string())
    }

    /// Compose the name of a freshly deployed app for one run.
    ///
    /// The result is `<base>-<environment>-<revision>-<timestamp>`. Every
    /// component is lowercased and characters outside `[a-z0-9]` in the
    /// revision are replaced by hyphens, so the same inputs always yield the
    /// same name while a new timestamp always yields a new one.
    pub fn compose(
        base: &str,
        environment: &str,
        revision: &str,
        timestamp: i64,
    ) -> Result<Self, AppNameError> {
        let revision: String = revision
            .trim()
            .to_ascii_lowercase()
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
            .collect();
        let revision = revision.trim_matches('-');

        let name = if revision.is_empty() {
            format!(
                "{}-{}-{}",
                base.to_ascii_lowercase(),
                environment.to_ascii_lowercase(),
                timestamp
            )
        } else {
            format!(
                "{}-{}-{}-{}",
                base.to_ascii_lowercase(),
                environment.to_ascii_lowercase(),
                revision,
                timestamp
            )
        };

        Self::new(&name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AppName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
