// ABOUTME: Environment variable value types with interpolation support.
// ABOUTME: Handles literal values, references to process variables, and secret detection.

use crate::error::{Error, Result};
use serde::Deserialize;

/// Name fragments that mark a variable as sensitive.
const SENSITIVE_MARKERS: [&str; 4] = ["PASSWORD", "KEY", "SECRET", "TOKEN"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnvValue {
    Literal(String),
    FromEnv {
        #[serde(rename = "env")]
        var: String,
        #[serde(default)]
        default: Option<String>,
    },
}

impl EnvValue {
    pub fn resolve(&self) -> Result<String> {
        match self {
            EnvValue::Literal(s) => Ok(s.clone()),
            EnvValue::FromEnv { var, default } => match std::env::var(var) {
                Ok(val) => Ok(val),
                Err(_) => default
                    .clone()
                    .ok_or_else(|| Error::MissingEnvVar(var.clone())),
            },
        }
    }
}

/// Whether a variable name looks like it carries a credential.
///
/// Values of such variables must only be handed to muted commands.
pub fn is_sensitive(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    SENSITIVE_MARKERS.iter().any(|marker| upper.contains(marker))
}
