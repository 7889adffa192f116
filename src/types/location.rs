// ABOUTME: Deployment location identifiers.
// ABOUTME: A location names one foundry account/region configured as a target.

use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LocationError {
    #[error("location cannot be empty")]
    Empty,

    #[error("invalid character in location: '{0}'")]
    InvalidChar(char),
}

/// One independent deployment target (a foundry account/region).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Location(String);

impl Location {
    pub fn new(value: &str) -> Result<Self, LocationError> {
        if value.is_empty() {
            return Err(LocationError::Empty);
        }

        if let Some(c) = value
            .chars()
            .find(|c| !c.is_ascii_alphanumeric() && *c != '-' && *c != '_')
        {
            return Err(LocationError::InvalidChar(c));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
