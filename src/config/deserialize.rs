// ABOUTME: Custom serde deserializers for config types.
// ABOUTME: Handles app base names and non-empty location lists.

use nonempty::NonEmpty;
use serde::Deserialize;

use crate::types::{AppName, Location};

pub fn deserialize_base_name<'de, D>(deserializer: D) -> Result<AppName, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    AppName::new(&s).map_err(serde::de::Error::custom)
}

pub fn deserialize_locations<'de, D>(deserializer: D) -> Result<NonEmpty<Location>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let values: Vec<String> = Vec::deserialize(deserializer)?;
    let locations = values
        .iter()
        .map(|value| Location::new(value))
        .collect::<Result<Vec<_>, _>>()
        .map_err(serde::de::Error::custom)?;

    NonEmpty::from_vec(locations)
        .ok_or_else(|| serde::de::Error::custom("at least one location is required"))
}
