// ABOUTME: Route switching strategy used during cutover.
// ABOUTME: Interleaved per-route map-then-unmap, or the two-phase batch variant.

use serde::Deserialize;
use std::fmt;

/// How routes move from the old app to the new one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CutoverStrategy {
    /// Per route, concurrently: map to new, then unmap from old.
    ///
    /// Every route is served by the new app before the old app loses it, and
    /// each route is shared by both apps only for the time between its own
    /// two commands.
    #[default]
    Interleaved,

    /// Map every route to the new app, then unmap every route from the old one.
    ///
    /// Both apps serve all routes until the last map finishes.
    TwoPhase,
}

impl fmt::Display for CutoverStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CutoverStrategy::Interleaved => write!(f, "interleaved"),
            CutoverStrategy::TwoPhase => write!(f, "two-phase"),
        }
    }
}
