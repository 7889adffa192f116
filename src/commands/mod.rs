// ABOUTME: Command module aggregator for the foundry-deploy CLI.
// ABOUTME: Re-exports deploy and plan command handlers.

mod deploy;
mod plan;

pub use deploy::deploy;
pub use plan::plan;
