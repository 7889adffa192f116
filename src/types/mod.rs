// ABOUTME: Validated domain types shared across the deployer.
// ABOUTME: App names, locations, routes, and redacting secret wrappers.

mod app_name;
mod location;
mod route;
mod secret;

pub use app_name::{AppName, AppNameError};
pub use location::{Location, LocationError};
pub use route::Route;
pub use secret::Secret;
