// ABOUTME: Library root for foundry-deploy - exposes public types for testing.
// ABOUTME: The main binary is in main.rs.

pub mod config;
pub mod deploy;
pub mod diagnostics;
pub mod driver;
pub mod error;
pub mod output;
pub mod platform;
pub mod types;
