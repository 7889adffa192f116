// ABOUTME: Output formatting for CLI feedback.
// ABOUTME: Supports normal, quiet (CI), and JSON output modes.

use serde::Serialize;
use std::time::Instant;

use crate::deploy::{DeploymentReport, EnvironmentPlan, LocationOutcome, OutcomeSummary};

/// Output mode for CLI feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with progress messages
    Normal,
    /// Minimal output for CI (only final result)
    Quiet,
    /// JSON lines for scripting
    Json,
}

/// Handles CLI output based on the configured mode.
pub struct Output {
    mode: OutputMode,
    start_time: Option<Instant>,
}

impl Output {
    pub fn new(mode: OutputMode) -> Self {
        Self {
            mode,
            start_time: None,
        }
    }

    /// Start timing an operation.
    pub fn start_timer(&mut self) {
        self.start_time = Some(Instant::now());
    }

    /// Get elapsed time since timer started.
    pub fn elapsed_secs(&self) -> f64 {
        self.start_time
            .map(|t| t.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    fn duration(&self) -> Option<f64> {
        self.start_time.map(|_| self.elapsed_secs())
    }

    /// Print a progress message (suppressed in quiet/json mode).
    pub fn progress(&self, message: &str) {
        if self.mode == OutputMode::Normal {
            println!("{message}");
        }
    }

    /// Print a non-fatal warning.
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => eprintln!("Warning: {message}"),
            OutputMode::Quiet => {}
            OutputMode::Json => emit(&JsonEvent {
                event: "warning",
                message,
                duration_secs: None,
            }),
        }
    }

    /// Print a success message with optional timing.
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Normal => {
                let elapsed = self.elapsed_secs();
                if elapsed > 0.0 {
                    println!("{message} ({:.1}s)", elapsed);
                } else {
                    println!("{message}");
                }
            }
            OutputMode::Quiet => {
                // Print only the essential result
                println!("{message}");
            }
            OutputMode::Json => emit(&JsonEvent {
                event: "success",
                message,
                duration_secs: self.duration(),
            }),
        }
    }

    /// Print an error message.
    pub fn error(&self, message: &str) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                eprintln!("Error: {message}");
            }
            OutputMode::Json => {
                let event = JsonEvent {
                    event: "error",
                    message,
                    duration_secs: self.duration(),
                };
                if let Ok(json) = serde_json::to_string(&event) {
                    eprintln!("{json}");
                }
            }
        }
    }

    /// Print the result of one location.
    pub fn location(&self, outcome: &LocationOutcome) {
        match self.mode {
            OutputMode::Normal => {
                let mark = if outcome.succeeded() { "✓" } else { "✗" };
                println!("  {mark} {}: {}", outcome.location, outcome.phase);
                if let Some(old_app) = &outcome.old_app {
                    println!("      replaced {old_app}");
                }
                if let Some(error) = &outcome.error {
                    let during = outcome
                        .failed_during
                        .map(|p| format!(" during {p}"))
                        .unwrap_or_default();
                    println!("      failed{during}: {error}");
                }
                for warning in &outcome.warnings {
                    self.warning(&format!("{}: {warning}", outcome.location));
                }
            }
            OutputMode::Quiet => {
                if let Some(error) = &outcome.error {
                    eprintln!("{}: {}", outcome.location, error);
                }
            }
            OutputMode::Json => emit(&LocationEvent {
                event: "location",
                outcome: outcome.summary(),
            }),
        }
    }

    /// Print every location of a finished run.
    pub fn report(&self, report: &DeploymentReport) {
        if self.mode == OutputMode::Normal {
            println!("{} ({})", report.new_app, report.environment);
        }
        for outcome in &report.outcomes {
            self.location(outcome);
        }
    }

    /// Print a resolved plan without running it.
    pub fn plan(&self, plan: &EnvironmentPlan) {
        match self.mode {
            OutputMode::Normal | OutputMode::Quiet => {
                println!("{} -> {}", plan.environment, plan.new_app);
                for location in &plan.locations {
                    println!(
                        "  {} ({} / {} / {})",
                        location.location,
                        location.target.api,
                        location.target.org,
                        location.target.space
                    );
                    println!("    cutover: {}", location.cutover);
                    for route in &location.routes {
                        println!("    route: {route}");
                    }
                    for service in &location.services {
                        println!("    service: {service}");
                    }
                }
            }
            OutputMode::Json => emit(&PlanEvent {
                event: "plan",
                environment: &plan.environment,
                new_app: plan.new_app.as_str(),
                locations: plan
                    .locations
                    .iter()
                    .map(|l| PlanLocation {
                        location: l.location.as_str(),
                        api: &l.target.api,
                        org: &l.target.org,
                        space: &l.target.space,
                        cutover: l.cutover.to_string(),
                        routes: l.routes.iter().map(ToString::to_string).collect(),
                        services: &l.services,
                    })
                    .collect(),
            }),
        }
    }
}

fn emit<T: Serialize>(event: &T) {
    if let Ok(json) = serde_json::to_string(event) {
        println!("{json}");
    }
}

#[derive(Serialize)]
struct JsonEvent<'a> {
    event: &'a str,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    duration_secs: Option<f64>,
}

#[derive(Serialize)]
struct LocationEvent {
    event: &'static str,
    #[serde(flatten)]
    outcome: OutcomeSummary,
}

#[derive(Serialize)]
struct PlanEvent<'a> {
    event: &'static str,
    environment: &'a str,
    new_app: &'a str,
    locations: Vec<PlanLocation<'a>>,
}

#[derive(Serialize)]
struct PlanLocation<'a> {
    location: &'a str,
    api: &'a str,
    org: &'a str,
    space: &'a str,
    cutover: String,
    routes: Vec<String>,
    services: &'a [String],
}
