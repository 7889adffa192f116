// ABOUTME: Test support utilities.
// ABOUTME: Provides a scripted in-memory foundry that stands in for the cf CLI.

use async_trait::async_trait;
use foundry_deploy::platform::{
    CommandError, CommandExecutor, CommandLine, ExecOptions, SessionContext,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Once;

static TRACING_INIT: Once = Once::new();

/// Initialize tracing for tests. Safe to call multiple times.
#[allow(dead_code)]
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::EnvFilter;
        let filter = EnvFilter::from_default_env()
            .add_directive("foundry_deploy=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// One recorded invocation.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct Call {
    pub location: String,
    pub args: Vec<String>,
    pub muted: bool,
}

#[allow(dead_code)]
impl Call {
    pub fn subcommand(&self) -> &str {
        self.args.first().map(String::as_str).unwrap_or("")
    }

    pub fn is(&self, subcommand: &str) -> bool {
        self.subcommand() == subcommand
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// Hostname targeted by a map-route/unmap-route call.
    pub fn route(&self) -> Option<String> {
        route_of(&self.args)
    }
}

#[derive(Debug, Clone)]
struct Rule {
    location: String,
    subcommand: String,
    arg: Option<String>,
}

impl Rule {
    fn matches(&self, location: &str, args: &[String]) -> bool {
        self.location == location
            && args.first().is_some_and(|a| *a == self.subcommand)
            && self
                .arg
                .as_ref()
                .is_none_or(|wanted| args.iter().any(|a| a == wanted))
    }
}

#[derive(Debug, Default)]
struct Inner {
    calls: Vec<Call>,
    rules: Vec<Rule>,
    /// location -> app -> hostnames
    apps: HashMap<String, BTreeMap<String, Vec<String>>>,
    crashing: HashSet<String>,
}

/// In-memory foundry per location, driven through the executor seam.
///
/// Pushing creates an app, route commands move hostnames between apps, and
/// `apps`/`app` report the resulting state in the CLI's table format.
#[derive(Debug, Default)]
pub struct FakeCf {
    inner: Mutex<Inner>,
}

#[allow(dead_code)]
impl FakeCf {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an existing app serving `hostnames` in `location`.
    pub fn seed_app(&self, location: &str, app: &str, hostnames: &[&str]) {
        self.inner
            .lock()
            .apps
            .entry(location.to_string())
            .or_default()
            .insert(
                app.to_string(),
                hostnames.iter().map(|h| h.to_string()).collect(),
            );
    }

    /// Fail every `subcommand` call in `location`.
    pub fn fail(&self, location: &str, subcommand: &str) {
        self.push_rule(location, subcommand, None);
    }

    /// Fail `subcommand` calls in `location` that carry `arg`.
    pub fn fail_with_arg(&self, location: &str, subcommand: &str, arg: &str) {
        self.push_rule(location, subcommand, Some(arg));
    }

    /// Report every instance of every app in `location` as crashed.
    pub fn crash_apps(&self, location: &str) {
        self.inner.lock().crashing.insert(location.to_string());
    }

    pub fn calls(&self) -> Vec<Call> {
        self.inner.lock().calls.clone()
    }

    pub fn calls_in(&self, location: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.location == location)
            .collect()
    }

    pub fn subcommands_in(&self, location: &str) -> Vec<String> {
        self.calls_in(location)
            .iter()
            .map(|c| c.subcommand().to_string())
            .collect()
    }

    pub fn has_app(&self, location: &str, app: &str) -> bool {
        self.inner
            .lock()
            .apps
            .get(location)
            .is_some_and(|apps| apps.contains_key(app))
    }

    /// Hostnames currently mapped to `app`, sorted.
    pub fn routes_of(&self, location: &str, app: &str) -> Vec<String> {
        let mut routes = self
            .inner
            .lock()
            .apps
            .get(location)
            .and_then(|apps| apps.get(app))
            .cloned()
            .unwrap_or_default();
        routes.sort();
        routes
    }

    fn push_rule(&self, location: &str, subcommand: &str, arg: Option<&str>) {
        self.inner.lock().rules.push(Rule {
            location: location.to_string(),
            subcommand: subcommand.to_string(),
            arg: arg.map(str::to_string),
        });
    }
}

fn route_of(args: &[String]) -> Option<String> {
    let domain = args.get(2)?;
    match args.iter().position(|a| a == "-n") {
        Some(i) => Some(format!("{}.{}", args.get(i + 1)?, domain)),
        None => Some(domain.clone()),
    }
}

fn apps_table(apps: &BTreeMap<String, Vec<String>>) -> String {
    let mut out = String::from(
        "Getting apps in org acme / space staging as deployer...\nOK\n\nname   requested state   instances   memory   disk   urls\n",
    );
    for (name, routes) in apps {
        out.push_str(&format!(
            "{}   started   1/1   512M   1G   {}\n",
            name,
            routes.join(", ")
        ));
    }
    out
}

fn app_status(app: &str, crashed: bool) -> String {
    let state = if crashed { "crashed" } else { "running" };
    format!(
        "Showing health and status for app {app}...\n\nrequested state: started\n\n     state     since                    cpu    memory         disk\n#0   {state}   2024-03-01 10:00:00 AM   0.1%   64M of 512M   90M of 1G\n"
    )
}

#[async_trait]
impl CommandExecutor for FakeCf {
    async fn execute(
        &self,
        context: &SessionContext,
        args: &[String],
        options: ExecOptions,
    ) -> Result<String, CommandError> {
        let location = context.location.as_str().to_string();
        let mut inner = self.inner.lock();
        inner.calls.push(Call {
            location: location.clone(),
            args: args.to_vec(),
            muted: options.mute,
        });

        if inner.rules.iter().any(|r| r.matches(&location, args)) {
            return Err(CommandError::Failed {
                command: CommandLine::new(args.to_vec(), options.mute),
                exit_code: Some(1),
            });
        }

        let crashed = inner.crashing.contains(&location);
        let apps = inner.apps.entry(location).or_default();
        let arg = |i: usize| args.get(i).cloned().unwrap_or_default();

        let output = match args.first().map(String::as_str) {
            Some("-v") => "cf version 8.7.0\n".to_string(),
            Some("push") => {
                apps.entry(arg(1)).or_default();
                String::new()
            }
            Some("apps") => apps_table(apps),
            Some("app") => app_status(&arg(1), crashed),
            Some("map-route") => {
                if let Some(route) = route_of(args) {
                    let routes = apps.entry(arg(1)).or_default();
                    if !routes.contains(&route) {
                        routes.push(route);
                    }
                }
                String::new()
            }
            Some("unmap-route") => {
                if let (Some(route), Some(routes)) = (route_of(args), apps.get_mut(&arg(1))) {
                    routes.retain(|r| *r != route);
                }
                String::new()
            }
            Some("delete") => {
                apps.remove(&arg(2));
                String::new()
            }
            Some("logs") => format!("Retrieving logs for app {}...\n", arg(1)),
            _ => String::new(),
        };

        Ok(output)
    }
}
