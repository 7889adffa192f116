// ABOUTME: Integration tests for per-location and environment orchestration.
// ABOUTME: Drives full deployments against the scripted in-memory foundry.

mod support;

use foundry_deploy::config::Config;
use foundry_deploy::deploy::{DeployError, DeployErrorKind, Phase};
use foundry_deploy::diagnostics::BestEffortStep;
use foundry_deploy::driver::{Driver, RunIdentity};
use foundry_deploy::error::Error;
use std::sync::Arc;
use support::FakeCf;

const NEW_APP: &str = "svc-staging-ab12cd-1700000000";
const OLD_APP: &str = "svc-staging-ff00aa-1600000000";

const ENDPOINT: &str = "svc-staging.east.example.com";
const BASE: &str = "svc.example.com";
const CUSTOM: &str = "svc.example.org";

fn config(locations: &str, extra: &str) -> Config {
    config_with("", locations, extra)
}

fn config_with(top: &str, locations: &str, extra: &str) -> Config {
    let yaml = format!(
        r#"{top}
app:
  name: svc
targets:
  east:
    api: https://api.east.example.com
    home: /tmp/cf-east
    username: deployer
    password: hunter2
    org: acme
    spaces:
      staging: acme-staging
    domain: east.example.com
  west:
    api: https://api.west.example.com
    home: /tmp/cf-west
    username: deployer
    password: hunter2
    org: acme
    spaces:
      staging: acme-staging
    domain: west.example.com
environments:
  staging:
    endpoint: svc-staging
    route:
      host: svc
      domain: example.com
    locations: {locations}
    variables:
      NODE_ENV: staging
      API_KEY: s3cr3t
    services: [db, cache]
    custom_domains: [svc.example.org]
{extra}
"#
    );
    Config::from_yaml(&yaml).unwrap()
}

fn driver(config: &Config, fake: &Arc<FakeCf>) -> Driver<FakeCf> {
    support::init_tracing();
    let identity = RunIdentity::new("staging", "ab12cd", Some(1_700_000_000));
    Driver::prepare(config, &identity, Arc::clone(fake)).unwrap()
}

fn index_of(calls: &[support::Call], pred: impl Fn(&support::Call) -> bool) -> usize {
    calls
        .iter()
        .position(pred)
        .expect("expected call was not made")
}

mod first_deploy {
    use super::*;

    #[tokio::test]
    async fn maps_every_route_and_skips_old_app_steps() {
        let fake = Arc::new(FakeCf::new());
        let config = config("[east]", "");

        let report = driver(&config, &fake).run().await.unwrap();

        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.new_app.as_str(), NEW_APP);
        let outcome = &report.outcomes[0];
        assert_eq!(outcome.phase, Phase::Done);
        assert!(outcome.old_app.is_none());

        let subcommands = fake.subcommands_in("east");
        assert!(!subcommands.contains(&"unmap-route".to_string()));
        assert!(!subcommands.contains(&"delete".to_string()));
        assert_eq!(
            fake.routes_of("east", NEW_APP),
            vec![ENDPOINT, BASE, CUSTOM]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
                .tap_sorted()
        );
    }

    #[tokio::test]
    async fn runs_phases_in_order() {
        let fake = Arc::new(FakeCf::new());
        let config = config("[east]", "");

        driver(&config, &fake).run().await.unwrap();

        let calls = fake.calls_in("east");
        let version = index_of(&calls, |c| c.is("-v"));
        let logout = index_of(&calls, |c| c.is("logout"));
        let api = index_of(&calls, |c| c.is("api"));
        let login = index_of(&calls, |c| c.is("login"));
        let push = index_of(&calls, |c| c.is("push"));
        let set_env = index_of(&calls, |c| c.is("set-env"));
        let bind = index_of(&calls, |c| c.is("bind-service"));
        let start = index_of(&calls, |c| c.is("start"));
        let status = index_of(&calls, |c| c.is("app"));
        let discover = index_of(&calls, |c| c.is("apps"));
        let map = index_of(&calls, |c| c.is("map-route"));

        assert!(version < logout);
        assert!(logout < api && api < login && login < push);
        assert!(push < set_env && set_env < bind && bind < start);
        assert!(start < status && status < discover && discover < map);
    }

    #[tokio::test]
    async fn pushes_stopped_with_sizing() {
        let fake = Arc::new(FakeCf::new());
        let config = config("[east]", "    instances: 2\n    memory: 1G");

        driver(&config, &fake).run().await.unwrap();

        let calls = fake.calls_in("east");
        let push = &calls[index_of(&calls, |c| c.is("push"))];
        assert_eq!(push.args[1], NEW_APP);
        assert!(push.has_arg("--no-start"));
        assert!(push.args.windows(2).any(|w| w == ["-i", "2"]));
        assert!(push.args.windows(2).any(|w| w == ["-m", "1G"]));
    }

    #[tokio::test]
    async fn binds_every_service_before_start() {
        let fake = Arc::new(FakeCf::new());
        let config = config("[east]", "");

        driver(&config, &fake).run().await.unwrap();

        let calls = fake.calls_in("east");
        let start = index_of(&calls, |c| c.is("start"));
        for service in ["db", "cache"] {
            let bind = index_of(&calls, |c| c.is("bind-service") && c.has_arg(service));
            assert!(bind < start);
        }
    }

    #[tokio::test]
    async fn sets_location_variable_after_configured_variables() {
        let fake = Arc::new(FakeCf::new());
        let config = config("[east]", "");

        driver(&config, &fake).run().await.unwrap();

        let set_env: Vec<_> = fake
            .calls_in("east")
            .into_iter()
            .filter(|c| c.is("set-env"))
            .collect();
        let names: Vec<_> = set_env.iter().map(|c| c.args[2].as_str()).collect();
        assert_eq!(names, vec!["API_KEY", "NODE_ENV", "FOUNDRY_LOCATION"]);
        assert_eq!(set_env[2].args[3], "east");
    }
}

mod secrets {
    use super::*;

    #[tokio::test]
    async fn secret_bearing_commands_are_muted() {
        let fake = Arc::new(FakeCf::new());
        let config = config("[east]", "");

        driver(&config, &fake).run().await.unwrap();

        for call in fake.calls() {
            let carries_secret = call.has_arg("s3cr3t") || call.has_arg("hunter2");
            assert_eq!(
                call.muted, carries_secret,
                "unexpected mute flag on {:?}",
                call.args
            );
        }
        assert!(
            fake.calls()
                .iter()
                .any(|c| c.is("login") && c.muted)
        );
    }

    #[tokio::test]
    async fn failure_of_muted_command_does_not_leak_value() {
        let fake = Arc::new(FakeCf::new());
        fake.fail_with_arg("east", "set-env", "API_KEY");
        let config = config("[east]", "");

        let err = driver(&config, &fake).run().await.unwrap_err();

        let Error::Deploy(failure) = &err else {
            panic!("expected deployment failure, got {err}");
        };
        assert!(!err.to_string().contains("s3cr3t"));
        assert!(!format!("{err:?}").contains("s3cr3t"));
        assert_eq!(
            failure.report.outcomes[0].failed_during,
            Some(Phase::Starting)
        );
    }
}

mod cutover {
    use super::*;

    fn seeded() -> Arc<FakeCf> {
        let fake = Arc::new(FakeCf::new());
        fake.seed_app("east", OLD_APP, &[ENDPOINT, BASE, CUSTOM]);
        fake
    }

    #[tokio::test]
    async fn maps_before_unmapping_each_route() {
        let fake = seeded();
        let config = config("[east]", "");

        let report = driver(&config, &fake).run().await.unwrap();

        assert_eq!(
            report.outcomes[0].old_app.as_ref().map(|a| a.as_str()),
            Some(OLD_APP)
        );

        let calls = fake.calls_in("east");
        for route in [ENDPOINT, BASE, CUSTOM] {
            let map = index_of(&calls, |c| {
                c.is("map-route") && c.args[1] == NEW_APP && c.route().as_deref() == Some(route)
            });
            let unmap = index_of(&calls, |c| {
                c.is("unmap-route")
                    && c.args[1] == OLD_APP
                    && c.route().as_deref() == Some(route)
            });
            assert!(map < unmap, "{route} was unmapped before it was mapped");
        }
    }

    #[tokio::test]
    async fn retires_old_app_without_deleting_routes() {
        let fake = seeded();
        let config = config("[east]", "");

        driver(&config, &fake).run().await.unwrap();

        assert!(!fake.has_app("east", OLD_APP));
        assert_eq!(fake.routes_of("east", NEW_APP).len(), 3);

        let calls = fake.calls_in("east");
        let delete = &calls[index_of(&calls, |c| c.is("delete"))];
        assert_eq!(delete.args, vec!["delete", "-f", OLD_APP]);
    }

    #[tokio::test]
    async fn two_phase_maps_everything_before_unmapping() {
        let fake = seeded();
        let config = config("[east]", "    cutover: two-phase");

        driver(&config, &fake).run().await.unwrap();

        let calls = fake.calls_in("east");
        let last_map = calls.iter().rposition(|c| c.is("map-route")).unwrap();
        let first_unmap = index_of(&calls, |c| c.is("unmap-route"));
        assert!(last_map < first_unmap);
        assert!(!fake.has_app("east", OLD_APP));
    }

    #[tokio::test]
    async fn ambiguous_discovery_retires_endpoint_answer_and_frees_base_route() {
        let fake = Arc::new(FakeCf::new());
        fake.seed_app("east", OLD_APP, &[ENDPOINT]);
        fake.seed_app("east", "svc-staging-other-1", &[BASE]);
        let config = config("[east]", "");

        let report = driver(&config, &fake).run().await.unwrap();

        let outcome = &report.outcomes[0];
        assert_eq!(outcome.old_app.as_ref().map(|a| a.as_str()), Some(OLD_APP));
        assert!(
            outcome
                .warnings
                .iter()
                .any(|w| w.step == BestEffortStep::RouteDiscovery)
        );
        assert!(!fake.has_app("east", OLD_APP));
        assert!(fake.has_app("east", "svc-staging-other-1"));
        assert!(fake.routes_of("east", "svc-staging-other-1").is_empty());
        assert_eq!(fake.routes_of("east", NEW_APP).len(), 3);
    }

    #[tokio::test]
    async fn app_with_unconventional_name_is_still_replaced() {
        let fake = Arc::new(FakeCf::new());
        fake.seed_app("east", "legacy+svc", &[ENDPOINT, BASE]);
        let config = config("[east]", "");

        let report = driver(&config, &fake).run().await.unwrap();

        assert_eq!(
            report.outcomes[0].old_app.as_ref().map(|a| a.as_str()),
            Some("legacy+svc")
        );
        assert!(!fake.has_app("east", "legacy+svc"));
        assert_eq!(
            fake.routes_of("east", NEW_APP),
            vec![BASE, ENDPOINT, CUSTOM]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
                .tap_sorted()
        );
    }

    #[tokio::test]
    async fn failed_unmap_restores_each_route_to_its_own_app() {
        let fake = Arc::new(FakeCf::new());
        fake.seed_app("east", OLD_APP, &[ENDPOINT]);
        fake.seed_app("east", "svc-staging-other-1", &[BASE]);
        fake.fail_with_arg("east", "unmap-route", CUSTOM);
        let config = config("[east]", "");

        let err = driver(&config, &fake).run().await.unwrap_err();

        assert!(matches!(err, Error::Deploy(_)));
        assert!(!fake.has_app("east", NEW_APP));
        assert_eq!(fake.routes_of("east", OLD_APP), vec![ENDPOINT.to_string()]);
        assert_eq!(
            fake.routes_of("east", "svc-staging-other-1"),
            vec![BASE.to_string()]
        );
    }

    #[tokio::test]
    async fn failed_unmap_restores_old_routes_and_removes_new_app() {
        let fake = seeded();
        // Only the base route is mapped with host "svc".
        fake.fail_with_arg("east", "unmap-route", "svc");
        let config = config("[east]", "");

        let err = driver(&config, &fake).run().await.unwrap_err();

        let Error::Deploy(failure) = err else {
            panic!("expected deployment failure");
        };
        let outcome = &failure.report.outcomes[0];
        assert_eq!(outcome.phase, Phase::Failed);
        assert_eq!(outcome.failed_during, Some(Phase::CuttingOver));
        assert!(matches!(
            outcome.error,
            Some(DeployError::Cutover {
                failed: 1,
                total: 3,
                ..
            })
        ));

        assert!(!fake.has_app("east", NEW_APP));
        assert_eq!(
            fake.routes_of("east", OLD_APP),
            vec![BASE, ENDPOINT, CUSTOM]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
                .tap_sorted()
        );
    }

    #[tokio::test]
    async fn failed_discovery_rolls_back_without_touching_routes() {
        let fake = seeded();
        fake.fail("east", "apps");
        let config = config("[east]", "");

        let err = driver(&config, &fake).run().await.unwrap_err();

        assert!(matches!(err, Error::Deploy(_)));
        let subcommands = fake.subcommands_in("east");
        assert!(!subcommands.contains(&"map-route".to_string()));
        assert!(!fake.has_app("east", NEW_APP));
        assert_eq!(fake.routes_of("east", OLD_APP).len(), 3);
    }
}

mod rollback {
    use super::*;

    #[tokio::test]
    async fn health_failure_removes_new_app_and_keeps_old_routes() {
        let fake = Arc::new(FakeCf::new());
        fake.seed_app("east", OLD_APP, &[ENDPOINT, BASE]);
        fake.crash_apps("east");
        let config = config("[east]", "");

        let err = driver(&config, &fake).run().await.unwrap_err();

        let Error::Deploy(failure) = err else {
            panic!("expected deployment failure");
        };
        assert_eq!(failure.report.exit_code(), 1);
        let outcome = &failure.report.outcomes[0];
        assert_eq!(outcome.failed_during, Some(Phase::Verifying));
        assert_eq!(
            outcome.error.as_ref().map(DeployError::kind),
            Some(DeployErrorKind::NotRunning)
        );

        assert!(!fake.has_app("east", NEW_APP));
        assert_eq!(fake.routes_of("east", OLD_APP).len(), 2);

        let subcommands = fake.subcommands_in("east");
        assert!(subcommands.contains(&"logs".to_string()));
        assert!(!subcommands.contains(&"map-route".to_string()));
        assert!(!subcommands.contains(&"unmap-route".to_string()));
    }

    #[tokio::test]
    async fn push_failure_still_attempts_cleanup() {
        let fake = Arc::new(FakeCf::new());
        fake.fail("east", "push");
        let config = config("[east]", "");

        let err = driver(&config, &fake).run().await.unwrap_err();

        let Error::Deploy(failure) = err else {
            panic!("expected deployment failure");
        };
        let outcome = &failure.report.outcomes[0];
        assert_eq!(outcome.failed_during, Some(Phase::Provisioning));
        let error = outcome.error.as_ref().unwrap();
        assert_eq!(error.kind(), DeployErrorKind::CommandFailure);
        assert_eq!(error.command_error().and_then(|e| e.exit_code()), Some(1));

        let calls = fake.calls_in("east");
        let delete = &calls[index_of(&calls, |c| c.is("delete"))];
        assert_eq!(delete.args[2], NEW_APP);
    }
}

mod best_effort {
    use super::*;

    const CAPABILITIES: &str = r#"capabilities:
  - repo:
      name: community
      url: https://plugins.example.com
    plugin: diego-enabler
    command: enable-diego
"#;

    fn with_capabilities(locations: &str) -> Config {
        config_with(CAPABILITIES, locations, "")
    }

    #[tokio::test]
    async fn capability_failures_do_not_change_outcome() {
        let fake = Arc::new(FakeCf::new());
        fake.fail("east", "add-plugin-repo");
        fake.fail("east", "install-plugin");
        fake.fail("east", "enable-diego");
        let config = with_capabilities("[east]");

        let report = driver(&config, &fake).run().await.unwrap();

        let outcome = &report.outcomes[0];
        assert_eq!(outcome.phase, Phase::Done);
        let capability_warnings = outcome
            .warnings
            .iter()
            .filter(|w| w.step == BestEffortStep::CapabilitySetup)
            .count();
        assert_eq!(capability_warnings, 3);
    }

    #[tokio::test]
    async fn capability_steps_run_in_order() {
        let fake = Arc::new(FakeCf::new());
        let config = with_capabilities("[east]");

        driver(&config, &fake).run().await.unwrap();

        let calls = fake.calls_in("east");
        let repo = index_of(&calls, |c| c.is("add-plugin-repo"));
        let install = &calls[index_of(&calls, |c| c.is("install-plugin"))];
        let command = index_of(&calls, |c| c.is("enable-diego") && c.has_arg(NEW_APP));
        let install_at = index_of(&calls, |c| c.is("install-plugin"));
        assert!(repo < install_at && install_at < command);
        assert_eq!(
            install.args,
            vec!["install-plugin", "diego-enabler", "-r", "community", "-f"]
        );
    }

    #[tokio::test]
    async fn failed_retirement_does_not_fail_deployment() {
        let fake = Arc::new(FakeCf::new());
        fake.seed_app("east", OLD_APP, &[ENDPOINT, BASE, CUSTOM]);
        fake.fail("east", "delete");
        let config = config("[east]", "");

        let report = driver(&config, &fake).run().await.unwrap();

        let outcome = &report.outcomes[0];
        assert!(outcome.succeeded());
        assert!(
            outcome
                .warnings
                .iter()
                .any(|w| w.step == BestEffortStep::Decommission)
        );
        assert_eq!(fake.routes_of("east", NEW_APP).len(), 3);
    }

    #[tokio::test]
    async fn rollback_cleanup_failures_keep_original_cause() {
        let fake = Arc::new(FakeCf::new());
        fake.crash_apps("east");
        fake.fail("east", "logs");
        fake.fail("east", "delete");
        let config = config("[east]", "");

        let err = driver(&config, &fake).run().await.unwrap_err();

        let Error::Deploy(failure) = err else {
            panic!("expected deployment failure");
        };
        let outcome = &failure.report.outcomes[0];
        assert_eq!(
            outcome.error.as_ref().map(DeployError::kind),
            Some(DeployErrorKind::NotRunning)
        );
        let steps: Vec<_> = outcome.warnings.iter().map(|w| w.step).collect();
        assert!(steps.contains(&BestEffortStep::LogFetch));
        assert!(steps.contains(&BestEffortStep::Decommission));
    }
}

mod locations {
    use super::*;

    #[tokio::test]
    async fn failing_location_does_not_affect_sibling() {
        let fake = Arc::new(FakeCf::new());
        fake.fail("west", "push");
        let config = config("[east, west]", "");

        let err = driver(&config, &fake).run().await.unwrap_err();

        let Error::Deploy(failure) = err else {
            panic!("expected deployment failure");
        };
        assert_eq!(failure.report.exit_code(), 1);

        let east = &failure.report.outcomes[0];
        let west = &failure.report.outcomes[1];
        assert_eq!(east.location.as_str(), "east");
        assert_eq!(east.phase, Phase::Done);
        assert_eq!(west.location.as_str(), "west");
        assert_eq!(west.phase, Phase::Failed);
        assert_eq!(west.failed_during, Some(Phase::Provisioning));

        assert!(fake.has_app("east", NEW_APP));
        assert!(
            fake.calls_in("west")
                .iter()
                .any(|c| c.is("delete") && c.has_arg(NEW_APP))
        );
        assert!(
            !fake
                .calls_in("east")
                .iter()
                .any(|c| c.is("delete") && c.has_arg(NEW_APP))
        );
        assert!(failure.to_string().contains("west"));
    }

    #[tokio::test]
    async fn every_location_uses_the_same_app_name() {
        let fake = Arc::new(FakeCf::new());
        let config = config("[east, west]", "");

        let report = driver(&config, &fake).run().await.unwrap();

        assert!(report.outcomes.iter().all(|o| o.new_app.as_str() == NEW_APP));
        assert!(fake.has_app("east", NEW_APP));
        assert!(fake.has_app("west", NEW_APP));
        assert_eq!(
            fake.routes_of("west", NEW_APP),
            vec!["svc-staging.west.example.com", BASE, CUSTOM]
                .into_iter()
                .map(String::from)
                .collect::<Vec<_>>()
                .tap_sorted()
        );
    }
}

trait TapSorted {
    fn tap_sorted(self) -> Self;
}

impl TapSorted for Vec<String> {
    fn tap_sorted(mut self) -> Self {
        self.sort();
        self
    }
}
