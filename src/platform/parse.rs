// ABOUTME: Parsing of `cf app` and `cf apps` output.
// ABOUTME: Extracts instance states and the apps answering a given hostname.

/// Instance states listed in `cf app` output (`#0   running   ...` rows).
pub fn instance_states(output: &str) -> Vec<&str> {
    output
        .lines()
        .map(str::trim_start)
        .filter(|line| line.starts_with('#'))
        .filter_map(|line| line.split_whitespace().nth(1))
        .collect()
}

/// Whether at least one instance reports `running`.
pub fn is_running(output: &str) -> bool {
    instance_states(output)
        .iter()
        .any(|state| state.eq_ignore_ascii_case("running"))
}

/// Names of apps in `cf apps` output that have `hostname` among their routes.
///
/// Apps are returned in listing order.
pub fn apps_on_route<'a>(output: &'a str, hostname: &str) -> Vec<&'a str> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let name = fields.next()?;
            let bound = fields
                .flat_map(|field| field.split(','))
                .map(|route| route.trim())
                .any(|route| {
                    route == hostname
                        || route
                            .strip_prefix(hostname)
                            .is_some_and(|rest| rest.starts_with('/'))
                });
            bound.then_some(name)
        })
        .collect()
}
