// ABOUTME: Route addressing for app traffic.
// ABOUTME: A route is a domain with an optional hostname in front of it.

use std::fmt;

/// A route an application can be mapped to.
///
/// Without a host the route is the bare domain itself (apex-style mapping).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Route {
    pub domain: String,
    pub host: Option<String>,
}

impl Route {
    pub fn new(domain: impl Into<String>, host: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            host: Some(host.into()),
        }
    }

    pub fn bare(domain: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            host: None,
        }
    }

    /// Fully qualified hostname this route answers on.
    pub fn hostname(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.host {
            Some(host) => write!(f, "{}.{}", host, self.domain),
            None => f.write_str(&self.domain),
        }
    }
}
