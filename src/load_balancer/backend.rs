//! Backend group snapshots.
//!
//! # Responsibilities
//! - Represent one backend group and its servers as last read from the balancer
//! - Expose server lookup by name prefix and counter lookup by name
//!
//! Snapshots are plain data; mutations go through the adapter.

use std::collections::HashMap;

/// HTTP response-class counters summed to get a pool's traffic.
pub const RESPONSE_COUNTERS: &[&str] = &[
    "hrsp_1xx",
    "hrsp_2xx",
    "hrsp_3xx",
    "hrsp_4xx",
    "hrsp_5xx",
    "hrsp_other",
];

/// A single server inside a backend group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    pub name: String,
    /// Raw balancer weight. Rollout weights stay within 0..=100 but the
    /// balancer itself may report larger values.
    pub weight: u32,
}

impl Server {
    pub fn new(name: impl Into<String>, weight: u32) -> Self {
        Self { name: name.into(), weight }
    }
}

/// A named collection of servers with cumulative counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackendGroup {
    pub name: String,
    pub servers: Vec<Server>,
    pub counters: HashMap<String, u64>,
}

impl BackendGroup {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), ..Default::default() }
    }

    /// Servers whose name starts with `prefix`, in balancer order.
    pub fn servers<'a>(&'a self, prefix: &'a str) -> impl Iterator<Item = &'a Server> + 'a {
        self.servers.iter().filter(move |s| s.name.starts_with(prefix))
    }

    /// Value of a cumulative counter; unknown counters read as zero.
    pub fn metric(&self, counter: &str) -> u64 {
        self.counters.get(counter).copied().unwrap_or(0)
    }

    /// Sum of all HTTP response-class counters.
    pub fn response_total(&self) -> u64 {
        RESPONSE_COUNTERS.iter().map(|c| self.metric(c)).sum()
    }

    /// Whether this group belongs to application `app`.
    ///
    /// Matches `app` itself and any `app-<variant>` group.
    pub fn belongs_to(&self, app: &str) -> bool {
        match self.name.strip_prefix(app) {
            Some(rest) => rest.is_empty() || rest.starts_with('-'),
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group() -> BackendGroup {
        let mut g = BackendGroup::new("foo");
        g.servers.push(Server::new("foo-legacy-1", 30));
        g.servers.push(Server::new("foo-kubernetes-1", 70));
        g.servers.push(Server::new("foo-legacy-2", 30));
        g.counters.insert("hrsp_2xx".into(), 90);
        g.counters.insert("hrsp_5xx".into(), 10);
        g.counters.insert("stot".into(), 500);
        g
    }

    #[test]
    fn test_servers_by_prefix() {
        let g = group();
        let names: Vec<_> = g.servers("foo-legacy").map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["foo-legacy-1", "foo-legacy-2"]);
        assert_eq!(g.servers("bar").count(), 0);
    }

    #[test]
    fn test_response_total_ignores_other_counters() {
        let g = group();
        assert_eq!(g.response_total(), 100);
        assert_eq!(g.metric("hrsp_4xx"), 0);
    }

    #[test]
    fn test_belongs_to() {
        assert!(BackendGroup::new("foo").belongs_to("foo"));
        assert!(BackendGroup::new("foo-eu").belongs_to("foo"));
        assert!(!BackendGroup::new("foobar").belongs_to("foo"));
        assert!(!BackendGroup::new("bar-foo").belongs_to("foo"));
    }
}
