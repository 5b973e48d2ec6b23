//! Route lookup.
//!
//! # Responsibilities
//! - Store compiled routes with their header overrides
//! - Look up the matching route for a request target
//! - Return matched route or explicit no-match
//!
//! # Design Decisions
//! - Immutable after construction (thread-safe without locks)
//! - O(n) scan in priority order (acceptable for typical route counts)
//! - Equal priorities keep registration order
//! - Explicit `None` rather than silent default

use crate::policy::RouteOverride;
use crate::routing::matcher::{AndMatcher, HostMatcher, Matcher, PathPrefixMatcher, RequestTarget};

/// A route with its header-policy override.
#[derive(Debug)]
pub struct PolicyRoute {
    name: String,
    host: Option<String>,
    path_prefix: Option<String>,
    priority: u32,
    matcher: AndMatcher,
    overrides: RouteOverride,
}

impl PolicyRoute {
    pub fn new(
        name: impl Into<String>,
        host: Option<String>,
        path_prefix: Option<String>,
        priority: u32,
        overrides: RouteOverride,
    ) -> Self {
        let mut matchers: Vec<Box<dyn Matcher>> = Vec::new();
        if let Some(host) = &host {
            matchers.push(Box::new(HostMatcher::new(host.clone())));
        }
        if let Some(prefix) = &path_prefix {
            matchers.push(Box::new(PathPrefixMatcher::new(prefix.clone())));
        }

        Self {
            name: name.into(),
            host,
            path_prefix,
            priority,
            matcher: AndMatcher::new(matchers),
            overrides,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn host(&self) -> Option<&str> {
        self.host.as_deref()
    }

    pub fn path_prefix(&self) -> Option<&str> {
        self.path_prefix.as_deref()
    }

    pub fn priority(&self) -> u32 {
        self.priority
    }

    pub fn overrides(&self) -> &RouteOverride {
        &self.overrides
    }

    pub fn matches(&self, target: &RequestTarget<'_>) -> bool {
        self.matcher.matches(target)
    }
}

/// Priority-ordered set of policy routes.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<PolicyRoute>,
}

impl RouteTable {
    pub fn new(mut routes: Vec<PolicyRoute>) -> Self {
        // Stable sort: ties stay in registration order.
        routes.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self { routes }
    }

    /// First route, in priority order, that matches the target.
    pub fn match_target(&self, target: &RequestTarget<'_>) -> Option<&PolicyRoute> {
        self.routes.iter().find(|route| route.matches(target))
    }

    pub fn iter(&self) -> impl Iterator<Item = &PolicyRoute> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn route(name: &str, host: Option<&str>, prefix: Option<&str>, priority: u32) -> PolicyRoute {
        PolicyRoute::new(
            name,
            host.map(str::to_string),
            prefix.map(str::to_string),
            priority,
            RouteOverride::default(),
        )
    }

    #[test]
    fn test_highest_priority_wins() {
        let table = RouteTable::new(vec![
            route("all", None, Some("/"), 0),
            route("api", None, Some("/api"), 10),
        ]);

        let target = RequestTarget::new(None, "/api/users");
        assert_eq!(table.match_target(&target).map(PolicyRoute::name), Some("api"));

        let target = RequestTarget::new(None, "/index.html");
        assert_eq!(table.match_target(&target).map(PolicyRoute::name), Some("all"));
    }

    #[test]
    fn test_ties_keep_registration_order() {
        let table = RouteTable::new(vec![
            route("first", None, Some("/docs"), 5),
            route("second", None, Some("/docs"), 5),
        ]);

        let target = RequestTarget::new(None, "/docs/intro");
        assert_eq!(table.match_target(&target).map(PolicyRoute::name), Some("first"));
    }

    #[test]
    fn test_no_match() {
        let table = RouteTable::new(vec![route("admin", Some("admin.example.com"), None, 0)]);
        let target = RequestTarget::new(Some("www.example.com"), "/");
        assert!(table.match_target(&target).is_none());
    }
}
