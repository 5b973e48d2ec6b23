//! The header policy engine: current snapshot plus atomic reload.
//!
//! # Design Decisions
//! - A snapshot (store + routes) is one immutable unit; reload replaces it whole
//! - Readers take an `Arc` once per request and keep it until the response is
//!   written, so a request never sees a half-updated policy
//! - No locks: `ArcSwap` gives wait-free loads and atomic stores

use std::sync::Arc;

use arc_swap::ArcSwap;

use crate::observability::metrics;
use crate::policy::merger::{merge, EffectivePolicy};
use crate::policy::store::PolicyStore;
use crate::routing::{PolicyRoute, RequestTarget, RouteTable};

/// Immutable global policy and route overrides, as loaded from one config.
#[derive(Debug, Default)]
pub struct PolicySnapshot {
    store: PolicyStore,
    routes: RouteTable,
}

impl PolicySnapshot {
    pub fn new(store: PolicyStore, routes: RouteTable) -> Self {
        Self { store, routes }
    }

    pub fn store(&self) -> &PolicyStore {
        &self.store
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Resolve the route for `target` and merge its override into the store.
    pub fn effective_for(&self, target: &RequestTarget<'_>) -> (Option<&PolicyRoute>, EffectivePolicy) {
        match self.routes.match_target(target) {
            Some(route) => (Some(route), merge(&self.store, route.overrides())),
            None => (None, EffectivePolicy::from(&self.store)),
        }
    }
}

/// Shared handle to the active policy.
#[derive(Debug)]
pub struct HeaderPolicyEngine {
    current: ArcSwap<PolicySnapshot>,
}

impl HeaderPolicyEngine {
    pub fn new(snapshot: PolicySnapshot) -> Self {
        metrics::record_directive_count(snapshot.store().len());
        Self {
            current: ArcSwap::from_pointee(snapshot),
        }
    }

    /// The active snapshot.
    pub fn snapshot(&self) -> Arc<PolicySnapshot> {
        self.current.load_full()
    }

    /// Atomically replace the active snapshot, returning the previous one.
    ///
    /// Requests already holding the previous snapshot finish with it.
    pub fn reload(&self, next: PolicySnapshot) -> Arc<PolicySnapshot> {
        let directives = next.store().len();
        let routes = next.routes().len();
        let previous = self.current.swap(Arc::new(next));

        metrics::record_reload("applied");
        metrics::record_directive_count(directives);
        tracing::info!(directives, routes, "Header policy reloaded");
        previous
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{DirectiveValidator, RouteOverride};

    fn snapshot(frame_options: &str) -> PolicySnapshot {
        let validator = DirectiveValidator::strict();
        let store = PolicyStore::build([("X-Frame-Options", frame_options)], &validator).unwrap();
        let embed = RouteOverride::builder(&validator)
            .remove("X-Frame-Options")
            .unwrap()
            .build();
        let routes = RouteTable::new(vec![PolicyRoute::new(
            "embed",
            None,
            Some("/embed".to_string()),
            0,
            embed,
        )]);
        PolicySnapshot::new(store, routes)
    }

    #[test]
    fn test_effective_for_route_and_default() {
        let snapshot = snapshot("DENY");

        let (route, policy) = snapshot.effective_for(&RequestTarget::new(None, "/embed/player"));
        assert_eq!(route.map(PolicyRoute::name), Some("embed"));
        assert!(policy.is_empty());

        let (route, policy) = snapshot.effective_for(&RequestTarget::new(None, "/"));
        assert!(route.is_none());
        assert_eq!(policy.get("X-Frame-Options"), Some("DENY"));
    }

    #[test]
    fn test_reload_swaps_snapshot() {
        let engine = HeaderPolicyEngine::new(snapshot("DENY"));
        let held = engine.snapshot();

        let previous = engine.reload(snapshot("SAMEORIGIN"));

        assert!(Arc::ptr_eq(&held, &previous));
        assert_eq!(held.store().get("X-Frame-Options"), Some("DENY"));
        assert_eq!(engine.snapshot().store().get("X-Frame-Options"), Some("SAMEORIGIN"));
    }
}
