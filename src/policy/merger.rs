//! Merging the global policy with a route override.
//!
//! # Design Decisions
//! - Pure and infallible: overrides were validated when the route was registered
//! - Computed per request from immutable inputs; never cached
//! - Deterministic: names are unique keys, so entry order cannot matter

use std::collections::{BTreeMap, BTreeSet};

use crate::policy::directive::{Directive, DirectiveName};
use crate::policy::overrides::{OverrideAction, RouteOverride};
use crate::policy::store::PolicyStore;

/// The header set written to one response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EffectivePolicy {
    directives: BTreeMap<DirectiveName, Directive>,
    protected: BTreeSet<DirectiveName>,
}

impl EffectivePolicy {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.directives
            .get(&DirectiveName::normalize(name))
            .map(Directive::value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Directive> {
        self.directives.values()
    }

    /// Whether the route protected this name.
    pub fn is_protected(&self, name: &DirectiveName) -> bool {
        self.protected.contains(name)
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

/// Layer `route` on top of `base`.
pub fn merge(base: &PolicyStore, route: &RouteOverride) -> EffectivePolicy {
    let mut directives = base.directives().clone();

    for (name, action) in route.actions() {
        match action {
            OverrideAction::Set(directive) => {
                directives.insert(name.clone(), directive.clone());
            }
            OverrideAction::Remove => {
                directives.remove(name);
            }
        }
    }

    // Protection only means something for headers this policy writes.
    let protected = route
        .protected()
        .filter(|name| directives.contains_key(*name))
        .cloned()
        .collect();

    EffectivePolicy {
        directives,
        protected,
    }
}

impl From<&PolicyStore> for EffectivePolicy {
    fn from(base: &PolicyStore) -> Self {
        merge(base, &RouteOverride::default())
    }
}
