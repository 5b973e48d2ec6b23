//! Per-route adjustments to the global policy.

use std::collections::{BTreeMap, BTreeSet};

use crate::policy::directive::{Directive, DirectiveName};
use crate::policy::error::ValidationError;
use crate::policy::validator::DirectiveValidator;

/// What a route does with one directive.
///
/// `Remove` drops the header entirely, which is not the same as setting it
/// to an empty value (`Referrer-Policy: ""` is meaningful).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OverrideAction {
    Set(Directive),
    Remove,
}

/// Validated set/remove/protect entries registered with a route.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RouteOverride {
    actions: BTreeMap<DirectiveName, OverrideAction>,
    protected: BTreeSet<DirectiveName>,
}

impl RouteOverride {
    /// Start registering entries, validating each with `validator`.
    pub fn builder(validator: &DirectiveValidator) -> RouteOverrideBuilder<'_> {
        RouteOverrideBuilder {
            validator,
            inner: Self::default(),
        }
    }

    pub fn actions(&self) -> impl Iterator<Item = (&DirectiveName, &OverrideAction)> {
        self.actions.iter()
    }

    pub fn protected(&self) -> impl Iterator<Item = &DirectiveName> {
        self.protected.iter()
    }

    pub fn is_protected(&self, name: &DirectiveName) -> bool {
        self.protected.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty() && self.protected.is_empty()
    }
}

/// Builder for [`RouteOverride`]; every entry passes the validator.
///
/// A later entry for the same name replaces an earlier one.
#[derive(Debug)]
pub struct RouteOverrideBuilder<'a> {
    validator: &'a DirectiveValidator,
    inner: RouteOverride,
}

impl RouteOverrideBuilder<'_> {
    pub fn set(mut self, name: &str, value: &str) -> Result<Self, ValidationError> {
        let directive = self.validator.validate(name, value)?;
        self.inner
            .actions
            .insert(directive.name().clone(), OverrideAction::Set(directive));
        Ok(self)
    }

    pub fn remove(mut self, name: &str) -> Result<Self, ValidationError> {
        let name = self.validator.validate_name(name)?;
        self.inner.actions.insert(name, OverrideAction::Remove);
        Ok(self)
    }

    /// Keep whatever value this header already has on the response.
    pub fn protect(mut self, name: &str) -> Result<Self, ValidationError> {
        let name = self.validator.validate_name(name)?;
        self.inner.protected.insert(name);
        Ok(self)
    }

    pub fn build(self) -> RouteOverride {
        self.inner
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::error::ValidationFailure;

    #[test]
    fn test_builder_validates_entries() {
        let validator = DirectiveValidator::strict();

        let err = RouteOverride::builder(&validator)
            .set("X-Frame-Options", "SOMETIMES")
            .unwrap_err();
        assert_eq!(err.directive, "X-Frame-Options");

        let err = RouteOverride::builder(&validator)
            .remove("X-Unknown")
            .err()
            .unwrap();
        assert_eq!(err.reason, ValidationFailure::UnknownDirective);
    }

    #[test]
    fn test_later_entry_wins() {
        let validator = DirectiveValidator::strict();
        let route = RouteOverride::builder(&validator)
            .set("Referrer-Policy", "origin")
            .unwrap()
            .remove("referrer-policy")
            .unwrap()
            .build();

        let actions: Vec<_> = route.actions().collect();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].0.as_str(), "Referrer-Policy");
        assert_eq!(actions[0].1, &OverrideAction::Remove);
    }

    #[test]
    fn test_protect_normalizes_name() {
        let validator = DirectiveValidator::strict();
        let route = RouteOverride::builder(&validator)
            .protect("content-security-policy")
            .unwrap()
            .build();

        assert!(route.is_protected(&DirectiveName::normalize("Content-Security-Policy")));
        assert!(!route.is_empty());
    }
}
