//! The global default policy.
//!
//! # Design Decisions
//! - Built all-or-nothing: the first invalid directive aborts construction
//! - Immutable once built; a new configuration produces a new store
//! - Setting the same name twice keeps the last value (names are unique keys)

use std::collections::BTreeMap;

use crate::policy::directive::{Directive, DirectiveName};
use crate::policy::error::ValidationError;
use crate::policy::validator::DirectiveValidator;

/// Canonical set of default header directives.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PolicyStore {
    directives: BTreeMap<DirectiveName, Directive>,
}

impl PolicyStore {
    /// Validate every `(name, value)` pair and build the store.
    pub fn build<I, N, V>(
        directives: I,
        validator: &DirectiveValidator,
    ) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (N, V)>,
        N: AsRef<str>,
        V: AsRef<str>,
    {
        let mut validated = BTreeMap::new();
        for (name, value) in directives {
            let directive = validator.validate(name.as_ref(), value.as_ref())?;
            validated.insert(directive.name().clone(), directive);
        }
        Ok(Self {
            directives: validated,
        })
    }

    /// Configured value for a header name, in any casing.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.directive(name).map(Directive::value)
    }

    pub fn directive(&self, name: &str) -> Option<&Directive> {
        self.directives.get(&DirectiveName::normalize(name))
    }

    /// All `(name, value)` pairs, ordered by name.
    pub fn all(&self) -> impl Iterator<Item = (&str, &str)> {
        self.directives
            .values()
            .map(|directive| (directive.name().as_str(), directive.value()))
    }

    pub fn len(&self) -> usize {
        self.directives.len()
    }

    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }

    pub(crate) fn directives(&self) -> &BTreeMap<DirectiveName, Directive> {
        &self.directives
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::error::ValidationFailure;

    #[test]
    fn test_build_and_get() {
        let store = PolicyStore::build(
            [
                ("X-Content-Type-Options", "nosniff"),
                ("strict-transport-security", "max-age=31536000; includeSubDomains"),
                ("Referrer-Policy", ""),
            ],
            &DirectiveValidator::strict(),
        )
        .unwrap();

        assert_eq!(store.len(), 3);
        assert_eq!(store.get("x-content-type-options"), Some("nosniff"));
        assert_eq!(
            store.get("Strict-Transport-Security"),
            Some("max-age=31536000; includeSubDomains")
        );
        assert_eq!(store.get("Referrer-Policy"), Some(""));
        assert_eq!(store.get("X-Frame-Options"), None);
    }

    #[test]
    fn test_duplicate_name_overwrites() {
        let store = PolicyStore::build(
            [("X-Frame-Options", "DENY"), ("x-frame-options", "SAMEORIGIN")],
            &DirectiveValidator::strict(),
        )
        .unwrap();

        assert_eq!(store.len(), 1);
        assert_eq!(store.get("X-Frame-Options"), Some("SAMEORIGIN"));
    }

    #[test]
    fn test_first_failure_aborts_build() {
        let err = PolicyStore::build(
            [
                ("X-Content-Type-Options", "nosniff"),
                ("X-Frame-Options", "MAYBE"),
                ("X-XSS-Protection", "nonsense"),
            ],
            &DirectiveValidator::strict(),
        )
        .unwrap_err();

        assert_eq!(err.directive, "X-Frame-Options");
        assert!(matches!(err.reason, ValidationFailure::InvalidValue(_)));
    }

    #[test]
    fn test_custom_store_refuses_framing_headers() {
        let err = PolicyStore::build(
            [("X-Robots-Tag", "noindex"), ("Content-Length", "0"), ("Transfer-Encoding", "chunked")],
            &DirectiveValidator::allow_custom(),
        )
        .unwrap_err();

        assert_eq!(err.directive, "Content-Length");
        assert_eq!(err.reason, ValidationFailure::ReservedHeader);
    }

    #[test]
    fn test_all_lists_canonical_names() {
        let store = PolicyStore::build(
            [("referrer-policy", "no-referrer"), ("x-frame-options", "DENY")],
            &DirectiveValidator::strict(),
        )
        .unwrap();

        let all: Vec<_> = store.all().collect();
        assert_eq!(
            all,
            vec![("Referrer-Policy", "no-referrer"), ("X-Frame-Options", "DENY")]
        );
    }
}
