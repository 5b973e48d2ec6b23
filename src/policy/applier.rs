//! Writing an effective policy onto a response.
//!
//! # Response Lifecycle
//! ```text
//! HeadersOpen ──flush head──▶ HeadersSent ──first body byte──▶ BodyStreaming
//!     ▲
//!     └── apply() is only legal here
//! ```
//!
//! The phase travels with the response as an extension. Responses built by
//! ordinary handlers carry none and are headers-open; an integration that
//! flushes early marks the response with [`mark_phase`].
//!
//! # Overwrite Rules
//! - Policy headers replace any value set earlier (handler or inner layers)
//! - A protected name is written only if the response lacks it, and once
//!   written it is recorded in [`ProtectedHeaders`] so no later `apply` on
//!   the same response changes it

use std::collections::HashSet;
use std::fmt;

use axum::http::{HeaderName, Response};

use crate::policy::error::LifecycleViolation;
use crate::policy::merger::EffectivePolicy;

/// Where a response is in its lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponsePhase {
    #[default]
    HeadersOpen,
    HeadersSent,
    BodyStreaming,
}

impl fmt::Display for ResponsePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResponsePhase::HeadersOpen => "headers-open",
            ResponsePhase::HeadersSent => "headers-sent",
            ResponsePhase::BodyStreaming => "body-streaming",
        })
    }
}

/// Header names frozen on a response by a protecting policy.
#[derive(Debug, Clone, Default)]
pub struct ProtectedHeaders(HashSet<HeaderName>);

impl ProtectedHeaders {
    pub fn contains(&self, name: &HeaderName) -> bool {
        self.0.contains(name)
    }
}

/// Record that a response has moved to `phase`.
pub fn mark_phase<B>(response: &mut Response<B>, phase: ResponsePhase) {
    response.extensions_mut().insert(phase);
}

/// Current lifecycle phase of a response.
pub fn phase_of<B>(response: &Response<B>) -> ResponsePhase {
    response
        .extensions()
        .get::<ResponsePhase>()
        .copied()
        .unwrap_or_default()
}

/// Write every directive of `policy` onto `response`.
///
/// Idempotent: applying the same policy twice leaves exactly one value per
/// header, equal to the policy's value.
pub fn apply<B>(policy: &EffectivePolicy, response: &mut Response<B>) -> Result<(), LifecycleViolation> {
    let phase = phase_of(response);
    if phase != ResponsePhase::HeadersOpen {
        return Err(LifecycleViolation {
            phase,
            pending: policy.iter().map(|d| d.name().to_string()).collect(),
        });
    }

    let mut frozen = response
        .extensions_mut()
        .remove::<ProtectedHeaders>()
        .unwrap_or_default();
    let headers = response.headers_mut();

    for directive in policy.iter() {
        let name = directive.header_name();
        if frozen.contains(name) {
            continue;
        }
        if policy.is_protected(directive.name()) {
            if !headers.contains_key(name) {
                headers.insert(name.clone(), directive.header_value().clone());
            }
            frozen.0.insert(name.clone());
        } else {
            headers.insert(name.clone(), directive.header_value().clone());
        }
    }

    if !frozen.0.is_empty() {
        response.extensions_mut().insert(frozen);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::merger::merge;
    use crate::policy::overrides::RouteOverride;
    use crate::policy::store::PolicyStore;
    use crate::policy::validator::DirectiveValidator;

    fn policy(pairs: &[(&str, &str)]) -> EffectivePolicy {
        let store = PolicyStore::build(pairs.iter().copied(), &DirectiveValidator::strict()).unwrap();
        EffectivePolicy::from(&store)
    }

    #[test]
    fn test_apply_overwrites_existing_values() {
        let mut response = Response::builder()
            .header("X-Frame-Options", "SAMEORIGIN")
            .header("X-Frame-Options", "ALLOW-FROM https://a.example")
            .body(())
            .unwrap();

        apply(&policy(&[("X-Frame-Options", "DENY")]), &mut response).unwrap();

        let values: Vec<_> = response.headers().get_all("x-frame-options").iter().collect();
        assert_eq!(values, vec!["DENY"]);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let policy = policy(&[("X-Content-Type-Options", "nosniff"), ("Referrer-Policy", "no-referrer")]);
        let mut response = Response::new(());

        apply(&policy, &mut response).unwrap();
        apply(&policy, &mut response).unwrap();

        assert_eq!(response.headers().len(), 2);
        assert_eq!(response.headers().get_all("referrer-policy").iter().count(), 1);
        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
    }

    #[test]
    fn test_apply_leaves_status_and_body_alone() {
        let mut response = Response::builder().status(418).body("teapot").unwrap();
        apply(&policy(&[("X-XSS-Protection", "0")]), &mut response).unwrap();

        assert_eq!(response.status(), 418);
        assert_eq!(*response.body(), "teapot");
    }

    #[test]
    fn test_apply_after_headers_sent_is_a_violation() {
        let mut response = Response::new(());
        mark_phase(&mut response, ResponsePhase::BodyStreaming);

        let err = apply(&policy(&[("X-Frame-Options", "DENY")]), &mut response).unwrap_err();
        assert_eq!(err.phase, ResponsePhase::BodyStreaming);
        assert_eq!(err.pending, vec!["X-Frame-Options".to_string()]);
        assert!(response.headers().is_empty());
    }

    #[test]
    fn test_protected_name_keeps_existing_value() {
        let validator = DirectiveValidator::strict();
        let store = PolicyStore::build([("Content-Security-Policy", "default-src 'self'")], &validator).unwrap();
        let route = RouteOverride::builder(&validator)
            .protect("Content-Security-Policy")
            .unwrap()
            .build();

        let mut response = Response::builder()
            .header("Content-Security-Policy", "default-src 'none'")
            .body(())
            .unwrap();
        apply(&merge(&store, &route), &mut response).unwrap();
        assert_eq!(response.headers()["content-security-policy"], "default-src 'none'");

        // A later, unprotected policy may not change the frozen header.
        apply(&EffectivePolicy::from(&store), &mut response).unwrap();
        assert_eq!(response.headers()["content-security-policy"], "default-src 'none'");
    }

    #[test]
    fn test_protected_name_is_written_when_absent() {
        let validator = DirectiveValidator::strict();
        let store = PolicyStore::build([("X-Frame-Options", "DENY")], &validator).unwrap();
        let route = RouteOverride::builder(&validator)
            .protect("X-Frame-Options")
            .unwrap()
            .build();

        let mut response = Response::new(());
        apply(&merge(&store, &route), &mut response).unwrap();
        assert_eq!(response.headers()["x-frame-options"], "DENY");

        let other = policy(&[("X-Frame-Options", "SAMEORIGIN")]);
        apply(&other, &mut response).unwrap();
        assert_eq!(response.headers()["x-frame-options"], "DENY");
    }
}
