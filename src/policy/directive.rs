//! Directive names and validated directives.
//!
//! # Design Decisions
//! - Names are case-insensitive; every name is normalized to one canonical
//!   spelling, so equality on the canonical form is case-insensitive equality
//! - Known security headers keep their registered casing (`X-XSS-Protection`),
//!   custom headers get each `-` segment capitalized (`X-Powered-By`)
//! - A `Directive` carries its wire form (`HeaderName`/`HeaderValue`) so that
//!   applying it to a response can never fail

use std::fmt;

use axum::http::{HeaderName, HeaderValue};

/// Security headers with a dedicated value grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum KnownHeader {
    ContentSecurityPolicy,
    XContentTypeOptions,
    XFrameOptions,
    StrictTransportSecurity,
    XXssProtection,
    ReferrerPolicy,
    PermissionsPolicy,
}

impl KnownHeader {
    pub const ALL: [KnownHeader; 7] = [
        KnownHeader::ContentSecurityPolicy,
        KnownHeader::XContentTypeOptions,
        KnownHeader::XFrameOptions,
        KnownHeader::StrictTransportSecurity,
        KnownHeader::XXssProtection,
        KnownHeader::ReferrerPolicy,
        KnownHeader::PermissionsPolicy,
    ];

    /// Registered spelling of the header name.
    pub fn canonical_name(self) -> &'static str {
        match self {
            KnownHeader::ContentSecurityPolicy => "Content-Security-Policy",
            KnownHeader::XContentTypeOptions => "X-Content-Type-Options",
            KnownHeader::XFrameOptions => "X-Frame-Options",
            KnownHeader::StrictTransportSecurity => "Strict-Transport-Security",
            KnownHeader::XXssProtection => "X-XSS-Protection",
            KnownHeader::ReferrerPolicy => "Referrer-Policy",
            KnownHeader::PermissionsPolicy => "Permissions-Policy",
        }
    }

    /// Look up a known header, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|header| header.canonical_name().eq_ignore_ascii_case(name))
    }
}

impl fmt::Display for KnownHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.canonical_name())
    }
}

/// A directive name in canonical casing.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DirectiveName(String);

impl DirectiveName {
    /// Normalize any spelling of a header name to its canonical form.
    ///
    /// This does not check that the name is allowed; see
    /// [`DirectiveValidator`](crate::policy::DirectiveValidator) for that.
    pub fn normalize(name: &str) -> Self {
        match KnownHeader::from_name(name) {
            Some(known) => Self::from(known),
            None => Self(canonical_custom(name)),
        }
    }

    /// The known header this name refers to, if any.
    pub fn known(&self) -> Option<KnownHeader> {
        KnownHeader::from_name(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<KnownHeader> for DirectiveName {
    fn from(header: KnownHeader) -> Self {
        Self(header.canonical_name().to_string())
    }
}

impl fmt::Display for DirectiveName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn canonical_custom(name: &str) -> String {
    name.split('-')
        .map(|segment| {
            let mut chars = segment.chars();
            match chars.next() {
                Some(first) => first
                    .to_ascii_uppercase()
                    .to_string()
                    + &chars.as_str().to_ascii_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// A validated header directive, ready to be written to a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    name: DirectiveName,
    value: String,
    header_name: HeaderName,
    header_value: HeaderValue,
}

impl Directive {
    /// Only the validator builds directives; it has already checked that
    /// both parts are valid on the wire.
    pub(crate) fn new(
        name: DirectiveName,
        value: String,
        header_name: HeaderName,
        header_value: HeaderValue,
    ) -> Self {
        Self {
            name,
            value,
            header_name,
            header_value,
        }
    }

    pub fn name(&self) -> &DirectiveName {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn header_name(&self) -> &HeaderName {
        &self.header_name
    }

    pub fn header_value(&self) -> &HeaderValue {
        &self.header_value
    }
}
