//! Directive validation.
//!
//! # Responsibilities
//! - Accept only known security headers unless custom headers are enabled
//! - Check each known header's value against its grammar
//! - Produce a normalized [`Directive`] carrying its wire representation
//!
//! # Design Decisions
//! - Pure function of `(mode, name, value)`: no I/O, no state
//! - Values are checked exactly as configured; surrounding whitespace is
//!   an error rather than something silently trimmed
//! - Framing and hop-by-hop headers are refused in every mode
//! - Runs at configuration time only, never per request

use axum::http::{HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};

use crate::policy::directive::{Directive, DirectiveName, KnownHeader};
use crate::policy::error::{ValidationError, ValidationFailure};

/// Which header names the validator accepts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HeaderMode {
    /// Only the known security headers.
    #[default]
    Strict,
    /// Any legal header name; unknown names only get a header-value check.
    Custom,
}

/// Validates directive names and values before they enter a policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct DirectiveValidator {
    mode: HeaderMode,
}

impl DirectiveValidator {
    pub fn new(mode: HeaderMode) -> Self {
        Self { mode }
    }

    /// Validator restricted to the known security headers.
    pub fn strict() -> Self {
        Self::new(HeaderMode::Strict)
    }

    /// Validator that also accepts arbitrary header names.
    pub fn allow_custom() -> Self {
        Self::new(HeaderMode::Custom)
    }

    pub fn mode(&self) -> HeaderMode {
        self.mode
    }

    /// Validate a name without a value (used for removals and protections).
    pub fn validate_name(&self, name: &str) -> Result<DirectiveName, ValidationError> {
        self.resolve(name).map(|(name, _)| name)
    }

    /// Validate a directive and normalize its name.
    pub fn validate(&self, name: &str, value: &str) -> Result<Directive, ValidationError> {
        let (canonical, header_name) = self.resolve(name)?;
        let fail = |reason| ValidationError::new(name, reason);

        if value != value.trim() {
            return Err(fail(ValidationFailure::Syntax(
                "leading or trailing whitespace".to_string(),
            )));
        }

        let header_value = HeaderValue::from_str(value).map_err(|_| {
            fail(ValidationFailure::InvalidValue(
                "not representable as an HTTP header value".to_string(),
            ))
        })?;

        if let Some(known) = canonical.known() {
            check_value(known, value).map_err(fail)?;
        }

        Ok(Directive::new(
            canonical,
            value.to_string(),
            header_name,
            header_value,
        ))
    }

    fn resolve(&self, name: &str) -> Result<(DirectiveName, HeaderName), ValidationError> {
        let header_name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|_| ValidationError::new(name, ValidationFailure::InvalidName))?;

        if is_reserved(&header_name) {
            return Err(ValidationError::new(name, ValidationFailure::ReservedHeader));
        }

        let canonical = DirectiveName::normalize(name);
        if canonical.known().is_none() && self.mode == HeaderMode::Strict {
            return Err(ValidationError::new(name, ValidationFailure::UnknownDirective));
        }
        Ok((canonical, header_name))
    }
}

/// Headers that frame the message or manage the connection. Writing them
/// from a policy would desynchronize the body from its framing.
fn is_reserved(name: &HeaderName) -> bool {
    matches!(
        name.as_str(),
        "connection"
            | "content-encoding"
            | "content-length"
            | "host"
            | "keep-alive"
            | "proxy-connection"
            | "te"
            | "trailer"
            | "transfer-encoding"
            | "upgrade"
    )
}

fn check_value(header: KnownHeader, value: &str) -> Result<(), ValidationFailure> {
    match header {
        KnownHeader::ContentSecurityPolicy => check_csp(value),
        KnownHeader::XContentTypeOptions => {
            if value == "nosniff" {
                Ok(())
            } else {
                Err(ValidationFailure::InvalidValue(format!(
                    "expected `nosniff`, got `{value}`"
                )))
            }
        }
        KnownHeader::XFrameOptions => check_frame_options(value),
        KnownHeader::StrictTransportSecurity => check_hsts(value),
        KnownHeader::XXssProtection => match value {
            "0" | "1" | "1; mode=block" => Ok(()),
            _ => Err(ValidationFailure::InvalidValue(format!(
                "expected `0`, `1` or `1; mode=block`, got `{value}`"
            ))),
        },
        KnownHeader::ReferrerPolicy => {
            if REFERRER_POLICIES.contains(&value) {
                Ok(())
            } else {
                Err(ValidationFailure::InvalidValue(format!(
                    "unknown referrer policy `{value}`"
                )))
            }
        }
        KnownHeader::PermissionsPolicy => check_permissions_policy(value),
    }
}

const REFERRER_POLICIES: &[&str] = &[
    "",
    "no-referrer",
    "no-referrer-when-downgrade",
    "origin",
    "origin-when-cross-origin",
    "same-origin",
    "strict-origin",
    "strict-origin-when-cross-origin",
    "unsafe-url",
];

// Content-Security-Policy

const CSP_KEYWORDS: &[&str] = &[
    "self",
    "none",
    "unsafe-inline",
    "unsafe-eval",
    "unsafe-hashes",
    "strict-dynamic",
    "report-sample",
    "wasm-unsafe-eval",
];

const CSP_HASH_PREFIXES: &[&str] = &["nonce-", "sha256-", "sha384-", "sha512-"];

/// Directives whose values are not source lists.
const CSP_OPAQUE_DIRECTIVES: &[&str] = &[
    "report-uri",
    "report-to",
    "sandbox",
    "trusted-types",
    "require-trusted-types-for",
];

fn check_csp(value: &str) -> Result<(), ValidationFailure> {
    let mut directives = 0;

    for entry in value.split(';') {
        let mut tokens = entry.split_ascii_whitespace();
        let Some(name) = tokens.next() else {
            continue;
        };
        if !name.bytes().all(|b| b.is_ascii_alphabetic() || b == b'-') {
            return Err(ValidationFailure::Syntax(format!(
                "malformed directive name `{name}`"
            )));
        }
        directives += 1;

        let name = name.to_ascii_lowercase();
        if CSP_OPAQUE_DIRECTIVES.contains(&name.as_str()) {
            continue;
        }
        for token in tokens {
            check_csp_source(token).map_err(|detail| {
                ValidationFailure::Syntax(format!("`{token}` in `{name}`: {detail}"))
            })?;
        }
    }

    if directives == 0 {
        return Err(ValidationFailure::Syntax("policy has no directives".to_string()));
    }
    Ok(())
}

fn check_csp_source(token: &str) -> Result<(), &'static str> {
    if let Some(rest) = token.strip_prefix('\'') {
        let keyword = rest.strip_suffix('\'').ok_or("unterminated quote")?;
        let keyword = keyword.to_ascii_lowercase();
        if CSP_KEYWORDS.contains(&keyword.as_str()) {
            return Ok(());
        }
        return match CSP_HASH_PREFIXES
            .iter()
            .find_map(|prefix| keyword.strip_prefix(prefix))
        {
            Some(digest) if is_base64(digest) => Ok(()),
            Some(_) => Err("malformed nonce or hash"),
            None => Err("unknown keyword"),
        };
    }

    if CSP_KEYWORDS.contains(&token.to_ascii_lowercase().as_str()) {
        return Err("keyword must be single-quoted");
    }
    if token == "*" {
        return Ok(());
    }
    if let Some(scheme) = token.strip_suffix(':') {
        return if is_scheme(scheme) {
            Ok(())
        } else {
            Err("malformed scheme")
        };
    }
    if is_host_source(token) {
        Ok(())
    } else {
        Err("not a scheme, keyword or host pattern")
    }
}

fn is_base64(s: &str) -> bool {
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'=' | b'-' | b'_'))
}

fn is_scheme(s: &str) -> bool {
    let mut bytes = s.bytes();
    matches!(bytes.next(), Some(b) if b.is_ascii_alphabetic())
        && bytes.all(|b| b.is_ascii_alphanumeric() || matches!(b, b'+' | b'-' | b'.'))
}

/// `[scheme://](*.)?host[:port|:*][/path]`
fn is_host_source(token: &str) -> bool {
    let rest = match token.split_once("://") {
        Some((scheme, rest)) if is_scheme(scheme) => rest,
        Some(_) => return false,
        None => token,
    };

    let (authority, path) = match rest.find('/') {
        Some(i) => rest.split_at(i),
        None => (rest, ""),
    };
    if path.contains(['\'', '"', ',']) {
        return false;
    }

    let (host, port) = match authority.rsplit_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (authority, None),
    };
    if let Some(port) = port {
        let numeric = !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit());
        if !(numeric || port == "*") {
            return false;
        }
    }

    is_host_pattern(host)
}

fn is_host_pattern(host: &str) -> bool {
    if host == "*" {
        return true;
    }
    let host = host.strip_prefix("*.").unwrap_or(host);
    !host.is_empty()
        && host.split('.').all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        })
}

// X-Frame-Options

fn check_frame_options(value: &str) -> Result<(), ValidationFailure> {
    if value.eq_ignore_ascii_case("DENY") || value.eq_ignore_ascii_case("SAMEORIGIN") {
        return Ok(());
    }

    let origin = value
        .split_once(' ')
        .filter(|(keyword, _)| keyword.eq_ignore_ascii_case("ALLOW-FROM"))
        .map(|(_, origin)| origin);

    match origin {
        Some(origin) if is_http_origin(origin) => Ok(()),
        Some(origin) => Err(ValidationFailure::InvalidValue(format!(
            "ALLOW-FROM origin `{origin}` is not an http(s) URL"
        ))),
        None => Err(ValidationFailure::InvalidValue(format!(
            "expected `DENY`, `SAMEORIGIN` or `ALLOW-FROM <origin>`, got `{value}`"
        ))),
    }
}

fn is_http_origin(origin: &str) -> bool {
    url::Url::parse(origin)
        .map(|url| matches!(url.scheme(), "http" | "https") && url.host().is_some())
        .unwrap_or(false)
}

// Strict-Transport-Security

fn check_hsts(value: &str) -> Result<(), ValidationFailure> {
    let mut parts = value.split(';').map(str::trim);

    let first = parts.next().unwrap_or_default();
    let max_age = first.strip_prefix("max-age=").ok_or_else(|| {
        ValidationFailure::Syntax("must start with `max-age=<seconds>`".to_string())
    })?;
    if max_age.is_empty() || !max_age.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ValidationFailure::Syntax(format!(
            "max-age `{max_age}` is not a non-negative integer"
        )));
    }

    let (mut include_subdomains, mut preload) = (false, false);
    for part in parts {
        match part {
            "includeSubDomains" if !include_subdomains => include_subdomains = true,
            "preload" if !preload => preload = true,
            other => {
                return Err(ValidationFailure::Syntax(format!(
                    "unexpected or repeated token `{other}`"
                )))
            }
        }
    }
    Ok(())
}

// Permissions-Policy

const PERMISSION_FEATURES: &[&str] = &[
    "accelerometer",
    "ambient-light-sensor",
    "autoplay",
    "battery",
    "bluetooth",
    "browsing-topics",
    "camera",
    "clipboard-read",
    "clipboard-write",
    "display-capture",
    "document-domain",
    "encrypted-media",
    "fullscreen",
    "gamepad",
    "geolocation",
    "gyroscope",
    "hid",
    "idle-detection",
    "interest-cohort",
    "local-fonts",
    "magnetometer",
    "microphone",
    "midi",
    "payment",
    "picture-in-picture",
    "publickey-credentials-get",
    "screen-wake-lock",
    "serial",
    "speaker-selection",
    "sync-xhr",
    "usb",
    "web-share",
    "xr-spatial-tracking",
];

fn check_permissions_policy(value: &str) -> Result<(), ValidationFailure> {
    if value.trim().is_empty() {
        return Err(ValidationFailure::Syntax("empty feature list".to_string()));
    }

    for item in value.split(',').map(str::trim) {
        let (feature, allow_list) = item.split_once('=').ok_or_else(|| {
            ValidationFailure::Syntax(format!("`{item}` is not `feature=(allow-list)`"))
        })?;
        if !PERMISSION_FEATURES.contains(&feature) {
            return Err(ValidationFailure::InvalidValue(format!(
                "unrecognized feature `{feature}`"
            )));
        }

        let members = allow_list
            .strip_prefix('(')
            .and_then(|list| list.strip_suffix(')'))
            .ok_or_else(|| {
                ValidationFailure::Syntax(format!(
                    "allow-list for `{feature}` must be parenthesized"
                ))
            })?;

        for member in members.split_ascii_whitespace() {
            let valid = match member {
                "self" | "*" => true,
                quoted => quoted
                    .strip_prefix('"')
                    .and_then(|origin| origin.strip_suffix('"'))
                    .is_some_and(is_http_origin),
            };
            if !valid {
                return Err(ValidationFailure::Syntax(format!(
                    "`{member}` in `{feature}` is not `self`, `*` or a quoted origin"
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict(name: &str, value: &str) -> Result<Directive, ValidationError> {
        DirectiveValidator::strict().validate(name, value)
    }

    fn reason(name: &str, value: &str) -> ValidationFailure {
        strict(name, value).unwrap_err().reason
    }

    #[test]
    fn test_unknown_directive_needs_custom_mode() {
        assert_eq!(reason("X-Powered-By", "me"), ValidationFailure::UnknownDirective);

        let directive = DirectiveValidator::allow_custom()
            .validate("x-powered-by", "me")
            .unwrap();
        assert_eq!(directive.name().as_str(), "X-Powered-By");
        assert_eq!(directive.value(), "me");
    }

    #[test]
    fn test_custom_mode_still_checks_known_grammar() {
        let validator = DirectiveValidator::allow_custom();
        assert!(validator.validate("X-Frame-Options", "MAYBE").is_err());
    }

    #[test]
    fn test_invalid_header_name() {
        let err = DirectiveValidator::allow_custom()
            .validate("Bad Header", "x")
            .unwrap_err();
        assert_eq!(err.reason, ValidationFailure::InvalidName);
        assert_eq!(err.directive, "Bad Header");
    }

    #[test]
    fn test_name_is_normalized() {
        let directive = strict("x-content-type-options", "nosniff").unwrap();
        assert_eq!(directive.name().as_str(), "X-Content-Type-Options");
        assert_eq!(directive.header_value(), "nosniff");
    }

    #[test]
    fn test_content_type_options() {
        assert!(strict("X-Content-Type-Options", "nosniff").is_ok());
        assert!(strict("X-Content-Type-Options", "NOSNIFF").is_err());
        assert!(strict("X-Content-Type-Options", " nosniff").is_err());
    }

    #[test]
    fn test_frame_options() {
        assert!(strict("X-Frame-Options", "DENY").is_ok());
        assert!(strict("X-Frame-Options", "SAMEORIGIN").is_ok());
        assert!(strict("X-Frame-Options", "ALLOW-FROM https://partner.example.com").is_ok());
        assert!(strict("X-Frame-Options", "ALLOW-FROM partner").is_err());
        assert!(matches!(
            reason("X-Frame-Options", "MAYBE"),
            ValidationFailure::InvalidValue(_)
        ));
    }

    #[test]
    fn test_hsts() {
        assert!(strict("Strict-Transport-Security", "max-age=0").is_ok());
        assert!(strict("Strict-Transport-Security", "max-age=31536000; includeSubDomains").is_ok());
        assert!(strict(
            "Strict-Transport-Security",
            "max-age=63072000; includeSubDomains; preload"
        )
        .is_ok());
        assert!(strict("Strict-Transport-Security", "max-age=-1").is_err());
        assert!(strict("Strict-Transport-Security", "max-age=soon").is_err());
        assert!(strict("Strict-Transport-Security", "includeSubDomains").is_err());
        assert!(strict("Strict-Transport-Security", "max-age=1; preload; preload").is_err());
        assert!(strict("Strict-Transport-Security", "max-age=1; always").is_err());
    }

    #[test]
    fn test_xss_protection() {
        for value in ["0", "1", "1; mode=block"] {
            assert!(strict("X-XSS-Protection", value).is_ok(), "{value}");
        }
        assert!(strict("X-XSS-Protection", "1; mode=report").is_err());
        assert!(strict("X-XSS-Protection", "2").is_err());
    }

    #[test]
    fn test_referrer_policy() {
        assert!(strict("Referrer-Policy", "no-referrer").is_ok());
        assert!(strict("Referrer-Policy", "strict-origin-when-cross-origin").is_ok());
        assert!(strict("Referrer-Policy", "").is_ok());
        assert!(strict("Referrer-Policy", "sometimes").is_err());
    }

    #[test]
    fn test_csp_accepts_common_policies() {
        for value in [
            "default-src 'self'",
            "default-src 'self'; script-src 'self' https://trusted-scripts.com",
            "default-src 'none'; img-src 'self' data: https:; frame-ancestors https://*.example.org",
            "connect-src 'self' wss://api.example.com:443 http://localhost:*",
            "script-src 'nonce-r4nd0m' 'sha256-abc+/=' 'strict-dynamic'; upgrade-insecure-requests",
            "default-src *; report-uri /csp-report;",
            "sandbox allow-scripts allow-forms",
        ] {
            assert!(strict("Content-Security-Policy", value).is_ok(), "{value}");
        }
    }

    #[test]
    fn test_csp_rejects_malformed_tokens() {
        for value in [
            "",
            " ; ",
            "default-src self",
            "default-src 'self",
            "default-src 'sometimes'",
            "default-src https://bad_host",
            "default-src example.com:http",
            "script_src 'self'",
            "default-src -example.com",
        ] {
            assert!(
                matches!(reason("Content-Security-Policy", value), ValidationFailure::Syntax(_)),
                "{value}"
            );
        }
    }

    #[test]
    fn test_permissions_policy() {
        assert!(strict(
            "Permissions-Policy",
            "geolocation=(self), camera=(), microphone=()"
        )
        .is_ok());
        assert!(strict("Permissions-Policy", "fullscreen=(self \"https://player.example.com\")").is_ok());
        assert!(strict("Permissions-Policy", "autoplay=(*)").is_ok());

        assert!(matches!(
            reason("Permissions-Policy", "teleport=()"),
            ValidationFailure::InvalidValue(_)
        ));
        assert!(strict("Permissions-Policy", "camera").is_err());
        assert!(strict("Permissions-Policy", "camera=self").is_err());
        assert!(strict("Permissions-Policy", "camera=(everyone)").is_err());
        assert!(strict("Permissions-Policy", "").is_err());
    }

    #[test]
    fn test_value_must_be_header_safe() {
        let err = DirectiveValidator::allow_custom()
            .validate("X-Note", "line\nbreak")
            .unwrap_err();
        assert!(matches!(err.reason, ValidationFailure::InvalidValue(_)));
    }

    #[test]
    fn test_surrounding_whitespace_rejected() {
        for (name, value) in [
            ("Strict-Transport-Security", "  max-age=1  "),
            ("Content-Security-Policy", " default-src 'self' "),
            ("Permissions-Policy", "camera=() "),
            ("X-Content-Type-Options", " nosniff"),
        ] {
            assert!(
                matches!(reason(name, value), ValidationFailure::Syntax(_)),
                "{name}: `{value}` accepted"
            );
        }
        assert!(DirectiveValidator::allow_custom().validate("X-Note", "padded ").is_err());
        assert!(strict("Strict-Transport-Security", "max-age=1; preload").is_ok());
    }

    #[test]
    fn test_hsts_max_age_has_no_upper_bound() {
        assert!(strict("Strict-Transport-Security", "max-age=99999999999999999999").is_ok());
        assert!(strict("Strict-Transport-Security", "max-age=-1").is_err());
    }

    #[test]
    fn test_framing_headers_rejected_in_custom_mode() {
        let custom = DirectiveValidator::allow_custom();
        for name in [
            "Content-Length",
            "Transfer-Encoding",
            "Connection",
            "Host",
            "Upgrade",
            "keep-alive",
        ] {
            let err = custom.validate(name, "0").unwrap_err();
            assert_eq!(err.reason, ValidationFailure::ReservedHeader, "{name}");
            assert_eq!(err.directive, name);
            assert!(custom.validate_name(name).is_err());
        }
        assert!(custom.validate("X-Robots-Tag", "noindex").is_ok());
    }
}
