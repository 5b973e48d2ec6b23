//! Policy error types.

use thiserror::Error;

use crate::policy::applier::ResponsePhase;

/// A configured directive was rejected.
///
/// Raised while building a policy store or registering a route override.
/// It never reaches request handling: the configuration that produced it is
/// refused as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid directive `{directive}`: {reason}")]
pub struct ValidationError {
    /// The directive name as it was configured.
    pub directive: String,
    pub reason: ValidationFailure,
}

impl ValidationError {
    pub(crate) fn new(directive: &str, reason: ValidationFailure) -> Self {
        Self {
            directive: directive.to_string(),
            reason,
        }
    }
}

/// Why a directive was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationFailure {
    /// Name is not a known security header and custom headers are disabled.
    #[error("unknown directive (custom headers are disabled)")]
    UnknownDirective,

    /// Name is not a legal HTTP header name.
    #[error("not a valid header name")]
    InvalidName,

    /// Name controls message framing or the connection and cannot be policy.
    #[error("reserved header; it describes the message, not its security policy")]
    ReservedHeader,

    /// Value is malformed for the directive's grammar.
    #[error("syntax error: {0}")]
    Syntax(String),

    /// Value is well-formed but not one of the accepted values.
    #[error("invalid value: {0}")]
    InvalidValue(String),
}

/// Headers were applied to a response that is no longer writable.
///
/// This is an integration bug, not a runtime condition: the middleware that
/// hits it logs it at error level and fails the request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cannot apply header policy during {phase}: {} header(s) left unwritten", pending.len())]
pub struct LifecycleViolation {
    pub phase: ResponsePhase,
    /// Names of the directives that could not be written.
    pub pending: Vec<String>,
}
