//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate addresses and value ranges
//! - Detect conflicting routes and contradictory overrides
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ConfigIssue>>
//! - Header grammar is not checked here; compiling the policy does that

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{ServiceConfig, PLACEHOLDER_API_KEY};

/// A semantic problem in an otherwise well-formed configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigIssue {
    #[error("{field}: `{value}` is not a socket address")]
    InvalidAddress { field: &'static str, value: String },

    #[error("timeouts.request_secs must be greater than zero")]
    ZeroTimeout,

    #[error("admin.api_key must be set when the admin API is enabled")]
    MissingAdminKey,

    #[error("route #{index} has an empty name")]
    UnnamedRoute { index: usize },

    #[error("route `{0}` is defined more than once")]
    DuplicateRoute(String),

    #[error("route `{route}`: path_prefix `{prefix}` must start with '/'")]
    RelativePathPrefix { route: String, prefix: String },

    #[error("route `{route}`: `{header}` is both set and removed")]
    SetAndRemoved { route: String, header: String },
}

/// Check everything about `config` that deserialization cannot.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ConfigIssue>> {
    let mut issues = Vec::new();

    check_address(&mut issues, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut issues,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }
    if config.admin.enabled {
        check_address(&mut issues, "admin.bind_address", &config.admin.bind_address);
        if config.admin.api_key.is_empty() || config.admin.api_key == PLACEHOLDER_API_KEY {
            issues.push(ConfigIssue::MissingAdminKey);
        }
    }
    if config.timeouts.request_secs == 0 {
        issues.push(ConfigIssue::ZeroTimeout);
    }

    let mut names = HashSet::new();
    for (index, route) in config.routes.iter().enumerate() {
        if route.name.trim().is_empty() {
            issues.push(ConfigIssue::UnnamedRoute { index });
        } else if !names.insert(route.name.as_str()) {
            issues.push(ConfigIssue::DuplicateRoute(route.name.clone()));
        }

        if let Some(prefix) = &route.path_prefix {
            if !prefix.starts_with('/') {
                issues.push(ConfigIssue::RelativePathPrefix {
                    route: route.name.clone(),
                    prefix: prefix.clone(),
                });
            }
        }

        for removed in &route.remove {
            if route.set.keys().any(|set| set.eq_ignore_ascii_case(removed)) {
                issues.push(ConfigIssue::SetAndRemoved {
                    route: route.name.clone(),
                    header: removed.clone(),
                });
            }
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        Err(issues)
    }
}

fn check_address(issues: &mut Vec<ConfigIssue>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        issues.push(ConfigIssue::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
