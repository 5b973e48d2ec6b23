//! Configuration loading and policy compilation.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::{RouteConfig, ServiceConfig};
use crate::config::validation::{validate_config, ConfigIssue};
use crate::policy::{
    DirectiveValidator, HeaderMode, PolicySnapshot, PolicyStore, RouteOverride, ValidationError,
};
use crate::routing::{PolicyRoute, RouteTable};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join_issues(.0))]
    Invalid(Vec<ConfigIssue>),

    #[error("Global header policy rejected: {0}")]
    Policy(#[source] ValidationError),

    #[error("Incomplete config: {0}")]
    Incomplete(&'static str),

    #[error("Route `{route}` rejected: {source}")]
    Route {
        route: String,
        #[source]
        source: ValidationError,
    },
}

fn join_issues(issues: &[ConfigIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Parse and validate configuration from TOML text.
pub fn parse_config(content: &str) -> Result<ServiceConfig, ConfigError> {
    let config: ServiceConfig = toml::from_str(content)?;
    validate_config(&config).map_err(ConfigError::Invalid)?;
    Ok(config)
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ServiceConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    parse_config(&content)
}

/// Validate every directive in `config` and freeze the result.
///
/// All-or-nothing: the first rejected directive fails the whole compile.
pub fn compile(config: &ServiceConfig) -> Result<PolicySnapshot, ConfigError> {
    let mode = if config.headers.custom_headers {
        HeaderMode::Custom
    } else {
        HeaderMode::Strict
    };
    let validator = DirectiveValidator::new(mode);

    let store = PolicyStore::build(&config.headers.defaults, &validator).map_err(ConfigError::Policy)?;

    let routes = config
        .routes
        .iter()
        .map(|route| {
            compile_route(route, &validator).map_err(|source| ConfigError::Route {
                route: route.name.clone(),
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(PolicySnapshot::new(store, RouteTable::new(routes)))
}

fn compile_route(route: &RouteConfig, validator: &DirectiveValidator) -> Result<PolicyRoute, ValidationError> {
    let mut overrides = RouteOverride::builder(validator);
    for (name, value) in &route.set {
        overrides = overrides.set(name, value)?;
    }
    for name in &route.remove {
        overrides = overrides.remove(name)?;
    }
    for name in &route.protect {
        overrides = overrides.protect(name)?;
    }

    Ok(PolicyRoute::new(
        route.name.clone(),
        route.host.clone(),
        route.path_prefix.clone(),
        route.priority,
        overrides.build(),
    ))
}

/// Load, validate and compile a configuration file.
pub fn load_snapshot(path: &Path) -> Result<(ServiceConfig, PolicySnapshot), ConfigError> {
    let config = load_config(path)?;
    let snapshot = compile(&config)?;
    Ok((config, snapshot))
}

/// Load a file that is about to replace the active policy.
///
/// Stricter than [`load_snapshot`]: the file must declare a `[headers]`
/// table. An empty or partly written file would otherwise deserialize to the
/// built-in defaults and silently drop every configured route.
pub fn load_reload_snapshot(path: &Path) -> Result<(ServiceConfig, PolicySnapshot), ConfigError> {
    let content = fs::read_to_string(path)?;
    let table: toml::Table = content.parse()?;
    if !table.contains_key("headers") {
        return Err(ConfigError::Incomplete("no [headers] table"));
    }

    let config = parse_config(&content)?;
    let snapshot = compile(&config)?;
    Ok((config, snapshot))
}
