//! Startup orchestration.
//!
//! # Responsibilities
//! - Load and validate configuration
//! - Compile the initial header policy
//!
//! # Design Decisions
//! - Fail fast: an invalid policy at startup is fatal
//! - Without a config file the built-in defaults are used

use std::path::Path;

use crate::config::{compile, load_snapshot, ConfigError, ServiceConfig};
use crate::policy::PolicySnapshot;

/// Load `path` (or the defaults) and compile the initial policy.
pub fn bootstrap(path: Option<&Path>) -> Result<(ServiceConfig, PolicySnapshot), ConfigError> {
    match path {
        Some(path) => load_snapshot(path),
        None => {
            let config = ServiceConfig::default();
            let snapshot = compile(&config)?;
            Ok((config, snapshot))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bootstrap_defaults() {
        let (config, snapshot) = bootstrap(None).unwrap();
        assert_eq!(snapshot.store().len(), config.headers.defaults.len());
    }

    #[test]
    fn test_bootstrap_missing_file() {
        let err = bootstrap(Some(Path::new("/nonexistent/header-policy.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
