//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → loader::compile (directive validation → PolicySnapshot)
//!     → HeaderPolicyEngine (shared via Arc by all requests)
//!
//! On reload (file change or SIGHUP):
//!     watcher.rs detects change
//!     → loader.rs loads and compiles new snapshot
//!     → atomic swap of Arc<PolicySnapshot>
//!     → in-flight requests finish on the old snapshot
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; changes require full reload
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - A rejected reload leaves the active policy untouched

pub mod loader;
pub mod schema;
pub mod validation;
pub mod watcher;

pub use loader::{
    compile, load_config, load_reload_snapshot, load_snapshot, parse_config, ConfigError,
};
pub use schema::{
    AdminConfig, HeadersConfig, ListenerConfig, ObservabilityConfig, RouteConfig, ServiceConfig,
    TimeoutConfig,
};
pub use validation::ConfigIssue;
pub use watcher::ConfigWatcher;
