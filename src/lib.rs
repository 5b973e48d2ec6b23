//! Security header policy middleware.
//!
//! Applies a validated, per-route configurable set of HTTP security headers
//! (CSP, HSTS, X-Frame-Options, …) to every response, with atomic hot reload.

pub mod admin;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod policy;
pub mod routing;

pub use config::schema::ServiceConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use policy::{HeaderPolicyEngine, PolicySnapshot};
