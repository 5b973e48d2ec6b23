//! Routing subsystem.
//!
//! Routes here exist only to scope header overrides; request dispatch to
//! handlers is the web framework's job.
//!
//! # Data Flow
//! ```text
//! Incoming Request (host, path)
//!     → router.rs (route lookup)
//!     → matcher.rs (evaluate match conditions)
//!     → Return: matched PolicyRoute or no match (global policy only)
//!
//! Route Compilation (at startup / reload):
//!     RouteConfig[]
//!     → validate overrides
//!     → Sort by priority
//!     → Freeze as immutable RouteTable
//! ```
//!
//! # Design Decisions
//! - Routes compiled at config load, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: same input always matches same route
//! - First match wins (ordered by priority)

pub mod matcher;
pub mod router;

pub use matcher::RequestTarget;
pub use router::{PolicyRoute, RouteTable};
