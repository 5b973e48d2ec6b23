//! Header policy subsystem.
//!
//! # Data Flow
//! ```text
//! Configuration (startup / reload):
//!     (name, value) pairs
//!     → validator.rs (name allowed? value well-formed?)
//!     → store.rs (global PolicyStore, all-or-nothing)
//!     → overrides.rs (per-route Set / Remove / protect)
//!     → engine.rs (PolicySnapshot, swapped atomically)
//!
//! Per request:
//!     engine.rs (load snapshot, find route)
//!     → merger.rs (store + route override → EffectivePolicy)
//!     → applier.rs (write headers while response is headers-open)
//! ```
//!
//! # Design Decisions
//! - Validation happens only at configuration boundaries; a request can
//!   never fail because of its own content
//! - Everything shared between requests is immutable
//! - Last write wins, except for names a route protects

pub mod applier;
pub mod directive;
pub mod engine;
pub mod error;
pub mod merger;
pub mod overrides;
pub mod store;
pub mod validator;

pub use applier::{apply, mark_phase, ProtectedHeaders, ResponsePhase};
pub use directive::{Directive, DirectiveName, KnownHeader};
pub use engine::{HeaderPolicyEngine, PolicySnapshot};
pub use error::{LifecycleViolation, ValidationError, ValidationFailure};
pub use merger::{merge, EffectivePolicy};
pub use overrides::{OverrideAction, RouteOverride, RouteOverrideBuilder};
pub use store::PolicyStore;
pub use validator::{DirectiveValidator, HeaderMode};
