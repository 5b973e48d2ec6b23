//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, layers)
//!     → request.rs (assign request ID)
//!     → middleware/policy.rs (resolve route, run handler, apply headers)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod server;

pub use middleware::policy::header_policy_middleware;
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
