//! Axum middleware.

pub mod policy;
